pub mod cache;
pub mod config_versions;
pub mod events;
pub mod metrics;
pub mod provider;
pub mod resolver;

pub use cache::{CacheLookup, CachePersistor, CacheRecord, HostCache};
pub use config_versions::{ConfigVersion, ConfigVersionStore};
pub use events::EventBus;
pub use metrics::{MetricsReporterJob, MetricsSink, MetricsStats};
pub use provider::UdpAddressProvider;
pub use resolver::Resolver;
