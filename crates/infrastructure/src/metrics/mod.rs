mod exporter;
mod reporter;
mod sink;

pub use reporter::MetricsReporterJob;
pub use sink::{MetricsSink, MetricsStats};
