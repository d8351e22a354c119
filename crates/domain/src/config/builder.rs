use super::cache::CacheSettings;
use super::errors::ConfigError;
use super::metrics::MetricsSettings;
use super::retry::RetryPolicy;
use super::root::ResolverConfig;
use super::server::UpstreamServer;

/// Fluent builder for [`ResolverConfig`]; `build` validates every field
/// before handing out the snapshot.
#[derive(Debug, Default)]
pub struct ResolverConfigBuilder {
    config: ResolverConfig,
}

impl ResolverConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ResolverConfig::default(),
        }
    }

    pub fn add_server(mut self, server: UpstreamServer) -> Self {
        self.config.servers.push(server);
        self
    }

    pub fn clear_servers(mut self) -> Self {
        self.config.servers.clear();
        self
    }

    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.config.cache.enabled = enabled;
        self
    }

    pub fn cache_ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.config.cache.ttl_seconds = ttl_seconds;
        self
    }

    pub fn cache_max_size(mut self, max_size: usize) -> Self {
        self.config.cache.max_size = max_size;
        self
    }

    pub fn cache_persistent(mut self, persistent: bool) -> Self {
        self.config.cache.persistent = persistent;
        self
    }

    pub fn cache_file(mut self, path: impl Into<String>) -> Self {
        self.config.cache.cache_file = path.into();
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn retry_max_attempts(mut self, attempts: u32) -> Self {
        self.config.retry.max_attempts = attempts;
        self
    }

    pub fn retry_base_delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.retry.base_delay_ms = delay_ms;
        self
    }

    pub fn retry_max_delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.retry.max_delay_ms = delay_ms;
        self
    }

    pub fn metrics_enabled(mut self, enabled: bool) -> Self {
        self.config.metrics.enabled = enabled;
        self
    }

    pub fn metrics_file(mut self, path: impl Into<String>) -> Self {
        self.config.metrics.metrics_file = path.into();
        self
    }

    pub fn report_interval_secs(mut self, secs: u64) -> Self {
        self.config.metrics.report_interval_secs = secs;
        self
    }

    pub fn exporter_address(mut self, address: impl Into<String>) -> Self {
        self.config.metrics.exporter_address = address.into();
        self
    }

    pub fn query_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.global.query_timeout_ms = timeout_ms;
        self
    }

    pub fn max_concurrent_queries(mut self, max: usize) -> Self {
        self.config.global.max_concurrent_queries = max;
        self
    }

    pub fn ipv6_enabled(mut self, enabled: bool) -> Self {
        self.config.global.ipv6_enabled = enabled;
        self
    }

    pub fn build(self) -> Result<ResolverConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }

    /// Overrides for presets loaded elsewhere.
    pub fn from_config(config: ResolverConfig) -> Self {
        Self { config }
    }
}

impl From<ResolverConfig> for ResolverConfigBuilder {
    fn from(config: ResolverConfig) -> Self {
        Self::from_config(config)
    }
}

#[derive(Debug, Default)]
pub struct UpstreamServerBuilder {
    address: String,
    port: Option<u16>,
    weight: Option<u32>,
    timeout_ms: Option<u64>,
    enabled: Option<bool>,
}

impl UpstreamServerBuilder {
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn weight(mut self, weight: u32) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn build(self) -> UpstreamServer {
        let mut server = UpstreamServer::new(self.address);
        if let Some(port) = self.port {
            server.port = port;
        }
        if let Some(weight) = self.weight {
            server.weight = weight;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            server.timeout_ms = timeout_ms;
        }
        if let Some(enabled) = self.enabled {
            server.enabled = enabled;
        }
        server
    }
}
