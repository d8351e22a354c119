use serde::{Deserialize, Serialize};

use super::cache::CacheSettings;
use super::errors::ConfigError;
use super::metrics::MetricsSettings;
use super::retry::RetryPolicy;
use super::server::UpstreamServer;
use super::validator::ConfigValidator;

/// Validated resolver configuration snapshot.
///
/// Built by [`super::ResolverConfigBuilder`] or loaded from a YAML file;
/// treated as read-only by the resolver once applied.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResolverConfig {
    #[serde(default = "default_servers")]
    pub servers: Vec<UpstreamServer>,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub retry: RetryPolicy,

    #[serde(default)]
    pub metrics: MetricsSettings,

    #[serde(default)]
    pub global: GlobalSettings,

    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GlobalSettings {
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    #[serde(default = "default_max_concurrent_queries")]
    pub max_concurrent_queries: usize,

    #[serde(default = "default_true")]
    pub ipv6_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Metadata {
    #[serde(default = "default_metadata_version")]
    pub version: String,
}

impl ResolverConfig {
    /// Load from a YAML file. Missing sections adopt defaults, unknown keys
    /// are ignored. The result is validated before it is returned.
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        let config: Self =
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, yaml)
            .map_err(|e| ConfigError::FileWrite(path.to_string(), e.to_string()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigValidator::validate(self)
    }

    pub fn enabled_servers(&self) -> Vec<&UpstreamServer> {
        self.servers.iter().filter(|s| s.enabled).collect()
    }

    pub fn query_timeout_ms(&self) -> u64 {
        self.global.query_timeout_ms
    }

    pub fn max_concurrent_queries(&self) -> usize {
        self.global.max_concurrent_queries
    }

    pub fn ipv6_enabled(&self) -> bool {
        self.global.ipv6_enabled
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            servers: default_servers(),
            cache: CacheSettings::default(),
            retry: RetryPolicy::default(),
            metrics: MetricsSettings::default(),
            global: GlobalSettings::default(),
            metadata: Metadata::default(),
        }
    }
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            query_timeout_ms: default_query_timeout_ms(),
            max_concurrent_queries: default_max_concurrent_queries(),
            ipv6_enabled: true,
        }
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            version: default_metadata_version(),
        }
    }
}

fn default_servers() -> Vec<UpstreamServer> {
    vec![
        UpstreamServer::new("8.8.8.8"),
        UpstreamServer::new("1.1.1.1"),
    ]
}

fn default_query_timeout_ms() -> u64 {
    5000
}

fn default_max_concurrent_queries() -> usize {
    100
}

fn default_true() -> bool {
    true
}

fn default_metadata_version() -> String {
    "1.0".to_string()
}
