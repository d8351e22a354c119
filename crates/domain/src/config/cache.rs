use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_ttl_seconds", alias = "ttl")]
    pub ttl_seconds: u64,

    #[serde(default = "default_max_size")]
    pub max_size: usize,

    #[serde(default)]
    pub persistent: bool,

    #[serde(default)]
    pub cache_file: String,
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: default_ttl_seconds(),
            max_size: default_max_size(),
            persistent: false,
            cache_file: String::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_ttl_seconds() -> u64 {
    300
}

fn default_max_size() -> usize {
    10_000
}
