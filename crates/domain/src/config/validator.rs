use std::collections::HashSet;
use std::net::IpAddr;
use std::path::Path;

use super::cache::CacheSettings;
use super::errors::ConfigError;
use super::metrics::MetricsSettings;
use super::retry::RetryPolicy;
use super::root::ResolverConfig;
use super::server::UpstreamServer;

const INVALID_PATH_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];
const MAX_PATH_LEN: usize = 4096;

/// Enforces every range rule before a [`ResolverConfig`] is considered
/// constructed. Rejects on the first offending field.
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &ResolverConfig) -> Result<(), ConfigError> {
        Self::validate_servers(&config.servers)?;
        Self::validate_cache(&config.cache)?;
        Self::validate_retry(&config.retry)?;
        Self::validate_metrics(&config.metrics)?;

        if !(100..=30_000).contains(&config.global.query_timeout_ms) {
            return Err(ConfigError::validation(
                "query_timeout_ms",
                "query timeout must be between 100ms and 30000ms",
            ));
        }

        if !(1..=10_000).contains(&config.global.max_concurrent_queries) {
            return Err(ConfigError::validation(
                "max_concurrent_queries",
                "max concurrent queries must be between 1 and 10000",
            ));
        }

        let total_weight: u64 = config
            .servers
            .iter()
            .filter(|s| s.enabled)
            .map(|s| u64::from(s.weight))
            .sum();
        if total_weight == 0 {
            return Err(ConfigError::validation(
                "servers",
                "total weight of enabled servers must be positive",
            ));
        }

        let mut seen = HashSet::new();
        for server in &config.servers {
            if !seen.insert(server.address.as_str()) {
                return Err(ConfigError::validation(
                    "servers",
                    format!("duplicate server address: {}", server.address),
                ));
            }
        }

        Ok(())
    }

    fn validate_servers(servers: &[UpstreamServer]) -> Result<(), ConfigError> {
        if servers.is_empty() {
            return Err(ConfigError::validation(
                "servers",
                "at least one DNS server must be configured",
            ));
        }

        let mut has_enabled = false;
        for server in servers {
            if server.address.parse::<IpAddr>().is_err() {
                return Err(ConfigError::validation(
                    "servers.address",
                    format!("invalid server IP address: {}", server.address),
                ));
            }

            if server.port == 0 {
                return Err(ConfigError::validation(
                    "servers.port",
                    format!("invalid port for server {}: {}", server.address, server.port),
                ));
            }

            if !(100..=10_000).contains(&server.timeout_ms) {
                return Err(ConfigError::validation(
                    "servers.timeout_ms",
                    format!(
                        "invalid timeout for server {}: {}ms",
                        server.address, server.timeout_ms
                    ),
                ));
            }

            if !(1..=100).contains(&server.weight) {
                return Err(ConfigError::validation(
                    "servers.weight",
                    format!(
                        "invalid weight for server {}: {}",
                        server.address, server.weight
                    ),
                ));
            }

            has_enabled |= server.enabled;
        }

        if !has_enabled {
            return Err(ConfigError::validation(
                "servers.enabled",
                "at least one server must be enabled",
            ));
        }

        Ok(())
    }

    fn validate_cache(cache: &CacheSettings) -> Result<(), ConfigError> {
        if !cache.enabled {
            return Ok(());
        }

        if !(1..=86_400).contains(&cache.ttl_seconds) {
            return Err(ConfigError::validation(
                "cache.ttl_seconds",
                "cache TTL must be between 1 and 86400 seconds",
            ));
        }

        if !(100..=1_000_000).contains(&cache.max_size) {
            return Err(ConfigError::validation(
                "cache.max_size",
                "cache max size must be between 100 and 1000000 entries",
            ));
        }

        if cache.persistent && !cache.cache_file.is_empty() {
            Self::validate_writable_path(&cache.cache_file, "cache.cache_file")?;
        }

        Ok(())
    }

    fn validate_retry(retry: &RetryPolicy) -> Result<(), ConfigError> {
        if !(1..=10).contains(&retry.max_attempts) {
            return Err(ConfigError::validation(
                "retry.max_attempts",
                "max retry attempts must be between 1 and 10",
            ));
        }

        if !(50..=1000).contains(&retry.base_delay_ms) {
            return Err(ConfigError::validation(
                "retry.base_delay_ms",
                "base retry delay must be between 50ms and 1000ms",
            ));
        }

        if retry.max_delay_ms < retry.base_delay_ms || retry.max_delay_ms > 10_000 {
            return Err(ConfigError::validation(
                "retry.max_delay_ms",
                "max retry delay must be between base delay and 10000ms",
            ));
        }

        // The clamped schedule must settle at or below max_delay_ms.
        let mut delay = retry.base_delay_ms;
        for _ in 1..retry.max_attempts {
            delay = delay.saturating_mul(2).min(retry.max_delay_ms);
        }
        if delay > retry.max_delay_ms {
            return Err(ConfigError::validation(
                "retry.max_delay_ms",
                "retry delay progression exceeds max delay",
            ));
        }

        Ok(())
    }

    fn validate_metrics(metrics: &MetricsSettings) -> Result<(), ConfigError> {
        if !metrics.enabled {
            return Ok(());
        }

        if !(1..=3600).contains(&metrics.report_interval_secs) {
            return Err(ConfigError::validation(
                "metrics.report_interval_secs",
                "metrics report interval must be between 1 and 3600 seconds",
            ));
        }

        if !metrics.metrics_file.is_empty() && !Self::is_valid_path(&metrics.metrics_file) {
            return Err(ConfigError::validation(
                "metrics.metrics_file",
                format!("invalid metrics file path: {}", metrics.metrics_file),
            ));
        }

        if !metrics.exporter_address.is_empty() {
            let (_, port) = metrics.exporter_address.rsplit_once(':').ok_or_else(|| {
                ConfigError::validation(
                    "metrics.exporter_address",
                    format!(
                        "invalid exporter address format: {}",
                        metrics.exporter_address
                    ),
                )
            })?;

            match port.parse::<u32>() {
                Ok(p) if (1..=65_535).contains(&p) => {}
                _ => {
                    return Err(ConfigError::validation(
                        "metrics.exporter_address",
                        format!("invalid exporter port: {}", port),
                    ));
                }
            }
        }

        Ok(())
    }

    fn is_valid_path(path: &str) -> bool {
        if path.is_empty() || path.len() > MAX_PATH_LEN {
            return false;
        }
        if path.contains(INVALID_PATH_CHARS) {
            return false;
        }
        if !path.starts_with('/') {
            return false;
        }
        Path::new(path).parent().is_some()
    }

    /// Persistent files need an existing (or creatable) writable parent
    /// directory; probed with an append-mode open of the target.
    fn validate_writable_path(path: &str, field: &'static str) -> Result<(), ConfigError> {
        if !Self::is_valid_path(path) {
            return Err(ConfigError::validation(
                field,
                format!("invalid file path: {}", path),
            ));
        }

        let parent = match Path::new(path).parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => {
                return Err(ConfigError::validation(
                    field,
                    format!("file path has no parent directory: {}", path),
                ));
            }
        };

        if !parent.exists() {
            std::fs::create_dir_all(&parent).map_err(|e| {
                ConfigError::validation(field, format!("cannot create directory: {}", e))
            })?;
        }

        if !parent.is_dir() {
            return Err(ConfigError::validation(
                field,
                format!("parent path is not a directory: {}", parent.display()),
            ));
        }

        std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map_err(|e| ConfigError::validation(field, format!("cannot write to file: {}", e)))?;

        Ok(())
    }
}
