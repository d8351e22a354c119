use super::HostCache;
use celeris_dns_domain::ResolveError;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

const SNAPSHOT_VERSION: &str = "1.0";
const MAX_SNAPSHOT_AGE: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Serialize, Deserialize)]
struct CacheSnapshot {
    version: String,
    /// Milliseconds since the Unix epoch at save time.
    timestamp: u64,
    records: Vec<PersistedRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedRecord {
    hostname: String,
    ip_addresses: Vec<String>,
    /// Seconds since the Unix epoch.
    expire_time: u64,
    is_valid: bool,
}

/// Snapshot/restore of a [`HostCache`] to a versioned JSON file.
///
/// Restoring goes through `HostCache::update`, so every restored record gets
/// a fresh TTL.
pub struct CachePersistor;

impl CachePersistor {
    pub fn save(cache: &HostCache, path: &str) -> Result<(), ResolveError> {
        let mut records = Vec::new();
        cache.for_each(|hostname, record| {
            if !record.valid {
                return;
            }
            records.push(PersistedRecord {
                hostname: hostname.to_string(),
                ip_addresses: record.addresses.iter().map(|a| a.to_string()).collect(),
                expire_time: system_time_secs(record.expire_at),
                is_valid: true,
            });
        });

        let snapshot = CacheSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            timestamp: now_millis(),
            records,
        };

        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| ResolveError::Persistence(e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| ResolveError::Persistence(format!("{}: {}", path, e)))?;

        debug!(path = %path, records = snapshot.records.len(), "Cache snapshot written");
        Ok(())
    }

    pub fn load(cache: &HostCache, path: &str) -> Result<usize, ResolveError> {
        let snapshot = Self::read_snapshot(path)?;

        let now_secs = system_time_secs(SystemTime::now());
        let mut restored = 0;
        for record in snapshot.records {
            if !record.is_valid || record.expire_time <= now_secs {
                continue;
            }

            let addresses: Vec<IpAddr> = record
                .ip_addresses
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();
            if addresses.len() != record.ip_addresses.len() {
                warn!(hostname = %record.hostname, "Skipping record with unparsable addresses");
                continue;
            }
            if addresses.is_empty() {
                continue;
            }

            cache.update(&record.hostname, addresses);
            restored += 1;
        }

        debug!(path = %path, restored, "Cache snapshot restored");
        Ok(restored)
    }

    /// Structural check: version, timestamp, records shape, and the 24 h
    /// age rule.
    pub fn is_valid_cache(path: &str) -> bool {
        Self::read_snapshot(path).is_ok()
    }

    fn read_snapshot(path: &str) -> Result<CacheSnapshot, ResolveError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ResolveError::Persistence(format!("{}: {}", path, e)))?;
        let snapshot: CacheSnapshot = serde_json::from_str(&contents)
            .map_err(|e| ResolveError::Persistence(format!("invalid snapshot: {}", e)))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(ResolveError::Persistence(format!(
                "unsupported snapshot version: {}",
                snapshot.version
            )));
        }

        let age = now_millis().saturating_sub(snapshot.timestamp);
        if age > MAX_SNAPSHOT_AGE.as_millis() as u64 {
            return Err(ResolveError::Persistence(
                "snapshot is older than 24h".to_string(),
            ));
        }

        Ok(snapshot)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn system_time_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
