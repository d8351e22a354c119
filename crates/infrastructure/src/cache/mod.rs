mod persistence;
mod record;

pub use persistence::CachePersistor;
pub use record::CacheRecord;

use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use tracing::debug;

const DEFAULT_MAX_SIZE: usize = 10_000;

/// Remaining-TTL fraction below which a served record is invalidated so the
/// next lookup triggers a refresh.
const REFRESH_FRACTION: f64 = 0.2;

/// High-water mark: when cleanup leaves the map above 90% of capacity, the
/// oldest-by-expiry 20% of entries are trimmed as well.
const HIGH_WATER_FRACTION: f64 = 0.9;
const HIGH_WATER_TRIM_FRACTION: f64 = 0.2;

/// Outcome of a tracked cache lookup.
///
/// A miss caused by an expired or invalidated record erases it but keeps the
/// erased addresses around as `previous`, so the resolver can detect address
/// changes across a refresh.
#[derive(Debug, Clone)]
pub enum CacheLookup {
    Hit(Vec<IpAddr>),
    Miss { previous: Option<Vec<IpAddr>> },
}

/// Hostname → address cache with TTL expiry, a hard size cap with
/// earliest-expiry eviction, and near-expiry refresh marking.
///
/// Eviction is deliberately TTL-biased (earliest `expire_at` goes first),
/// not recency-based.
pub struct HostCache {
    entries: Mutex<HashMap<String, CacheRecord>>,
    ttl: Duration,
    max_size: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl HostCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_MAX_SIZE)
    }

    pub fn with_capacity(ttl: Duration, max_size: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_size,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Insert or replace a record with a fresh TTL. Runs cleanup first; if
    /// the map is still at capacity afterwards, the record with the earliest
    /// expiry is evicted.
    pub fn update(&self, hostname: &str, addresses: Vec<IpAddr>) {
        let hostname = hostname.to_lowercase();
        let mut entries = self.entries.lock();
        Self::cleanup_locked(&mut entries, self.max_size);

        if entries.len() >= self.max_size && !entries.contains_key(&hostname) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, record)| record.expire_at)
                .map(|(host, _)| host.clone());
            if let Some(host) = oldest {
                debug!(hostname = %host, "Cache full, evicting earliest-expiry record");
                entries.remove(&host);
            }
        }

        entries.insert(hostname, CacheRecord::new(addresses, self.ttl));
    }

    /// Inserts a record as-is, keeping its expiry and validity. Bypasses
    /// cleanup and capacity checks.
    pub fn insert_record(&self, hostname: &str, record: CacheRecord) {
        self.entries.lock().insert(hostname.to_lowercase(), record);
    }

    /// Tracked lookup used by the resolver. Counts a hit or a miss, erases
    /// expired/invalidated records, and applies the near-expiry marking.
    pub fn lookup(&self, hostname: &str) -> CacheLookup {
        let hostname = hostname.to_lowercase();
        let now = SystemTime::now();
        let mut entries = self.entries.lock();

        let Some(record) = entries.get_mut(&hostname) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return CacheLookup::Miss { previous: None };
        };

        if record.is_expired(now) || !record.valid {
            let previous = entries.remove(&hostname).map(|r| r.addresses);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return CacheLookup::Miss { previous };
        }

        let addresses = record.addresses.clone();
        if record.remaining(now) < self.ttl.mul_f64(REFRESH_FRACTION) {
            record.valid = false;
            debug!(hostname = %hostname, "Record near expiry, marked for refresh");
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        CacheLookup::Hit(addresses)
    }

    /// Simple accessor; same accounting and marking as [`Self::lookup`].
    pub fn get(&self, hostname: &str) -> Option<Vec<IpAddr>> {
        match self.lookup(hostname) {
            CacheLookup::Hit(addresses) => Some(addresses),
            CacheLookup::Miss { .. } => None,
        }
    }

    pub fn remove(&self, hostname: &str) {
        self.entries.lock().remove(&hostname.to_lowercase());
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Visits every record under the lock. The callback must not re-enter
    /// the cache.
    pub fn for_each(&self, mut fn_: impl FnMut(&str, &CacheRecord)) {
        let entries = self.entries.lock();
        for (hostname, record) in entries.iter() {
            fn_(hostname, record);
        }
    }

    pub fn size(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let total = hits + self.misses.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        hits as f64 / total as f64
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Drops every expired or invalidated record, then applies the soft
    /// high-water trim.
    pub fn cleanup(&self) {
        let mut entries = self.entries.lock();
        Self::cleanup_locked(&mut entries, self.max_size);
    }

    fn cleanup_locked(entries: &mut HashMap<String, CacheRecord>, max_size: usize) {
        let now = SystemTime::now();
        entries.retain(|_, record| record.valid && !record.is_expired(now));

        let high_water = (max_size as f64 * HIGH_WATER_FRACTION) as usize;
        if entries.len() > high_water {
            let mut by_expiry: Vec<(String, SystemTime)> = entries
                .iter()
                .map(|(host, record)| (host.clone(), record.expire_at))
                .collect();
            by_expiry.sort_by_key(|(_, expire_at)| *expire_at);

            let to_remove = (entries.len() as f64 * HIGH_WATER_TRIM_FRACTION) as usize;
            for (host, _) in by_expiry.into_iter().take(to_remove) {
                entries.remove(&host);
            }
            debug!(removed = to_remove, "High-water cache trim");
        }
    }
}
