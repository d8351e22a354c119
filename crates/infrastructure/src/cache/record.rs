use std::net::IpAddr;
use std::time::{Duration, SystemTime};

/// One cached hostname entry.
///
/// `valid = false` marks a record as stale-but-servable pending refresh: the
/// lookup that flips the flag still returns the addresses, the next lookup
/// treats the record as a miss.
#[derive(Debug, Clone)]
pub struct CacheRecord {
    pub addresses: Vec<IpAddr>,
    pub expire_at: SystemTime,
    pub valid: bool,
}

impl CacheRecord {
    pub fn new(addresses: Vec<IpAddr>, ttl: Duration) -> Self {
        Self {
            addresses,
            expire_at: SystemTime::now() + ttl,
            valid: true,
        }
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        now >= self.expire_at
    }

    pub fn remaining(&self, now: SystemTime) -> Duration {
        self.expire_at
            .duration_since(now)
            .unwrap_or(Duration::ZERO)
    }
}
