use std::net::IpAddr;
use std::time::SystemTime;

/// Which resolver path produced an address change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    Query,
    Refresh,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    A,
    Aaaa,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
        }
    }

    /// `AAAA` only when the set is IPv6-only; a mixed or IPv4 set reports `A`.
    pub fn from_addresses(addresses: &[IpAddr]) -> Self {
        if !addresses.is_empty() && addresses.iter().all(|a| a.is_ipv6()) {
            Self::Aaaa
        } else {
            Self::A
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Published when a hostname's resolved address set changes.
#[derive(Debug, Clone)]
pub struct AddressChangeEvent {
    pub hostname: String,
    pub old_addresses: Vec<IpAddr>,
    pub new_addresses: Vec<IpAddr>,
    pub timestamp: SystemTime,
    pub source: EventSource,
    pub ttl_seconds: u64,
    pub record_type: RecordType,
    pub authoritative: bool,
}

impl AddressChangeEvent {
    /// Multiset comparison: ordering differences are not a change.
    pub fn addresses_differ(old: &[IpAddr], new: &[IpAddr]) -> bool {
        if old.len() != new.len() {
            return true;
        }
        let mut old_sorted = old.to_vec();
        let mut new_sorted = new.to_vec();
        old_sorted.sort();
        new_sorted.sort();
        old_sorted != new_sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reordered_sets_are_not_a_change() {
        let a: Vec<IpAddr> = vec!["1.2.3.4".parse().unwrap(), "5.6.7.8".parse().unwrap()];
        let b: Vec<IpAddr> = vec!["5.6.7.8".parse().unwrap(), "1.2.3.4".parse().unwrap()];
        assert!(!AddressChangeEvent::addresses_differ(&a, &b));
    }

    #[test]
    fn duplicate_counts_matter() {
        let a: Vec<IpAddr> = vec!["1.2.3.4".parse().unwrap(), "1.2.3.4".parse().unwrap()];
        let b: Vec<IpAddr> = vec!["1.2.3.4".parse().unwrap()];
        assert!(AddressChangeEvent::addresses_differ(&a, &b));
    }

    #[test]
    fn record_type_from_family_mix() {
        let v4: Vec<IpAddr> = vec!["1.2.3.4".parse().unwrap()];
        let v6: Vec<IpAddr> = vec!["2001:db8::1".parse().unwrap()];
        let mixed: Vec<IpAddr> = vec!["1.2.3.4".parse().unwrap(), "2001:db8::1".parse().unwrap()];
        assert_eq!(RecordType::from_addresses(&v4), RecordType::A);
        assert_eq!(RecordType::from_addresses(&v6), RecordType::Aaaa);
        assert_eq!(RecordType::from_addresses(&mixed), RecordType::A);
    }
}
