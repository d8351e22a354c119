use celeris_dns_infrastructure::{CacheLookup, CacheRecord, HostCache};
use std::net::IpAddr;
use std::time::{Duration, SystemTime};

fn addrs(specs: &[&str]) -> Vec<IpAddr> {
    specs.iter().map(|s| s.parse().unwrap()).collect()
}

#[test]
fn update_then_get_within_ttl() {
    let cache = HostCache::new(Duration::from_secs(300));
    cache.update("example.com", addrs(&["93.184.216.34"]));

    let result = cache.get("example.com");
    assert_eq!(result, Some(addrs(&["93.184.216.34"])));
    assert_eq!(cache.hits(), 1);
    assert_eq!(cache.misses(), 0);
    assert_eq!(cache.size(), 1);
}

#[test]
fn hostnames_are_case_insensitive() {
    let cache = HostCache::new(Duration::from_secs(300));
    cache.update("Example.COM", addrs(&["1.2.3.4"]));
    assert!(cache.get("example.com").is_some());
    assert!(cache.get("EXAMPLE.com").is_some());
}

#[test]
fn missing_hostname_counts_a_miss() {
    let cache = HostCache::new(Duration::from_secs(300));
    assert!(cache.get("absent.example").is_none());
    assert_eq!(cache.misses(), 1);
    assert_eq!(cache.hit_rate(), 0.0);
}

#[test]
fn hit_rate_is_a_ratio() {
    let cache = HostCache::new(Duration::from_secs(300));
    cache.update("a.example", addrs(&["1.1.1.1"]));
    cache.get("a.example");
    cache.get("a.example");
    cache.get("absent.example");
    let rate = cache.hit_rate();
    assert!((rate - 2.0 / 3.0).abs() < f64::EPSILON, "rate={}", rate);
}

#[test]
fn expired_record_is_erased_and_counts_a_miss() {
    let cache = HostCache::new(Duration::from_secs(300));
    cache.insert_record(
        "stale.example",
        CacheRecord {
            addresses: addrs(&["1.2.3.4"]),
            expire_at: SystemTime::now() - Duration::from_secs(1),
            valid: true,
        },
    );

    assert!(cache.get("stale.example").is_none());
    assert_eq!(cache.misses(), 1);
    assert_eq!(cache.size(), 0);
}

#[test]
fn near_expiry_hit_marks_record_for_refresh() {
    // TTL 100s, 15s remaining: below the 20% threshold.
    let cache = HostCache::new(Duration::from_secs(100));
    cache.insert_record(
        "soon.example",
        CacheRecord {
            addresses: addrs(&["10.0.0.1"]),
            expire_at: SystemTime::now() + Duration::from_secs(15),
            valid: true,
        },
    );

    // First lookup is still a hit.
    assert_eq!(cache.get("soon.example"), Some(addrs(&["10.0.0.1"])));
    assert_eq!(cache.hits(), 1);

    // The record was invalidated, so the next lookup misses and erases it,
    // handing back the stale addresses for change detection.
    match cache.lookup("soon.example") {
        CacheLookup::Miss { previous } => {
            assert_eq!(previous, Some(addrs(&["10.0.0.1"])));
        }
        CacheLookup::Hit(_) => panic!("invalidated record must not hit"),
    }
    assert_eq!(cache.misses(), 1);
    assert_eq!(cache.size(), 0);
}

#[test]
fn comfortable_remaining_ttl_is_not_marked() {
    let cache = HostCache::new(Duration::from_secs(100));
    cache.update("fresh.example", addrs(&["10.0.0.2"]));

    assert!(cache.get("fresh.example").is_some());
    assert!(cache.get("fresh.example").is_some());
    assert_eq!(cache.hits(), 2);
    assert_eq!(cache.misses(), 0);
}

#[test]
fn capacity_evicts_earliest_expiry_record() {
    let cache = HostCache::with_capacity(Duration::from_secs(300), 3);
    cache.update("first.example", addrs(&["1.0.0.1"]));
    std::thread::sleep(Duration::from_millis(5));
    cache.update("second.example", addrs(&["1.0.0.2"]));
    std::thread::sleep(Duration::from_millis(5));
    cache.update("third.example", addrs(&["1.0.0.3"]));
    std::thread::sleep(Duration::from_millis(5));
    cache.update("fourth.example", addrs(&["1.0.0.4"]));

    assert_eq!(cache.size(), 3);
    assert!(cache.get("first.example").is_none());
    assert!(cache.get("second.example").is_some());
    assert!(cache.get("fourth.example").is_some());
}

#[test]
fn updating_existing_hostname_does_not_evict_at_capacity() {
    let cache = HostCache::with_capacity(Duration::from_secs(300), 3);
    cache.update("a.example", addrs(&["1.0.0.1"]));
    cache.update("b.example", addrs(&["1.0.0.2"]));
    cache.update("c.example", addrs(&["1.0.0.3"]));
    cache.update("b.example", addrs(&["2.0.0.2"]));

    assert_eq!(cache.size(), 3);
    assert_eq!(cache.get("b.example"), Some(addrs(&["2.0.0.2"])));
    assert!(cache.get("a.example").is_some());
    assert!(cache.get("c.example").is_some());
}

#[test]
fn cleanup_removes_expired_and_invalidated_records() {
    let cache = HostCache::new(Duration::from_secs(300));
    cache.update("live.example", addrs(&["1.1.1.1"]));
    cache.insert_record(
        "expired.example",
        CacheRecord {
            addresses: addrs(&["2.2.2.2"]),
            expire_at: SystemTime::now() - Duration::from_secs(5),
            valid: true,
        },
    );
    cache.insert_record(
        "invalidated.example",
        CacheRecord {
            addresses: addrs(&["3.3.3.3"]),
            expire_at: SystemTime::now() + Duration::from_secs(100),
            valid: false,
        },
    );

    cache.cleanup();

    // Post-cleanup invariant: every remaining record is valid and unexpired.
    let now = SystemTime::now();
    let mut seen = 0;
    cache.for_each(|_, record| {
        seen += 1;
        assert!(record.valid);
        assert!(record.expire_at > now);
    });
    assert_eq!(seen, 1);
}

#[test]
fn high_water_cleanup_trims_oldest_fifth() {
    let cache = HostCache::with_capacity(Duration::from_secs(300), 10);
    for i in 0..10 {
        cache.update(&format!("host{}.example", i), addrs(&["1.1.1.1"]));
        std::thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(cache.size(), 10);

    // 10 valid entries > 90% of capacity: the oldest 20% go.
    cache.cleanup();
    assert_eq!(cache.size(), 8);
    assert!(cache.get("host0.example").is_none());
    assert!(cache.get("host1.example").is_none());
    assert!(cache.get("host9.example").is_some());
}

#[test]
fn clear_resets_statistics() {
    let cache = HostCache::new(Duration::from_secs(300));
    cache.update("a.example", addrs(&["1.1.1.1"]));
    cache.get("a.example");
    cache.get("missing.example");

    cache.clear();
    assert_eq!(cache.size(), 0);
    assert_eq!(cache.hits(), 0);
    assert_eq!(cache.misses(), 0);
    assert_eq!(cache.hit_rate(), 0.0);
}

#[test]
fn remove_drops_a_single_hostname() {
    let cache = HostCache::new(Duration::from_secs(300));
    cache.update("a.example", addrs(&["1.1.1.1"]));
    cache.update("b.example", addrs(&["2.2.2.2"]));
    cache.remove("a.example");

    assert!(cache.get("a.example").is_none());
    assert!(cache.get("b.example").is_some());
}

#[test]
fn capacity_reports_configured_max() {
    let cache = HostCache::with_capacity(Duration::from_secs(60), 42);
    assert_eq!(cache.capacity(), 42);
    assert_eq!(cache.ttl(), Duration::from_secs(60));
}
