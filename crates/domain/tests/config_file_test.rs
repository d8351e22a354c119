use celeris_dns_domain::config::ResolverConfig;
use std::io::Write;

fn write_config(contents: &str) -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resolver.yaml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    (dir, path.to_str().unwrap().to_string())
}

#[test]
fn loads_full_yaml_document() {
    let (_dir, path) = write_config(
        r#"
servers:
  - address: "9.9.9.9"
    port: 53
    weight: 10
    timeout_ms: 1500
    enabled: true
  - address: "149.112.112.112"
    enabled: false
cache:
  enabled: true
  ttl_seconds: 120
  max_size: 2000
  persistent: false
  cache_file: ""
retry:
  max_attempts: 4
  base_delay_ms: 50
  max_delay_ms: 2000
metrics:
  enabled: true
  metrics_file: ""
  report_interval_secs: 30
  exporter_address: "127.0.0.1:9105"
global:
  query_timeout_ms: 3000
  max_concurrent_queries: 16
  ipv6_enabled: false
metadata:
  version: "1.0"
"#,
    );

    let config = ResolverConfig::load_from_file(&path).expect("load should succeed");
    assert_eq!(config.servers.len(), 2);
    assert_eq!(config.servers[0].weight, 10);
    assert_eq!(config.enabled_servers().len(), 1);
    assert_eq!(config.cache.ttl_seconds, 120);
    assert_eq!(config.retry.max_attempts, 4);
    assert_eq!(config.metrics.exporter_address, "127.0.0.1:9105");
    assert_eq!(config.query_timeout_ms(), 3000);
    assert_eq!(config.max_concurrent_queries(), 16);
    assert!(!config.ipv6_enabled());
}

#[test]
fn missing_sections_adopt_defaults() {
    let (_dir, path) = write_config(
        r#"
servers:
  - address: "8.8.4.4"
"#,
    );

    let config = ResolverConfig::load_from_file(&path).unwrap();
    assert_eq!(config.servers[0].port, 53);
    assert_eq!(config.servers[0].timeout_ms, 2000);
    assert!(config.servers[0].enabled);
    assert_eq!(config.cache.ttl_seconds, 300);
    assert_eq!(config.retry.base_delay_ms, 100);
    assert_eq!(config.metrics.report_interval_secs, 60);
    assert_eq!(config.global.query_timeout_ms, 5000);
}

#[test]
fn invalid_document_is_rejected_at_load() {
    let (_dir, path) = write_config(
        r#"
servers:
  - address: "8.8.8.8"
  - address: "8.8.8.8"
"#,
    );
    assert!(ResolverConfig::load_from_file(&path).is_err());
}

#[test]
fn missing_file_errors() {
    assert!(ResolverConfig::load_from_file("/nonexistent/resolver.yaml").is_err());
}

#[test]
fn save_and_reload_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.yaml");
    let path = path.to_str().unwrap();

    let config = ResolverConfig::default();
    config.save_to_file(path).unwrap();

    let reloaded = ResolverConfig::load_from_file(path).unwrap();
    assert_eq!(reloaded, config);
    assert_eq!(reloaded.metadata.version, "1.0");
}
