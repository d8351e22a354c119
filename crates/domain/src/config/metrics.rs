use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MetricsSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// JSON stats snapshot destination; empty disables the reporter job.
    #[serde(default, alias = "file")]
    pub metrics_file: String,

    #[serde(default = "default_report_interval_secs")]
    pub report_interval_secs: u64,

    /// `host:port` the Prometheus text endpoint binds to; empty disables it.
    #[serde(default = "default_exporter_address", alias = "prometheus_address")]
    pub exporter_address: String,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            metrics_file: String::new(),
            report_interval_secs: default_report_interval_secs(),
            exporter_address: default_exporter_address(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_report_interval_secs() -> u64 {
    60
}

fn default_exporter_address() -> String {
    "0.0.0.0:9091".to_string()
}
