use celeris_dns_application::ports::AlertSink;
use celeris_dns_domain::{ConfigError, ResolveError};
use parking_lot::Mutex;
use prometheus::{Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, error};

const MAX_LATENCY_SAMPLES: usize = 1000;
const MAX_RETRY_HISTORY: usize = 100;

const DURATION_BUCKETS_MS: &[f64] = &[1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0];

#[derive(Debug, Clone, Copy)]
struct AlertThresholds {
    error_rate: f64,
    latency: Duration,
}

/// Read-only copy of all aggregates at one instant. Consistent per category,
/// not atomic across categories.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsStats {
    pub total_queries: u64,
    pub successful_queries: u64,
    pub failed_queries: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    pub avg_query_time_ms: f64,
    pub error_counts: HashMap<String, u64>,
    /// Arithmetic mean over the retained samples, per server.
    pub server_latencies: HashMap<String, f64>,
    pub total_retries: u64,
    pub retry_attempts: HashMap<String, Vec<u32>>,
}

#[derive(Serialize)]
struct ExportedStats<'a> {
    timestamp: u64,
    #[serde(flatten)]
    stats: &'a MetricsStats,
}

/// Counters, histograms and gauges for the resolver, backed by a dedicated
/// Prometheus registry, plus alert-threshold evaluation.
///
/// The prime counters are monotonic; `reset` clears only error counts and
/// latency samples.
pub struct MetricsSink {
    registry: Registry,
    total_queries: IntCounter,
    successful_queries: IntCounter,
    failed_queries: IntCounter,
    cache_hits: IntCounter,
    cache_misses: IntCounter,
    total_retries: IntCounter,
    query_duration_ms: Histogram,
    cache_hit_rate: Gauge,
    errors_by_kind: IntCounterVec,

    error_counts: Mutex<HashMap<String, u64>>,
    server_latencies: Mutex<HashMap<String, VecDeque<f64>>>,
    retry_attempts: Mutex<HashMap<String, VecDeque<u32>>>,

    thresholds: Mutex<Option<AlertThresholds>>,
    alert_sinks: Mutex<Vec<Arc<dyn AlertSink>>>,
    exporter_started: AtomicBool,
}

impl MetricsSink {
    pub fn new() -> Self {
        let registry = Registry::new();

        let total_queries = register_counter(&registry, "dns_queries_total", "Total DNS queries");
        let successful_queries = register_counter(
            &registry,
            "dns_queries_successful_total",
            "Successful DNS queries",
        );
        let failed_queries =
            register_counter(&registry, "dns_queries_failed_total", "Failed DNS queries");
        let cache_hits = register_counter(&registry, "dns_cache_hits_total", "Cache hits");
        let cache_misses = register_counter(&registry, "dns_cache_misses_total", "Cache misses");
        let total_retries = register_counter(&registry, "dns_retries_total", "Query retries");

        let query_duration_ms = Histogram::with_opts(
            HistogramOpts::new("dns_query_duration_ms", "DNS query duration in milliseconds")
                .buckets(DURATION_BUCKETS_MS.to_vec()),
        )
        .expect("histogram opts");
        registry
            .register(Box::new(query_duration_ms.clone()))
            .expect("histogram registration");

        let cache_hit_rate = Gauge::with_opts(Opts::new(
            "dns_cache_hit_rate",
            "Cache hit rate in [0, 1]",
        ))
        .expect("gauge opts");
        registry
            .register(Box::new(cache_hit_rate.clone()))
            .expect("gauge registration");

        let errors_by_kind = IntCounterVec::new(
            Opts::new("dns_errors_total", "Errors by kind"),
            &["kind"],
        )
        .expect("counter vec opts");
        registry
            .register(Box::new(errors_by_kind.clone()))
            .expect("counter vec registration");

        Self {
            registry,
            total_queries,
            successful_queries,
            failed_queries,
            cache_hits,
            cache_misses,
            total_retries,
            query_duration_ms,
            cache_hit_rate,
            errors_by_kind,
            error_counts: Mutex::new(HashMap::new()),
            server_latencies: Mutex::new(HashMap::new()),
            retry_attempts: Mutex::new(HashMap::new()),
            thresholds: Mutex::new(None),
            alert_sinks: Mutex::new(Vec::new()),
            exporter_started: AtomicBool::new(false),
        }
    }

    pub fn record_query(&self, hostname: &str, duration: Duration, success: bool) {
        self.total_queries.inc();
        if success {
            self.successful_queries.inc();
        } else {
            self.failed_queries.inc();
        }

        let duration_ms = duration.as_secs_f64() * 1000.0;
        self.query_duration_ms.observe(duration_ms);

        let Some(thresholds) = *self.thresholds.lock() else {
            return;
        };

        if duration > thresholds.latency {
            self.fire_alert(&format!(
                "High latency detected for {}: {}ms",
                hostname,
                duration.as_millis()
            ));
        }

        let failed = self.failed_queries.get() as f64;
        let total = self.successful_queries.get() as f64 + failed;
        if total > 0.0 {
            let error_rate = failed / total;
            if error_rate > thresholds.error_rate {
                self.fire_alert(&format!(
                    "High error rate detected: {:.1}%",
                    error_rate * 100.0
                ));
            }
        }
    }

    pub fn record_cache_hit(&self, hostname: &str) {
        debug!(hostname = %hostname, "Cache hit");
        self.cache_hits.inc();
        self.update_cache_hit_rate();
    }

    pub fn record_cache_miss(&self, hostname: &str) {
        debug!(hostname = %hostname, "Cache miss");
        self.cache_misses.inc();
        self.update_cache_hit_rate();
    }

    /// Appends to the per-server ring (last 1000 samples kept).
    pub fn record_server_latency(&self, server: &str, latency: Duration) {
        let latency_ms = latency.as_secs_f64() * 1000.0;
        {
            let mut latencies = self.server_latencies.lock();
            let samples = latencies.entry(server.to_string()).or_default();
            samples.push_back(latency_ms);
            while samples.len() > MAX_LATENCY_SAMPLES {
                samples.pop_front();
            }
        }

        if let Some(thresholds) = *self.thresholds.lock() {
            if latency > thresholds.latency {
                self.fire_alert(&format!(
                    "High server latency detected for {}: {}ms",
                    server,
                    latency.as_millis()
                ));
            }
        }
    }

    pub fn record_error(&self, kind: &str, detail: &str) {
        debug!(kind = %kind, detail = %detail, "Error recorded");
        let mut counts = self.error_counts.lock();
        *counts.entry(kind.to_string()).or_insert(0) += 1;
        self.errors_by_kind.with_label_values(&[kind]).inc();
    }

    /// Appends to the per-hostname ring (last 100 attempt indices kept).
    pub fn record_retry(&self, hostname: &str, attempt: u32) {
        self.total_retries.inc();
        let mut retries = self.retry_attempts.lock();
        let history = retries.entry(hostname.to_string()).or_default();
        history.push_back(attempt);
        while history.len() > MAX_RETRY_HISTORY {
            history.pop_front();
        }
    }

    pub fn stats(&self) -> MetricsStats {
        let cache_hits = self.cache_hits.get();
        let cache_misses = self.cache_misses.get();
        let lookups = cache_hits + cache_misses;

        let sample_count = self.query_duration_ms.get_sample_count();
        let avg_query_time_ms = if sample_count > 0 {
            self.query_duration_ms.get_sample_sum() / sample_count as f64
        } else {
            0.0
        };

        let server_latencies = self
            .server_latencies
            .lock()
            .iter()
            .filter(|(_, samples)| !samples.is_empty())
            .map(|(server, samples)| {
                let mean = samples.iter().sum::<f64>() / samples.len() as f64;
                (server.clone(), mean)
            })
            .collect();

        let retry_attempts = self
            .retry_attempts
            .lock()
            .iter()
            .map(|(host, history)| (host.clone(), history.iter().copied().collect()))
            .collect();

        MetricsStats {
            total_queries: self.total_queries.get(),
            successful_queries: self.successful_queries.get(),
            failed_queries: self.failed_queries.get(),
            cache_hits,
            cache_misses,
            cache_hit_rate: if lookups > 0 {
                cache_hits as f64 / lookups as f64
            } else {
                0.0
            },
            avg_query_time_ms,
            error_counts: self.error_counts.lock().clone(),
            server_latencies,
            total_retries: self.total_retries.get(),
            retry_attempts,
        }
    }

    /// Clears error counts and latency samples. The prime counters are
    /// monotonic and survive.
    pub fn reset(&self) {
        self.error_counts.lock().clear();
        self.server_latencies.lock().clear();
        self.errors_by_kind.reset();
    }

    /// Arms alert evaluation. Until this is called no alert fires.
    pub fn set_alert_thresholds(
        &self,
        error_rate_threshold: f64,
        latency_threshold: Duration,
    ) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&error_rate_threshold) {
            return Err(ConfigError::Validation {
                field: "error_rate_threshold",
                message: "error rate threshold must be between 0 and 1".to_string(),
            });
        }
        if latency_threshold.is_zero() {
            return Err(ConfigError::Validation {
                field: "latency_threshold",
                message: "latency threshold must be positive".to_string(),
            });
        }
        *self.thresholds.lock() = Some(AlertThresholds {
            error_rate: error_rate_threshold,
            latency: latency_threshold,
        });
        Ok(())
    }

    pub fn register_alert_sink(&self, sink: Arc<dyn AlertSink>) {
        self.alert_sinks.lock().push(sink);
    }

    pub fn clear_alert_sinks(&self) {
        self.alert_sinks.lock().clear();
    }

    /// Full stats snapshot plus a wall-clock timestamp, as JSON.
    pub fn export_to_file(&self, path: &str) -> Result<(), ResolveError> {
        let stats = self.stats();
        let exported = ExportedStats {
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
            stats: &stats,
        };
        let json = serde_json::to_string_pretty(&exported)
            .map_err(|e| ResolveError::MetricsExport(e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| ResolveError::MetricsExport(format!("{}: {}", path, e)))?;
        Ok(())
    }

    /// Binds the Prometheus text endpoint. Startup failure leaves the sink
    /// fully functional in-memory.
    pub async fn start_exporter(&self, address: &str) -> Result<(), ResolveError> {
        if self.exporter_started.swap(true, Ordering::SeqCst) {
            debug!(address = %address, "Exporter already running, skipping bind");
            return Ok(());
        }
        match super::exporter::start(self.registry.clone(), address).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.exporter_started.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    fn update_cache_hit_rate(&self) {
        let hits = self.cache_hits.get() as f64;
        let total = hits + self.cache_misses.get() as f64;
        if total > 0.0 {
            self.cache_hit_rate.set(hits / total);
        }
    }

    /// User code runs on a snapshot of the sink list, without the lock held.
    fn fire_alert(&self, message: &str) {
        let sinks: Vec<Arc<dyn AlertSink>> = self.alert_sinks.lock().clone();
        if sinks.is_empty() {
            return;
        }
        error!(alert = %message, "Metrics alert");
        for sink in sinks {
            sink.on_alert(message);
        }
    }
}

impl Default for MetricsSink {
    fn default() -> Self {
        Self::new()
    }
}

fn register_counter(registry: &Registry, name: &str, help: &str) -> IntCounter {
    let counter = IntCounter::with_opts(Opts::new(name, help)).expect("counter opts");
    registry
        .register(Box::new(counter.clone()))
        .expect("counter registration");
    counter
}
