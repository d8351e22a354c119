use super::MetricsSink;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Periodically writes the stats snapshot to the configured metrics file.
pub struct MetricsReporterJob {
    metrics: Arc<MetricsSink>,
    path: String,
    interval_secs: u64,
    shutdown: CancellationToken,
}

impl MetricsReporterJob {
    pub fn new(metrics: Arc<MetricsSink>, path: impl Into<String>, interval_secs: u64) -> Self {
        Self {
            metrics,
            path: path.into(),
            interval_secs,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub async fn start(self: Arc<Self>) {
        info!(
            path = %self.path,
            interval_secs = self.interval_secs,
            "Starting metrics reporter job"
        );

        let job = Arc::clone(&self);
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(job.interval_secs));
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!("MetricsReporterJob: shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        if let Err(e) = job.metrics.export_to_file(&job.path) {
                            error!(error = %e, path = %job.path, "Metrics export failed");
                        }
                    }
                }
            }
        });
    }
}
