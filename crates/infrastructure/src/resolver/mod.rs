use crate::cache::{CacheLookup, CachePersistor, HostCache};
use crate::events::EventBus;
use crate::metrics::{MetricsReporterJob, MetricsSink};
use crate::provider::UdpAddressProvider;
use celeris_dns_application::ports::{AddressInfoProvider, FamilyPreference};
use celeris_dns_domain::{
    AddressChangeEvent, ConfigError, EventSource, RecordType, ResolveError, ResolveResult,
    ResolveStatus, ResolverConfig,
};
use futures::future::join_all;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Handles lent to in-flight resolutions; replaced wholesale on config
/// (re)load.
struct Active {
    provider: Arc<dyn AddressInfoProvider>,
    cache: Arc<HostCache>,
    config: Arc<ResolverConfig>,
    reporter_shutdown: Option<CancellationToken>,
}

#[derive(Clone)]
enum ConfigSource {
    File(String),
    Inline(ResolverConfig),
    InlineWithProvider(ResolverConfig, Arc<dyn AddressInfoProvider>),
}

/// The resolution engine: cache lookup, provider fan-out with per-context
/// retry and exponential back-off, batching under a concurrency cap, change
/// notification, and metrics.
///
/// Resolution errors surface in [`ResolveResult::status`]; only
/// configuration errors propagate as `Err`.
pub struct Resolver {
    state: RwLock<Option<Active>>,
    source: parking_lot::Mutex<Option<ConfigSource>>,
    metrics: Arc<MetricsSink>,
    events: Arc<EventBus>,
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(None),
            source: parking_lot::Mutex::new(None),
            metrics: Arc::new(MetricsSink::new()),
            events: Arc::new(EventBus::new()),
        }
    }

    pub fn with_event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> Arc<MetricsSink> {
        Arc::clone(&self.metrics)
    }

    pub fn events(&self) -> Arc<EventBus> {
        Arc::clone(&self.events)
    }

    pub async fn is_initialized(&self) -> bool {
        self.state.read().await.is_some()
    }

    pub async fn cache(&self) -> Option<Arc<HostCache>> {
        self.state.read().await.as_ref().map(|a| Arc::clone(&a.cache))
    }

    /// Applies a validated configuration: rebuilds the UDP provider from the
    /// enabled servers, builds a fresh cache, restores a persisted snapshot
    /// when configured, and starts the metrics exporter/reporter.
    pub async fn load_config(&self, config: ResolverConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let provider: Arc<dyn AddressInfoProvider> = Arc::new(
            UdpAddressProvider::from_config(&config).with_metrics(Arc::clone(&self.metrics)),
        );
        self.install(config.clone(), provider).await?;
        *self.source.lock() = Some(ConfigSource::Inline(config));
        Ok(())
    }

    /// Loads the configuration from a YAML file, then applies it. The path
    /// is remembered as the source for `reload_config`.
    pub async fn load_config_file(&self, path: &str) -> Result<(), ConfigError> {
        let config = ResolverConfig::load_from_file(path)?;
        let provider: Arc<dyn AddressInfoProvider> = Arc::new(
            UdpAddressProvider::from_config(&config).with_metrics(Arc::clone(&self.metrics)),
        );
        self.install(config, provider).await?;
        *self.source.lock() = Some(ConfigSource::File(path.to_string()));
        Ok(())
    }

    /// Applies a configuration with a caller-supplied provider.
    pub async fn load_config_with_provider(
        &self,
        config: ResolverConfig,
        provider: Arc<dyn AddressInfoProvider>,
    ) -> Result<(), ConfigError> {
        self.install(config.clone(), Arc::clone(&provider)).await?;
        *self.source.lock() = Some(ConfigSource::InlineWithProvider(config, provider));
        Ok(())
    }

    /// Persists the current cache when configured, then re-applies the
    /// configuration from the remembered source.
    pub async fn reload_config(&self) -> Result<(), ConfigError> {
        let source = self.source.lock().clone();
        let Some(source) = source else {
            return Err(ConfigError::Validation {
                field: "source",
                message: "no configuration has been loaded".to_string(),
            });
        };

        if let Some(active) = self.state.read().await.as_ref() {
            let cache_cfg = &active.config.cache;
            if cache_cfg.enabled && cache_cfg.persistent && !cache_cfg.cache_file.is_empty() {
                if let Err(e) = CachePersistor::save(&active.cache, &cache_cfg.cache_file) {
                    warn!(error = %e, "Failed to persist cache before reload");
                }
            }
        }

        match source {
            ConfigSource::File(path) => self.load_config_file(&path).await,
            ConfigSource::Inline(config) => self.load_config(config).await,
            ConfigSource::InlineWithProvider(config, provider) => {
                self.load_config_with_provider(config, provider).await
            }
        }
    }

    async fn install(
        &self,
        config: ResolverConfig,
        provider: Arc<dyn AddressInfoProvider>,
    ) -> Result<(), ConfigError> {
        config.validate()?;

        let cache = Arc::new(HostCache::with_capacity(
            config.cache.ttl(),
            config.cache.max_size,
        ));

        if config.cache.enabled && config.cache.persistent && !config.cache.cache_file.is_empty() {
            match CachePersistor::load(&cache, &config.cache.cache_file) {
                Ok(restored) => {
                    info!(restored, file = %config.cache.cache_file, "Persisted cache restored")
                }
                Err(e) => warn!(error = %e, "Persisted cache not restored"),
            }
        }

        let mut reporter_shutdown = None;
        if config.metrics.enabled {
            if !config.metrics.exporter_address.is_empty() {
                if let Err(e) = self
                    .metrics
                    .start_exporter(&config.metrics.exporter_address)
                    .await
                {
                    warn!(error = %e, "Continuing with in-memory metrics only");
                }
            }

            if !config.metrics.metrics_file.is_empty() {
                let token = CancellationToken::new();
                let job = Arc::new(
                    MetricsReporterJob::new(
                        Arc::clone(&self.metrics),
                        config.metrics.metrics_file.clone(),
                        config.metrics.report_interval_secs,
                    )
                    .with_cancellation(token.clone()),
                );
                job.start().await;
                reporter_shutdown = Some(token);
            }
        }

        info!(
            servers = config.enabled_servers().len(),
            cache_ttl_secs = config.cache.ttl_seconds,
            cache_max_size = config.cache.max_size,
            "Resolver configured"
        );

        let mut state = self.state.write().await;
        if let Some(previous) = state.take() {
            if let Some(token) = previous.reporter_shutdown {
                token.cancel();
            }
        }
        *state = Some(Active {
            provider,
            cache,
            config: Arc::new(config),
            reporter_shutdown,
        });

        Ok(())
    }

    pub async fn resolve(&self, hostname: &str) -> ResolveResult {
        self.resolve_with_source(hostname, EventSource::Query).await
    }

    /// Drops the hostname from the cache, then resolves it again.
    pub async fn refresh(&self, hostname: &str) -> ResolveResult {
        if let Some(active) = self.state.read().await.as_ref() {
            active.cache.remove(hostname);
        }
        self.resolve_with_source(hostname, EventSource::Refresh)
            .await
    }

    /// Resolves hostnames in chunks of `min(input_len,
    /// max_concurrent_queries)`; each chunk drains completely before the next
    /// one is submitted. Output order matches input order.
    pub async fn resolve_batch(&self, hostnames: &[String]) -> Vec<ResolveResult> {
        let max_concurrent = self
            .state
            .read()
            .await
            .as_ref()
            .map(|a| a.config.max_concurrent_queries())
            .unwrap_or(100);

        let chunk_size = hostnames.len().min(max_concurrent).max(1);
        let mut results = Vec::with_capacity(hostnames.len());

        for chunk in hostnames.chunks(chunk_size) {
            let in_flight: Vec<_> = chunk.iter().map(|hostname| self.resolve(hostname)).collect();
            results.extend(join_all(in_flight).await);
        }

        results
    }

    async fn resolve_with_source(&self, hostname: &str, source: EventSource) -> ResolveResult {
        let (provider, cache, config) = {
            let state = self.state.read().await;
            match state.as_ref() {
                None => {
                    return ResolveResult::failure(
                        hostname.to_lowercase(),
                        ResolveStatus::NotInitialized,
                        Duration::ZERO,
                    );
                }
                Some(active) => (
                    Arc::clone(&active.provider),
                    Arc::clone(&active.cache),
                    Arc::clone(&active.config),
                ),
            }
        };

        let hostname = hostname.to_lowercase();

        let mut previous: Option<Vec<IpAddr>> = None;
        if config.cache.enabled {
            match cache.lookup(&hostname) {
                CacheLookup::Hit(addresses) => {
                    self.metrics.record_cache_hit(&hostname);
                    return ResolveResult::cache_hit(hostname, addresses);
                }
                CacheLookup::Miss { previous: stale } => {
                    self.metrics.record_cache_miss(&hostname);
                    previous = stale;
                }
            }
        }

        let family = if config.ipv6_enabled() {
            FamilyPreference::Unspecified
        } else {
            FamilyPreference::Ipv4Only
        };

        let start = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            match provider.lookup(&hostname, family).await {
                Ok(response) if !response.addresses.is_empty() => {
                    let elapsed = start.elapsed();
                    self.metrics.record_query(&hostname, elapsed, true);

                    if config.cache.enabled {
                        cache.update(&hostname, response.addresses.clone());
                    }

                    let old_addresses = previous.unwrap_or_default();
                    if AddressChangeEvent::addresses_differ(&old_addresses, &response.addresses) {
                        self.events.notify(AddressChangeEvent {
                            hostname: hostname.clone(),
                            old_addresses,
                            new_addresses: response.addresses.clone(),
                            timestamp: SystemTime::now(),
                            source,
                            ttl_seconds: config.cache.ttl_seconds,
                            record_type: RecordType::from_addresses(&response.addresses),
                            authoritative: response.authoritative,
                        });
                    }

                    return ResolveResult {
                        hostname,
                        addresses: response.addresses,
                        status: ResolveStatus::Success,
                        elapsed,
                    };
                }
                Ok(_) => {
                    let elapsed = start.elapsed();
                    self.metrics
                        .record_error("resolution_failure", "empty address list");
                    self.metrics.record_query(&hostname, elapsed, false);
                    return ResolveResult::failure(hostname, ResolveStatus::NoData, elapsed);
                }
                Err(e) => {
                    self.metrics
                        .record_error("resolution_failure", &e.to_string());

                    if e.is_retryable() && attempt < config.retry.max_attempts {
                        attempt += 1;
                        self.metrics.record_retry(&hostname, attempt);
                        let delay = config.retry.delay_for_attempt(attempt);
                        debug!(
                            hostname = %hostname,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Retrying after back-off"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    let elapsed = start.elapsed();
                    self.metrics.record_query(&hostname, elapsed, false);
                    warn!(hostname = %hostname, error = %e, "Resolution failed");
                    return ResolveResult::failure(hostname, e.status(), elapsed);
                }
            }
        }
    }

    pub async fn save_cache(&self, path: &str) -> Result<(), ResolveError> {
        match self.state.read().await.as_ref() {
            Some(active) => CachePersistor::save(&active.cache, path),
            None => Err(ResolveError::NotInitialized),
        }
    }

    pub async fn load_cache(&self, path: &str) -> Result<usize, ResolveError> {
        match self.state.read().await.as_ref() {
            Some(active) => CachePersistor::load(&active.cache, path),
            None => Err(ResolveError::NotInitialized),
        }
    }

    pub async fn clear_cache(&self) {
        if let Some(active) = self.state.read().await.as_ref() {
            active.cache.clear();
        }
    }

    pub fn stats(&self) -> crate::metrics::MetricsStats {
        self.metrics.stats()
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}
