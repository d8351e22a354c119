use async_trait::async_trait;
use celeris_dns_application::ports::{AddressInfoProvider, FamilyPreference, ProviderResponse};
use celeris_dns_domain::ResolveError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn addrs(specs: &[&str]) -> Vec<IpAddr> {
    specs.iter().map(|s| s.parse().unwrap()).collect()
}

/// Scripted address-info provider. Responses are consumed front-to-back;
/// when the script is exhausted the default answer (if any) is returned.
#[derive(Default)]
pub struct StubProvider {
    responses: Mutex<VecDeque<Result<ProviderResponse, ResolveError>>>,
    default_addresses: Mutex<Option<Vec<IpAddr>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every unscripted lookup answers with these addresses.
    pub fn with_default(self, specs: &[&str]) -> Self {
        *self.default_addresses.lock() = Some(addrs(specs));
        self
    }

    /// Simulated upstream latency, for observing concurrency.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_ok(&self, specs: &[&str]) {
        self.responses.lock().push_back(Ok(ProviderResponse {
            addresses: addrs(specs),
            authoritative: false,
        }));
    }

    pub fn push_authoritative(&self, specs: &[&str]) {
        self.responses.lock().push_back(Ok(ProviderResponse {
            addresses: addrs(specs),
            authoritative: true,
        }));
    }

    pub fn push_err(&self, error: ResolveError) {
        self.responses.lock().push_back(Err(error));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AddressInfoProvider for StubProvider {
    async fn lookup(
        &self,
        hostname: &str,
        _family: FamilyPreference,
    ) -> Result<ProviderResponse, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.responses.lock().pop_front();
        let result = match scripted {
            Some(response) => response,
            None => match self.default_addresses.lock().clone() {
                Some(addresses) => Ok(ProviderResponse {
                    addresses,
                    authoritative: false,
                }),
                None => Err(ResolveError::NotFound(hostname.to_string())),
            },
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
