use super::message;
use crate::metrics::MetricsSink;
use async_trait::async_trait;
use celeris_dns_application::ports::{AddressInfoProvider, FamilyPreference, ProviderResponse};
use celeris_dns_domain::{RecordType, ResolveError, ResolverConfig};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tracing::debug;

const RESPONSE_BUF_SIZE: usize = 4096;

#[derive(Debug, Clone)]
struct Endpoint {
    addr: SocketAddr,
    timeout: Duration,
}

/// Reference address-info provider: plain UDP queries against the configured
/// upstream servers, tried in order, first usable answer wins.
///
/// Per-exchange latency is fed into the metrics sink when one is attached.
pub struct UdpAddressProvider {
    servers: Vec<Endpoint>,
    metrics: Option<Arc<MetricsSink>>,
}

impl UdpAddressProvider {
    pub fn new(servers: Vec<SocketAddr>, timeout: Duration) -> Self {
        Self {
            servers: servers
                .into_iter()
                .map(|addr| Endpoint { addr, timeout })
                .collect(),
            metrics: None,
        }
    }

    /// Builds from the enabled servers of a validated configuration.
    pub fn from_config(config: &ResolverConfig) -> Self {
        let servers = config
            .enabled_servers()
            .iter()
            .filter_map(|server| {
                server.socket_addr().map(|addr| Endpoint {
                    addr,
                    timeout: Duration::from_millis(server.timeout_ms),
                })
            })
            .collect();
        Self {
            servers,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsSink>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    async fn query_endpoint(
        &self,
        endpoint: &Endpoint,
        hostname: &str,
        record_types: &[RecordType],
    ) -> Result<ProviderResponse, ResolveError> {
        let mut addresses: Vec<IpAddr> = Vec::new();
        let mut authoritative = false;
        let mut all_nxdomain = true;
        let mut any_server_error = false;

        for &record_type in record_types {
            let response = self.exchange(endpoint, hostname, record_type).await?;
            all_nxdomain &= response.is_nxdomain();
            any_server_error |= response.is_server_error();
            authoritative |= response.authoritative;
            addresses.extend(response.addresses);
        }

        if addresses.is_empty() {
            if all_nxdomain {
                return Err(ResolveError::NotFound(hostname.to_string()));
            }
            if any_server_error {
                return Err(ResolveError::Transport(format!(
                    "server error from {}",
                    endpoint.addr
                )));
            }
            return Err(ResolveError::NoData(hostname.to_string()));
        }

        Ok(ProviderResponse {
            addresses,
            authoritative,
        })
    }

    async fn exchange(
        &self,
        endpoint: &Endpoint,
        hostname: &str,
        record_type: RecordType,
    ) -> Result<message::WireResponse, ResolveError> {
        let (id, request) = message::build_query(hostname, record_type)?;

        let bind_addr: SocketAddr = if endpoint.addr.is_ipv4() {
            (std::net::Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| ResolveError::Transport(format!("failed to bind socket: {}", e)))?;
        socket.connect(endpoint.addr).await.map_err(|e| {
            ResolveError::Transport(format!("failed to connect to {}: {}", endpoint.addr, e))
        })?;

        let start = Instant::now();
        socket
            .send(&request)
            .await
            .map_err(|e| ResolveError::Transport(format!("failed to send query: {}", e)))?;

        let mut buf = vec![0u8; RESPONSE_BUF_SIZE];
        let len = tokio::time::timeout(endpoint.timeout, socket.recv(&mut buf))
            .await
            .map_err(|_| ResolveError::Timeout {
                server: endpoint.addr.to_string(),
            })?
            .map_err(|e| ResolveError::Transport(format!("failed to receive response: {}", e)))?;

        let elapsed = start.elapsed();
        if let Some(ref metrics) = self.metrics {
            metrics.record_server_latency(&endpoint.addr.to_string(), elapsed);
        }

        debug!(
            server = %endpoint.addr,
            hostname = %hostname,
            record_type = %record_type,
            elapsed_ms = elapsed.as_millis() as u64,
            "Upstream exchange completed"
        );

        message::parse_response(&buf[..len], id)
    }
}

#[async_trait]
impl AddressInfoProvider for UdpAddressProvider {
    async fn lookup(
        &self,
        hostname: &str,
        family: FamilyPreference,
    ) -> Result<ProviderResponse, ResolveError> {
        if self.servers.is_empty() {
            return Err(ResolveError::NotInitialized);
        }

        let record_types: &[RecordType] = match family {
            FamilyPreference::Ipv4Only => &[RecordType::A],
            FamilyPreference::Unspecified => &[RecordType::A, RecordType::Aaaa],
        };

        let mut last_error = ResolveError::NotInitialized;
        for endpoint in &self.servers {
            match self.query_endpoint(endpoint, hostname, record_types).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() => {
                    debug!(server = %endpoint.addr, error = %e, "Upstream failed, trying next");
                    last_error = e;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error)
    }
}
