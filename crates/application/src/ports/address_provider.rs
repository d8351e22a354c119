use async_trait::async_trait;
use celeris_dns_domain::ResolveError;
use std::net::IpAddr;

/// Address family hint passed to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyPreference {
    /// IPv4 and IPv6 answers are both welcome.
    Unspecified,
    Ipv4Only,
}

/// Completed lookup from an upstream server.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub addresses: Vec<IpAddr>,
    /// AA bit of the answering response, when the transport surfaces it.
    pub authoritative: bool,
}

/// Port for the component that performs the actual DNS lookup (wire
/// protocol, socket I/O). The resolver core never touches sockets itself.
///
/// Terminal conditions map to `ResolveError::{NoData, NotFound,
/// NotInitialized}`; any other error is treated as retryable by the caller.
#[async_trait]
pub trait AddressInfoProvider: Send + Sync {
    async fn lookup(
        &self,
        hostname: &str,
        family: FamilyPreference,
    ) -> Result<ProviderResponse, ResolveError>;
}
