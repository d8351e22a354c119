use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

/// One upstream DNS server entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UpstreamServer {
    pub address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Relative selection weight, 1..=100.
    #[serde(default = "default_weight")]
    pub weight: u32,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl UpstreamServer {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port: default_port(),
            weight: default_weight(),
            timeout_ms: default_timeout_ms(),
            enabled: true,
        }
    }

    pub fn ip(&self) -> Option<IpAddr> {
        self.address.parse().ok()
    }

    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.ip().map(|ip| SocketAddr::new(ip, self.port))
    }
}

fn default_port() -> u16 {
    53
}

fn default_weight() -> u32 {
    1
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_true() -> bool {
    true
}
