use std::net::IpAddr;
use std::time::Duration;

/// Terminal status of a single resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStatus {
    Success,
    NoData,
    NotFound,
    NotInitialized,
    Failed,
}

impl ResolveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NoData => "no_data",
            Self::NotFound => "not_found",
            Self::NotInitialized => "not_initialized",
            Self::Failed => "failed",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::fmt::Display for ResolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of `resolve` / `resolve_batch` / `refresh`.
///
/// Errors surface in `status`, never as an `Err` from the resolver.
#[derive(Debug, Clone)]
pub struct ResolveResult {
    pub hostname: String,
    pub addresses: Vec<IpAddr>,
    pub status: ResolveStatus,
    pub elapsed: Duration,
}

impl ResolveResult {
    pub fn cache_hit(hostname: String, addresses: Vec<IpAddr>) -> Self {
        Self {
            hostname,
            addresses,
            status: ResolveStatus::Success,
            elapsed: Duration::ZERO,
        }
    }

    pub fn failure(hostname: String, status: ResolveStatus, elapsed: Duration) -> Self {
        Self {
            hostname,
            addresses: Vec::new(),
            status,
            elapsed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
