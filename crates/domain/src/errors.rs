use crate::resolution::ResolveStatus;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    #[error("Resolver not initialized")]
    NotInitialized,

    #[error("No address records for {0}")]
    NoData(String),

    #[error("Hostname not found: {0}")]
    NotFound(String),

    #[error("Invalid hostname: {0}")]
    InvalidHostname(String),

    #[error("Query timeout contacting {server}")]
    Timeout { server: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Cache persistence failed: {0}")]
    Persistence(String),

    #[error("Metrics export failed: {0}")]
    MetricsExport(String),

    #[error("Metrics exporter failed to start: {0}")]
    ExporterStartup(String),
}

impl ResolveError {
    /// Terminal name-resolution outcomes are never retried; everything
    /// transport-shaped is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ResolveError::Timeout { .. } | ResolveError::Transport(_)
        )
    }

    pub fn status(&self) -> ResolveStatus {
        match self {
            ResolveError::NotInitialized => ResolveStatus::NotInitialized,
            ResolveError::NoData(_) => ResolveStatus::NoData,
            ResolveError::NotFound(_) => ResolveStatus::NotFound,
            _ => ResolveStatus::Failed,
        }
    }
}
