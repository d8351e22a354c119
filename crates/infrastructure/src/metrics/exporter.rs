use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use celeris_dns_domain::ResolveError;
use prometheus::{Encoder, Registry, TextEncoder};
use std::net::SocketAddr;
use tracing::{error, info};

/// Binds `address` and serves `GET /metrics` in Prometheus text format on a
/// background task. Returns once the listener is bound.
pub(crate) async fn start(registry: Registry, address: &str) -> Result<(), ResolveError> {
    let addr: SocketAddr = address
        .parse()
        .map_err(|e| ResolveError::ExporterStartup(format!("{}: {}", address, e)))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ResolveError::ExporterStartup(format!("{}: {}", address, e)))?;

    info!(address = %addr, "Metrics exporter listening");

    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(registry);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Metrics exporter terminated");
        }
    });

    Ok(())
}

async fn metrics_handler(State(registry): State<Registry>) -> Result<String, StatusCode> {
    let mut buf = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buf)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    String::from_utf8(buf).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
