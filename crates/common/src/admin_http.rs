//! Admin HTTP side listener
//!
//! Every path on the main listener is a collection name, so health and
//! metrics are served from their own address.

use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::types::Health;

/// Renders the metrics payload; supplied by the caller.
pub type MetricsFn = fn() -> (StatusCode, String);

async fn healthz() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub fn admin_router(metrics_fn: MetricsFn) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(move || async move { metrics_fn() }))
}

/// Bind `addr` and serve the admin router on the current runtime.
///
/// Binding errors are returned; serving errors after that are logged.
pub async fn spawn_admin_server(addr: &str, metrics_fn: MetricsFn) -> anyhow::Result<JoinHandle<()>> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("cannot bind admin listener {addr}: {e}"))?;
    let local = listener.local_addr()?;
    info!(addr = %local, "admin server listening");
    let router = admin_router(metrics_fn);
    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "admin server stopped");
        }
    }))
}
