use std::{future::Future, net::SocketAddr};

use configs::AppConfig;
use service::storage::DocumentStore;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::observability;
use crate::routes::{self, AppState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Public entry: load the database, bind, and serve until Ctrl+C.
///
/// `cfg` is expected to be validated already. The database must exist and
/// parse before anything is bound.
pub async fn run(cfg: AppConfig) -> Result<(), StartupError> {
    let store = DocumentStore::open(&cfg.database.path).await?;
    info!(path = %store.path().display(), "database loaded");

    if let Some(admin_addr) = &cfg.admin.addr {
        let _admin = common::admin_http::spawn_admin_server(admin_addr, observability::metrics_text).await?;
    }

    let addr = cfg.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind { addr: addr.clone(), source })?;
    let local = listener.local_addr().map_err(|source| StartupError::Bind { addr, source })?;
    info!(addr = %local, "json-mock listening");
    println!("JSON Server running on http://localhost:{}", local.port());

    serve(listener, AppState::new(store), shutdown_signal()).await
}

/// Serve the collection router on an already bound listener.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = routes::build_router(state, build_cors());
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| StartupError::Any(e.into()))?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl+C; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
