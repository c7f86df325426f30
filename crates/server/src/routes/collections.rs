use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{Method, Uri},
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use service::collection::{Reply, RoutePath};
use service::errors::CollectionError;

use super::AppState;
use crate::errors::ApiError;
use crate::observability;

/// Single entry point for `/{collection}` and `/{collection}/{id}`.
///
/// Logs exactly one entry per request with the final status.
pub async fn handle_collection(
    State(state): State<AppState>,
    connect: Option<ConnectInfo<SocketAddr>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let started = Instant::now();
    let route = RoutePath::parse(uri.path());
    let result = state.collections.dispatch(&method, &route, &body).await;

    let status = match &result {
        Ok(reply) => reply.status,
        Err(err) => err.status(),
    };
    let remote = connect
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    info!(%method, %remote, collection = %route.collection, status = status.as_u16(), "request");
    observability::record_request(&method, status, started.elapsed());
    if let Err(CollectionError::SaveFailed(_)) = &result {
        observability::PERSIST_FAILURES_TOTAL.inc();
    }

    match result {
        Ok(reply) => reply_response(reply),
        Err(err) => ApiError::from(err).into_response(),
    }
}

fn reply_response(reply: Reply) -> Response {
    match reply.body {
        Some(body) => (reply.status, Json(body)).into_response(),
        None => reply.status.into_response(),
    }
}
