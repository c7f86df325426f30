use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use service::collection::{CollectionRepository, CollectionService};

pub mod collections;

/// Shared by every request on the main listener.
#[derive(Clone)]
pub struct AppState {
    pub collections: Arc<CollectionService>,
}

impl AppState {
    pub fn new(repo: Arc<dyn CollectionRepository>) -> Self {
        Self { collections: Arc::new(CollectionService::new(repo)) }
    }
}

/// Build the application router.
///
/// Every path names a collection, so the whole surface is one fallback
/// handler that does its own method dispatch. Request bodies are not capped:
/// any record the decoder accepts is stored.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .fallback(collections::handle_collection)
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
