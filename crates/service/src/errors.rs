use std::io;
use std::path::PathBuf;

use axum::http::StatusCode;
use thiserror::Error;

/// Failures of the backing document.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database file {} not found", .path.display())]
    NotFound { path: PathBuf },
    #[error("cannot read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("{} is not a collection document: {source}", .path.display())]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("cannot encode store: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("cannot write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Per-request failures; `Display` is the message sent back to the client.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("Collection not found")]
    CollectionNotFound,
    #[error("Item not found")]
    ItemNotFound,
    #[error("ID required")]
    IdRequired,
    #[error("Invalid ID")]
    InvalidId,
    #[error("{0}")]
    InvalidBody(String),
    #[error("Failed to save data")]
    SaveFailed(#[source] StoreError),
    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl CollectionError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::CollectionNotFound | Self::ItemNotFound => StatusCode::NOT_FOUND,
            Self::IdRequired | Self::InvalidId | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::SaveFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// Text sent to the client; never includes the underlying store error.
    pub fn message(&self) -> String {
        self.to_string()
    }
}
