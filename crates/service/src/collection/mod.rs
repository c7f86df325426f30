//! Method + path dispatch over the document store.

pub mod repository;
pub mod route;
pub mod service;

pub use repository::CollectionRepository;
pub use route::{parse_id, RoutePath};
pub use service::{CollectionService, Reply};
