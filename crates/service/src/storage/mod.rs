//! Storage for the mock server
//!
//! One JSON document holds every collection; it is loaded once at startup
//! and rewritten in full after each mutation.

pub mod document_store;

pub use document_store::{find_index, load, persist, DocumentStore, Store};
