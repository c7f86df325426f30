//! Collection engine behind the mock server.
//! - `storage` owns the JSON document and its load/persist cycle.
//! - `collection` maps a method + path onto one store operation.
//! - `record` holds the helpers for the one field the engine cares about, `id`.

pub mod collection;
pub mod errors;
pub mod record;
pub mod storage;
