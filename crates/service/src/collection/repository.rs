use async_trait::async_trait;

use crate::errors::StoreError;
use crate::record::{assign_id_if_missing, set_id, Record};
use crate::storage::document_store::{position, DocumentStore};

/// Record-level operations the dispatcher needs from storage.
///
/// Mutating methods persist before returning. On a persist error the
/// in-memory change stays applied.
#[async_trait]
pub trait CollectionRepository: Send + Sync {
    async fn contains(&self, collection: &str) -> bool;
    async fn list(&self, collection: &str) -> Option<Vec<Record>>;
    async fn get(&self, collection: &str, id: i64) -> Option<Record>;
    /// Append, assigning `len + 1` as id when the record has none.
    async fn append(&self, collection: &str, record: Record) -> Result<Record, StoreError>;
    /// Replace the first record with `id`; `Ok(None)` when there is none.
    async fn replace(&self, collection: &str, id: i64, record: Record) -> Result<Option<Record>, StoreError>;
    /// Remove the first record with `id`; `Ok(None)` when there is none.
    async fn remove(&self, collection: &str, id: i64) -> Result<Option<Record>, StoreError>;
}

#[async_trait]
impl CollectionRepository for DocumentStore {
    async fn contains(&self, collection: &str) -> bool {
        self.read(|store| store.contains_key(collection)).await
    }

    async fn list(&self, collection: &str) -> Option<Vec<Record>> {
        self.read(|store| store.get(collection).cloned()).await
    }

    async fn get(&self, collection: &str, id: i64) -> Option<Record> {
        self.read(|store| {
            let records = store.get(collection)?;
            position(records, id).map(|idx| records[idx].clone())
        })
        .await
    }

    async fn append(&self, collection: &str, mut record: Record) -> Result<Record, StoreError> {
        self.mutate(|store| {
            let records = store.entry(collection.to_string()).or_default();
            assign_id_if_missing(&mut record, records.len());
            records.push(record.clone());
            record
        })
        .await
    }

    async fn replace(&self, collection: &str, id: i64, mut record: Record) -> Result<Option<Record>, StoreError> {
        self.update(|store| {
            let records = store.get_mut(collection)?;
            let idx = position(records, id)?;
            set_id(&mut record, id);
            records[idx] = record.clone();
            Some(record)
        })
        .await
    }

    async fn remove(&self, collection: &str, id: i64) -> Result<Option<Record>, StoreError> {
        self.update(|store| {
            let records = store.get_mut(collection)?;
            let idx = position(records, id)?;
            Some(records.remove(idx))
        })
        .await
    }
}
