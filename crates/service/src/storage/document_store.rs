use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, sync::RwLock};
use tracing::debug;

use crate::errors::StoreError;
use crate::record::{record_id, Record};

/// Collection name to its records. Keys are sorted; records keep insertion order.
pub type Store = BTreeMap<String, Vec<Record>>;

/// Read and decode the document at `path`.
///
/// A missing file is an error: the server never starts from an empty store.
pub async fn load(path: &Path) -> Result<Store, StoreError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound { path: path.to_path_buf() })
        }
        Err(source) => return Err(StoreError::Read { path: path.to_path_buf(), source }),
    };
    serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse { path: path.to_path_buf(), source })
}

/// Write the whole store to `path`.
///
/// Goes through `<path>.tmp` and a rename so readers never see half a file.
pub async fn persist(store: &Store, path: &Path) -> Result<(), StoreError> {
    let data = serde_json::to_vec_pretty(store)?;
    let tmp = tmp_path(path);
    let write_err = |source: io::Error| StoreError::Write { path: path.to_path_buf(), source };
    fs::write(&tmp, &data).await.map_err(write_err)?;
    if let Err(source) = fs::rename(&tmp, path).await {
        fs::remove_file(&tmp).await.ok();
        return Err(write_err(source));
    }
    debug!(path = %path.display(), bytes = data.len(), "store persisted");
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Position of the first record in `collection` whose id equals `id`.
pub fn find_index(store: &Store, collection: &str, id: i64) -> Option<usize> {
    store.get(collection).and_then(|records| position(records, id))
}

pub(crate) fn position(records: &[Record], id: i64) -> Option<usize> {
    records.iter().position(|r| record_id(r) == Some(id))
}

/// The in-memory store plus the file it is mirrored to.
///
/// Readers share the lock. A mutation keeps the write lock until its persist
/// has finished, so writes and file snapshots are totally ordered.
pub struct DocumentStore {
    inner: RwLock<Store>,
    file_path: PathBuf,
}

impl DocumentStore {
    /// Load the store from `path`; fails if the file is missing or malformed.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, StoreError> {
        let file_path = path.into();
        let store = load(&file_path).await?;
        debug!(path = %file_path.display(), collections = store.len(), "store loaded");
        Ok(Arc::new(Self::with_store(store, file_path)))
    }

    /// Wrap an already decoded store; nothing is read or written.
    pub fn with_store<P: Into<PathBuf>>(store: Store, path: P) -> Self {
        Self { inner: RwLock::new(store), file_path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Clone of the whole store.
    pub async fn snapshot(&self) -> Store {
        self.inner.read().await.clone()
    }

    /// Run `f` against the store under the read lock.
    pub async fn read<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&Store) -> T,
    {
        let store = self.inner.read().await;
        f(&store)
    }

    /// Apply `f` under the write lock, then persist unconditionally.
    ///
    /// A failed persist is returned as an error but the change is not undone.
    pub async fn mutate<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Store) -> T,
    {
        let mut store = self.inner.write().await;
        let out = f(&mut store);
        persist(&store, &self.file_path).await?;
        Ok(out)
    }

    /// Apply `f` under the write lock and persist if it reports a change.
    ///
    /// `f` returning `None` means nothing changed and nothing is written. A
    /// failed persist is returned as an error but the change is not undone.
    pub async fn update<T, F>(&self, f: F) -> Result<Option<T>, StoreError>
    where
        F: FnOnce(&mut Store) -> Option<T>,
    {
        let mut store = self.inner.write().await;
        let Some(out) = f(&mut store) else { return Ok(None) };
        persist(&store, &self.file_path).await?;
        Ok(Some(out))
    }
}
