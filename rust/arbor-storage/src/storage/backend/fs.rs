use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;

use crate::{ArborStorageError, Batch, CborEncoder, Encoder};

use super::StorageBackend;

const SNAPSHOT_FILE: &str = "snapshot.cbor";
const SNAPSHOT_STAGING_FILE: &str = "snapshot.cbor.staging";

/// A file-system-based [StorageBackend]. All entries are kept in an ordered
/// map that is persisted as a single snapshot file inside a root directory.
///
/// Every mutation stages a complete snapshot next to the live one and renames
/// it into place, so a [Batch] is either fully on disk or not at all.
///
/// Every write, including a single `set` or `delete`, re-encodes and rewrites
/// the whole snapshot, so its cost grows with the number of entries. Suited to
/// tests and small trees.
#[derive(Clone)]
pub struct FileSystemStorageBackend<Key, Value>
where
    Key: Ord,
{
    root_dir: PathBuf,
    entries: Arc<RwLock<BTreeMap<Key, Value>>>,
}

impl<Key, Value> FileSystemStorageBackend<Key, Value>
where
    Key: Ord + Clone + Serialize + DeserializeOwned,
    Value: Clone + Serialize + DeserializeOwned,
{
    /// Creates a new [`FileSystemStorageBackend`] that persists its entries
    /// in `root_dir`, loading any snapshot a previous instance left there.
    pub async fn new<Pathlike>(root_dir: Pathlike) -> Result<Self, ArborStorageError>
    where
        Pathlike: AsRef<Path>,
    {
        let root_dir = root_dir.as_ref().to_owned();
        tokio::fs::create_dir_all(&root_dir).await?;

        let snapshot = root_dir.join(SNAPSHOT_FILE);
        let entries = if tokio::fs::try_exists(&snapshot).await? {
            let bytes = tokio::fs::read(&snapshot).await?;
            let pairs: Vec<(Key, Value)> = CborEncoder.decode(&bytes)?;
            pairs.into_iter().collect()
        } else {
            BTreeMap::new()
        };

        tracing::debug!(
            "Opened file system storage at {} with {} entries",
            root_dir.display(),
            entries.len()
        );

        Ok(Self {
            root_dir,
            entries: Arc::new(RwLock::new(entries)),
        })
    }

    /// The directory holding the snapshot
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    async fn persist(&self, entries: &BTreeMap<Key, Value>) -> Result<(), ArborStorageError> {
        let pairs: Vec<(&Key, &Value)> = entries.iter().collect();
        let bytes = CborEncoder.encode(&pairs)?;
        let staging = self.root_dir.join(SNAPSHOT_STAGING_FILE);

        tokio::fs::write(&staging, bytes).await?;
        tokio::fs::rename(&staging, self.root_dir.join(SNAPSHOT_FILE)).await?;

        Ok(())
    }

    async fn commit(&self, batch: Batch<Key, Value>) -> Result<(), ArborStorageError> {
        let mut entries = self.entries.write().await;
        let mut next = entries.clone();
        batch.apply_to(&mut next);

        self.persist(&next).await?;
        *entries = next;

        Ok(())
    }
}

#[async_trait]
impl<Key, Value> StorageBackend for FileSystemStorageBackend<Key, Value>
where
    Key: Ord + Clone + Serialize + DeserializeOwned + Send + Sync,
    Value: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    type Key = Key;
    type Value = Value;
    type Error = ArborStorageError;

    async fn set(&mut self, key: Self::Key, value: Self::Value) -> Result<(), Self::Error> {
        self.commit(Batch::default().put(key, value)).await
    }

    async fn get(&self, key: &Self::Key) -> Result<Option<Self::Value>, Self::Error> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn delete(&mut self, key: &Self::Key) -> Result<(), Self::Error> {
        self.commit(Batch::default().delete(key.clone())).await
    }

    async fn write(&mut self, batch: Batch<Self::Key, Self::Value>) -> Result<(), Self::Error> {
        self.commit(batch).await
    }
}
