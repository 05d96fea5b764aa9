use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{ArborStorageError, Batch};

use super::StorageBackend;

/// A trivial implementation of [StorageBackend] - backed by a [BTreeMap] - where
/// all values are kept in memory and never persisted.
///
/// Clones share the same entries. A [Batch] is applied while holding the write
/// lock, so readers never observe part of one.
#[derive(Clone, Default)]
pub struct MemoryStorageBackend<Key, Value>
where
    Key: Ord,
    Value: Clone,
{
    entries: Arc<RwLock<BTreeMap<Key, Value>>>,
}

impl<Key, Value> MemoryStorageBackend<Key, Value>
where
    Key: Ord + Clone,
    Value: Clone,
{
    /// A sorted snapshot of every key currently stored
    pub async fn keys(&self) -> Vec<Key> {
        self.entries.read().await.keys().cloned().collect()
    }

    /// The number of entries currently stored
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// True if nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl<Key, Value> StorageBackend for MemoryStorageBackend<Key, Value>
where
    Key: Clone + Ord + Send + Sync,
    Value: Clone + Send + Sync,
{
    type Key = Key;
    type Value = Value;
    type Error = ArborStorageError;

    async fn set(&mut self, key: Self::Key, value: Self::Value) -> Result<(), Self::Error> {
        let mut entries = self.entries.write().await;
        entries.insert(key, value);
        Ok(())
    }

    async fn get(&self, key: &Self::Key) -> Result<Option<Self::Value>, Self::Error> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn delete(&mut self, key: &Self::Key) -> Result<(), Self::Error> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }

    async fn write(&mut self, batch: Batch<Self::Key, Self::Value>) -> Result<(), Self::Error> {
        let mut entries = self.entries.write().await;
        batch.apply_to(&mut entries);
        Ok(())
    }
}
