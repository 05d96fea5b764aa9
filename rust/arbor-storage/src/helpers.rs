use std::{
    collections::BTreeSet,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;

use crate::{ArborStorageError, Batch, FileSystemStorageBackend, StorageBackend};

type MakeTargetStorageOutput<K, V> = (FileSystemStorageBackend<K, V>, tempfile::TempDir);

/// Creates a persisted [`StorageBackend`] in a fresh temporary directory, for
/// use in tests. The directory is removed when the returned guard drops.
pub async fn make_target_storage<K, V>() -> Result<MakeTargetStorageOutput<K, V>>
where
    K: Ord + Clone + Serialize + DeserializeOwned,
    V: Clone + Serialize + DeserializeOwned,
{
    let root = tempfile::tempdir()?;
    let storage = FileSystemStorageBackend::<K, V>::new(root.path()).await?;
    Ok((storage, root))
}

/// A [`StorageBackend`] proxy that injects failures, for exercising error
/// paths in tests.
///
/// Reads of any key registered with [`FailingStorageBackend::fail_reads_of`]
/// fail, and every mutation fails while [`FailingStorageBackend::fail_writes`]
/// is switched on. Failures never reach the wrapped backend.
#[derive(Clone)]
pub struct FailingStorageBackend<Backend>
where
    Backend: StorageBackend,
{
    backend: Backend,
    failing_reads: Arc<RwLock<BTreeSet<Backend::Key>>>,
    failing_writes: Arc<AtomicBool>,
}

impl<Backend> FailingStorageBackend<Backend>
where
    Backend: StorageBackend,
    Backend::Key: Ord + Clone,
{
    /// Wrap the provided [`StorageBackend`]; nothing fails until configured
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            failing_reads: Arc::new(RwLock::new(BTreeSet::new())),
            failing_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every subsequent read of `key` fail
    pub async fn fail_reads_of(&self, key: Backend::Key) {
        self.failing_reads.write().await.insert(key);
    }

    /// Switch failing mutations on or off
    pub fn fail_writes(&self, fail: bool) {
        self.failing_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writes(&self) -> Result<(), ArborStorageError> {
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(ArborStorageError::StorageBackend(
                "Injected write failure".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl<Backend> StorageBackend for FailingStorageBackend<Backend>
where
    Backend: StorageBackend + Send + Sync,
    Backend::Key: Ord + Clone,
    ArborStorageError: From<Backend::Error>,
{
    type Key = Backend::Key;
    type Value = Backend::Value;
    type Error = ArborStorageError;

    async fn set(&mut self, key: Self::Key, value: Self::Value) -> Result<(), Self::Error> {
        self.check_writes()?;
        Ok(self.backend.set(key, value).await?)
    }

    async fn get(&self, key: &Self::Key) -> Result<Option<Self::Value>, Self::Error> {
        if self.failing_reads.read().await.contains(key) {
            return Err(ArborStorageError::StorageBackend(
                "Injected read failure".into(),
            ));
        }
        Ok(self.backend.get(key).await?)
    }

    async fn delete(&mut self, key: &Self::Key) -> Result<(), Self::Error> {
        self.check_writes()?;
        Ok(self.backend.delete(key).await?)
    }

    async fn write(&mut self, batch: Batch<Self::Key, Self::Value>) -> Result<(), Self::Error> {
        self.check_writes()?;
        Ok(self.backend.write(batch).await?)
    }
}
