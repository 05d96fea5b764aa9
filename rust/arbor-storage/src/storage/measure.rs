use async_trait::async_trait;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use crate::Batch;

use super::StorageBackend;

/// A [MeasuredStorageBackend] acts as a proxy over a [StorageBackend]
/// implementation that counts the round-trips made to it.
#[derive(Clone)]
pub struct MeasuredStorageBackend<Backend>
where
    Backend: StorageBackend,
{
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
    deletes: Arc<AtomicUsize>,
    batches: Arc<AtomicUsize>,
    backend: Backend,
}

impl<Backend> MeasuredStorageBackend<Backend>
where
    Backend: StorageBackend,
{
    /// Wrap the provided [StorageBackend] so that round-trips to it may be
    /// measured.
    pub fn new(backend: Backend) -> Self {
        Self {
            reads: Arc::new(AtomicUsize::default()),
            writes: Arc::new(AtomicUsize::default()),
            deletes: Arc::new(AtomicUsize::default()),
            batches: Arc::new(AtomicUsize::default()),
            backend,
        }
    }

    /// The aggregate number of reads from the wrapped [StorageBackend]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// The aggregate number of single-key writes to the wrapped [StorageBackend]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// The aggregate number of single-key deletes from the wrapped [StorageBackend]
    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::Relaxed)
    }

    /// The aggregate number of [Batch] commits to the wrapped [StorageBackend]
    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl<Backend> StorageBackend for MeasuredStorageBackend<Backend>
where
    Backend: StorageBackend + Send + Sync,
{
    type Key = Backend::Key;
    type Value = Backend::Value;
    type Error = Backend::Error;

    async fn set(&mut self, key: Self::Key, value: Self::Value) -> Result<(), Self::Error> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.backend.set(key, value).await
    }

    async fn get(&self, key: &Self::Key) -> Result<Option<Self::Value>, Self::Error> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.backend.get(key).await
    }

    async fn delete(&mut self, key: &Self::Key) -> Result<(), Self::Error> {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        self.backend.delete(key).await
    }

    async fn write(&mut self, batch: Batch<Self::Key, Self::Value>) -> Result<(), Self::Error> {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.backend.write(batch).await
    }
}
