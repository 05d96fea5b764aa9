use async_trait::async_trait;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::{ArborStorageError, Batch};

use super::StorageBackend;

/// An operation observed by a [TappedStorage]
#[derive(Debug, Clone)]
pub enum TapOperation<Key, Value> {
    /// A single-key write
    Set((Key, Value)),
    /// A read that found a value
    Get(Key),
    /// A single-key delete
    Delete(Key),
    /// A committed [Batch]
    Write(Batch<Key, Value>),
}

/// A proxy over a [StorageBackend] that reports every successful operation to
/// a channel, so that a collaborator can observe changes as they land.
#[derive(Clone)]
pub struct TappedStorage<Backend>
where
    Backend: StorageBackend,
{
    backend: Backend,
    tx: Option<UnboundedSender<TapOperation<Backend::Key, Backend::Value>>>,
}

impl<Backend> TappedStorage<Backend>
where
    Backend: StorageBackend,
{
    /// Wrap the provided [StorageBackend]; nothing is reported until
    /// [TappedStorage::tap] is called.
    pub fn new(backend: Backend) -> Self {
        Self { backend, tx: None }
    }

    /// Start reporting operations, returning the receiving end
    pub fn tap(
        &mut self,
    ) -> Result<UnboundedReceiver<TapOperation<Backend::Key, Backend::Value>>, ArborStorageError>
    {
        if self.tx.is_some() {
            return Err(ArborStorageError::StorageBackend(
                "Attempt to tap already-tapped storage".into(),
            ));
        }

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        self.tx = Some(tx);

        Ok(rx)
    }

    /// Stop reporting operations
    pub fn untap(&mut self) -> Result<(), ArborStorageError> {
        if self.tx.is_none() {
            return Err(ArborStorageError::StorageBackend(
                "Attempt to untap already-untapped storage".into(),
            ));
        }

        self.tx = None;
        Ok(())
    }

    fn report(&self, operation: TapOperation<Backend::Key, Backend::Value>) {
        if let Some(tx) = &self.tx {
            // A dropped receiver only means nobody is listening
            let _ = tx.send(operation);
        }
    }
}

#[async_trait]
impl<Backend> StorageBackend for TappedStorage<Backend>
where
    Backend: StorageBackend + Send + Sync,
    Backend::Key: Clone,
    Backend::Value: Clone + Sync,
    ArborStorageError: From<Backend::Error>,
{
    type Key = Backend::Key;
    type Value = Backend::Value;
    type Error = ArborStorageError;

    async fn set(&mut self, key: Self::Key, value: Self::Value) -> Result<(), Self::Error> {
        self.backend.set(key.clone(), value.clone()).await?;
        self.report(TapOperation::Set((key, value)));
        Ok(())
    }

    async fn get(&self, key: &Self::Key) -> Result<Option<Self::Value>, Self::Error> {
        let value = self.backend.get(key).await?;

        if value.is_some() {
            self.report(TapOperation::Get(key.clone()));
        }

        Ok(value)
    }

    async fn delete(&mut self, key: &Self::Key) -> Result<(), Self::Error> {
        self.backend.delete(key).await?;
        self.report(TapOperation::Delete(key.clone()));
        Ok(())
    }

    async fn write(&mut self, batch: Batch<Self::Key, Self::Value>) -> Result<(), Self::Error> {
        self.backend.write(batch.clone()).await?;
        self.report(TapOperation::Write(batch));
        Ok(())
    }
}
