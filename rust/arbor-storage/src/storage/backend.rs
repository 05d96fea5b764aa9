use async_trait::async_trait;

use crate::{ArborStorageError, Batch};

mod memory;
pub use memory::*;

mod fs;
pub use fs::*;

/// A [StorageBackend] is a facade over some ordered key-value substrate that
/// is capable of storing, retrieving and removing values by key, and of
/// committing a [Batch] of such writes atomically
#[async_trait]
pub trait StorageBackend: Clone {
    /// The key type used by this [StorageBackend]
    type Key: Send + Sync;
    /// The value type able to be stored by this [StorageBackend]
    type Value: Send;
    /// The error type produced by this [StorageBackend]
    type Error: Into<ArborStorageError>;

    /// Store the given value against the given key
    async fn set(&mut self, key: Self::Key, value: Self::Value) -> Result<(), Self::Error>;
    /// Retrieve a value (if any) stored against the given key
    async fn get(&self, key: &Self::Key) -> Result<Option<Self::Value>, Self::Error>;
    /// Remove the value (if any) stored against the given key
    async fn delete(&mut self, key: &Self::Key) -> Result<(), Self::Error>;
    /// Commit every operation in the [Batch] so that all or none of them
    /// become visible
    async fn write(&mut self, batch: Batch<Self::Key, Self::Value>) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use crate::{
        Batch, MeasuredStorageBackend, MemoryStorageBackend, StorageBackend, TapOperation,
        TappedStorage, make_target_storage,
    };

    #[tokio::test]
    async fn it_writes_and_reads_a_value() -> Result<()> {
        let (mut storage_backend, _tempdir) = make_target_storage::<String, Vec<u8>>().await?;

        storage_backend.set("one".into(), vec![4, 5, 6]).await?;
        let value = storage_backend.get(&"one".into()).await?;

        assert_eq!(value, Some(vec![4, 5, 6]));

        Ok(())
    }

    #[tokio::test]
    async fn it_reports_missing_keys_as_none() -> Result<()> {
        let (storage_backend, _tempdir) = make_target_storage::<String, Vec<u8>>().await?;

        assert_eq!(storage_backend.get(&"missing".into()).await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn it_deletes_values_and_tolerates_missing_keys() -> Result<()> {
        let (mut storage_backend, _tempdir) = make_target_storage::<String, Vec<u8>>().await?;

        storage_backend.set("one".into(), vec![1]).await?;
        storage_backend.delete(&"one".into()).await?;
        storage_backend.delete(&"never-written".into()).await?;

        assert_eq!(storage_backend.get(&"one".into()).await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn it_commits_a_batch() -> Result<()> {
        let (mut storage_backend, _tempdir) = make_target_storage::<String, Vec<u8>>().await?;

        storage_backend.set("stale".into(), vec![0]).await?;
        storage_backend
            .write(
                Batch::default()
                    .put("one".into(), vec![1])
                    .put("two".into(), vec![2])
                    .delete("stale".into()),
            )
            .await?;

        assert_eq!(storage_backend.get(&"one".into()).await?, Some(vec![1]));
        assert_eq!(storage_backend.get(&"two".into()).await?, Some(vec![2]));
        assert_eq!(storage_backend.get(&"stale".into()).await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn it_can_measure_a_backend() -> Result<()> {
        let mut storage_backend =
            MeasuredStorageBackend::new(MemoryStorageBackend::<String, Vec<u8>>::default());

        storage_backend.set("one".into(), vec![1]).await?;
        storage_backend.get(&"one".into()).await?;
        storage_backend.get(&"two".into()).await?;
        storage_backend.delete(&"one".into()).await?;
        storage_backend
            .write(Batch::default().put("two".into(), vec![2]))
            .await?;

        assert_eq!(storage_backend.reads(), 2);
        assert_eq!(storage_backend.writes(), 1);
        assert_eq!(storage_backend.deletes(), 1);
        assert_eq!(storage_backend.batches(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn it_can_tap_mutations() -> Result<()> {
        let mut storage_backend =
            TappedStorage::new(MemoryStorageBackend::<String, Vec<u8>>::default());
        let mut rx = storage_backend.tap()?;

        storage_backend.set("one".into(), vec![1]).await?;
        storage_backend.get(&"one".into()).await?;
        storage_backend
            .write(Batch::default().delete("one".into()))
            .await?;

        assert!(matches!(
            rx.recv().await,
            Some(TapOperation::Set((key, value))) if key == "one" && value == vec![1]
        ));
        assert!(matches!(rx.recv().await, Some(TapOperation::Get(key)) if key == "one"));
        assert!(matches!(
            rx.recv().await,
            Some(TapOperation::Write(batch)) if batch.len() == 1
        ));

        storage_backend.untap()?;
        assert!(storage_backend.untap().is_err());

        Ok(())
    }
}
