use arbor_storage::ArborStorageError;
use tokio::sync::{Semaphore, SemaphorePermit, watch};

use crate::TreeError;

/// The lifecycle of a [`crate::Tree`]'s readiness gate.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Readiness {
    /// The root is still being looked up or created
    Initializing,
    /// The root exists; operations run immediately
    Ready,
    /// The root could not be established; the tree will never be ready
    Failed(ArborStorageError),
}

/// A one-way barrier that holds operations back until the root of a tree has
/// been established.
///
/// Operations that arrive while initializing wait in a FIFO queue (a fair
/// [`Semaphore`] that starts with no permits). Settling the gate releases a
/// single permit, so queued operations run one at a time in the order they
/// arrived. Operations arriving after the gate is ready skip the queue.
#[derive(Debug)]
pub(crate) struct Gate {
    state: watch::Sender<Readiness>,
    queue: Semaphore,
}

impl Gate {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(Readiness::Initializing);
        Self {
            state,
            queue: Semaphore::new(0),
        }
    }

    /// The current state of the gate
    pub(crate) fn readiness(&self) -> Readiness {
        self.state.borrow().clone()
    }

    /// Record the outcome of establishing the root and release anything
    /// waiting on it. Only the first call has any effect.
    pub(crate) fn settle(&self, outcome: Result<(), ArborStorageError>) {
        let settled = self.state.send_if_modified(|state| {
            if *state != Readiness::Initializing {
                return false;
            }
            *state = match &outcome {
                Ok(()) => Readiness::Ready,
                Err(error) => Readiness::Failed(error.clone()),
            };
            true
        });

        if !settled {
            return;
        }

        match outcome {
            Ok(()) => {
                tracing::debug!("Tree is ready, draining queued operations");
                self.queue.add_permits(1);
            }
            Err(error) => {
                tracing::warn!("Tree failed to initialize: {error}");
                self.queue.close();
            }
        }
    }

    /// Wait until the gate has settled, returning the failure if
    /// initialization did not succeed
    pub(crate) async fn ready(&self) -> Result<(), TreeError> {
        let mut receiver = self.state.subscribe();
        let readiness = receiver
            .wait_for(|state| *state != Readiness::Initializing)
            .await
            .map(|state| state.clone())
            .map_err(|error| {
                TreeError::Initialization(ArborStorageError::StorageBackend(format!("{error}")))
            })?;

        match readiness {
            Readiness::Failed(error) => Err(TreeError::Initialization(error)),
            _ => Ok(()),
        }
    }

    /// Pass through the gate. Returns `None` when the gate is already open;
    /// otherwise waits for this caller's turn in the queue and returns the
    /// permit that must be held for the whole of the operation.
    pub(crate) async fn enter(&self) -> Result<Option<SemaphorePermit<'_>>, TreeError> {
        match self.readiness() {
            Readiness::Ready => return Ok(None),
            Readiness::Failed(error) => return Err(TreeError::Initialization(error)),
            Readiness::Initializing => (),
        }

        match self.queue.acquire().await {
            Ok(permit) => Ok(Some(permit)),
            Err(_) => match self.readiness() {
                Readiness::Failed(error) => Err(TreeError::Initialization(error)),
                _ => Err(TreeError::Initialization(ArborStorageError::StorageBackend(
                    "Readiness queue closed".into(),
                ))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use arbor_storage::ArborStorageError;
    use tokio::sync::Mutex;

    use super::{Gate, Readiness};
    use crate::TreeError;

    #[tokio::test]
    async fn it_lets_operations_through_once_ready() -> Result<()> {
        let gate = Gate::new();
        gate.settle(Ok(()));

        assert_eq!(gate.readiness(), Readiness::Ready);
        assert!(gate.enter().await?.is_none());
        gate.ready().await?;

        Ok(())
    }

    #[tokio::test]
    async fn it_releases_queued_operations_in_arrival_order() -> Result<()> {
        let gate = Arc::new(Gate::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..5 {
            let gate = gate.clone();
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                let _permit = gate.enter().await?;
                order.lock().await.push(i);
                Ok::<_, TreeError>(())
            }));
            // Give each waiter a chance to join the queue before the next
            tokio::task::yield_now().await;
        }

        assert!(order.lock().await.is_empty());

        gate.settle(Ok(()));

        for handle in handles {
            handle.await??;
        }

        assert_eq!(*order.lock().await, vec![0, 1, 2, 3, 4]);

        Ok(())
    }

    #[tokio::test]
    async fn it_fails_every_waiter_when_initialization_fails() -> Result<()> {
        let gate = Arc::new(Gate::new());
        let failure = ArborStorageError::StorageBackend("disk on fire".into());

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.enter().await.map(|_| ()) })
        };
        tokio::task::yield_now().await;

        gate.settle(Err(failure.clone()));

        assert_eq!(
            waiter.await?,
            Err(TreeError::Initialization(failure.clone()))
        );
        assert_eq!(
            gate.enter().await.map(|_| ()),
            Err(TreeError::Initialization(failure.clone()))
        );
        assert_eq!(gate.ready().await, Err(TreeError::Initialization(failure)));

        Ok(())
    }

    #[tokio::test]
    async fn it_settles_only_once() -> Result<()> {
        let gate = Gate::new();

        gate.settle(Ok(()));
        gate.settle(Err(ArborStorageError::StorageBackend("late".into())));

        assert_eq!(gate.readiness(), Readiness::Ready);
        gate.ready().await?;

        Ok(())
    }
}
