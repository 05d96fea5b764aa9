use std::{collections::BTreeSet, sync::Arc};

use arbor_storage::{ArborStorageError, Batch, Encoder, JsonEncoder, StorageBackend};
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, MutexGuard, SemaphorePermit};

use crate::{
    Node, NodeData, NodeId, TreeConfig, TreeError,
    gate::{Gate, Readiness},
};

/// A hierarchy of nodes persisted on an ordered key-value [`StorageBackend`].
///
/// Every node has an ordered sequence of children, an opaque [`NodeData`] map
/// and (except for the root) a back-reference to its parent. Structural
/// changes are committed as a single atomic [`Batch`], so a reader never
/// observes half of an insert, delete or move.
///
/// A [`Tree`] is cheap to clone; clones share the same storage, readiness
/// gate and mutation lock.
///
/// When constructed, a [`Tree`] establishes its root node in the background.
/// Operations requested before that completes wait in arrival order and then
/// run one at a time; see [`Tree::ready`].
#[derive(Clone)]
pub struct Tree<Backend, Codec = JsonEncoder>
where
    Backend: StorageBackend<Key = String, Value = Vec<u8>>,
    Codec: Encoder,
{
    storage: Backend,
    encoder: Codec,
    root: NodeId,
    config: Arc<TreeConfig>,
    gate: Arc<Gate>,
    mutations: Arc<Mutex<()>>,
}

impl<Backend> Tree<Backend, JsonEncoder>
where
    Backend: StorageBackend<Key = String, Value = Vec<u8>> + Send + Sync + 'static,
{
    /// Create a [`Tree`] over the provided storage, storing values as JSON.
    ///
    /// The root is looked up (and created if absent) on a background task, so
    /// this must be called from within a tokio runtime.
    pub fn new(storage: Backend, config: TreeConfig) -> Self {
        Self::with_encoder(storage, JsonEncoder, config)
    }

    /// Create a [`Tree`] over the provided storage and wait until its root has
    /// been established
    pub async fn open(storage: Backend, config: TreeConfig) -> Result<Self, TreeError> {
        let tree = Self::new(storage, config);
        tree.ready().await?;
        Ok(tree)
    }
}

impl<Backend, Codec> Tree<Backend, Codec>
where
    Backend: StorageBackend<Key = String, Value = Vec<u8>> + Send + Sync + 'static,
    Codec: Encoder + 'static,
{
    /// Create a [`Tree`] over the provided storage, storing values with the
    /// provided [`Encoder`]. Must be called from within a tokio runtime.
    pub fn with_encoder(storage: Backend, encoder: Codec, config: TreeConfig) -> Self {
        let tree = Self {
            storage,
            encoder,
            root: NodeId::root(&config.tree_id),
            config: Arc::new(config),
            gate: Arc::new(Gate::new()),
            mutations: Arc::new(Mutex::new(())),
        };

        let establishing = tree.clone();
        tokio::spawn(async move {
            let outcome = establishing.establish_root().await;
            establishing.gate.settle(outcome);
        });

        tree
    }

    /// The namespace of every key this tree writes
    pub fn tree_id(&self) -> &str {
        &self.config.tree_id
    }

    /// The identifier of the root node. It is derived from the tree id alone,
    /// so it is available before the tree is ready.
    pub fn root_id(&self) -> &NodeId {
        &self.root
    }

    /// True once the root has been established
    pub fn is_ready(&self) -> bool {
        self.gate.readiness() == Readiness::Ready
    }

    /// Resolves once the root has been established, or with
    /// [`TreeError::Initialization`] if it could not be. Every other operation
    /// waits for this implicitly.
    pub async fn ready(&self) -> Result<(), TreeError> {
        self.gate.ready().await
    }

    /// The children of the node `id`, in order
    pub async fn get_node(&self, id: &NodeId) -> Result<Vec<NodeId>, TreeError> {
        let _permit = self.enter().await?;
        self.require_children(id).await
    }

    /// The children of the root, in order
    pub async fn get_root(&self) -> Result<Vec<NodeId>, TreeError> {
        let _permit = self.enter().await?;
        self.require_children(&self.root).await
    }

    /// The data of the node `id`; an empty map if none has been stored
    pub async fn get_node_data(&self, id: &NodeId) -> Result<NodeData, TreeError> {
        let _permit = self.enter().await?;
        self.read_data(id).await
    }

    /// Replace the data of the node `id`
    pub async fn set_node_data(&self, id: &NodeId, data: NodeData) -> Result<(), TreeError> {
        let _permit = self.enter().await?;
        let mut storage = self.storage.clone();
        storage
            .set(id.data_key(), self.encoder.encode(&data)?)
            .await
            .map_err(Into::<ArborStorageError>::into)?;
        Ok(())
    }

    /// Remove the data of the node `id`, so that it reads back empty
    pub async fn delete_node_data(&self, id: &NodeId) -> Result<(), TreeError> {
        let _permit = self.enter().await?;
        let mut storage = self.storage.clone();
        storage
            .delete(&id.data_key())
            .await
            .map_err(Into::<ArborStorageError>::into)?;
        Ok(())
    }

    /// The children and data of the node `id`
    pub async fn get_node_and_data(&self, id: &NodeId) -> Result<Node, TreeError> {
        let _permit = self.enter().await?;
        let children = self.require_children(id).await?;
        let data = self.read_data(id).await?;
        Ok(Node {
            id: id.clone(),
            children,
            data,
        })
    }

    /// The parent of the node `id`, or `None` for the root. Fails with
    /// [`TreeError::NodeNotFound`] if `id` is not a live node.
    pub async fn get_node_parent(&self, id: &NodeId) -> Result<Option<NodeId>, TreeError> {
        let _permit = self.enter().await?;
        self.require_children(id).await?;
        self.read(id.parent_key()).await
    }

    /// Add a new node holding `data` as the last child of `parent`, returning
    /// the new node's identifier
    pub async fn insert_node(&self, parent: &NodeId, data: NodeData) -> Result<NodeId, TreeError> {
        let _permit = self.enter().await?;
        let _guard = self.lock_mutations().await;

        let id = NodeId::mint(&self.config.tree_id);
        let mut siblings = self.require_children(parent).await?;
        siblings.push(id.clone());

        let batch = Batch::default()
            .put(parent.children_key(), self.encoder.encode(&siblings)?)
            .put(id.children_key(), self.encoder.encode(&Vec::<NodeId>::new())?)
            .put(id.data_key(), self.encoder.encode(&data)?)
            .put(id.parent_key(), self.encoder.encode(parent)?);

        self.commit(batch).await?;
        tracing::debug!("Inserted {id} under {parent}");

        Ok(id)
    }

    /// Remove the node `id` and its entire subtree, detaching it from its
    /// parent. The root cannot be deleted.
    pub async fn delete_node(&self, id: &NodeId) -> Result<(), TreeError> {
        let _permit = self.enter().await?;
        let _guard = self.lock_mutations().await;

        if *id == self.root {
            return Err(TreeError::InvalidDelete(format!(
                "{id} is the root of the tree"
            )));
        }

        let subtree = self.collect_subtree(id).await?;
        let parent = self.require_parent(id).await?;

        let mut siblings = self.require_children(&parent).await?;
        siblings.retain(|sibling| sibling != id);

        let mut batch = Batch::default();
        for node in &subtree {
            batch = batch.delete(node.children_key());
            if self.config.reclaim_orphans {
                batch = batch.delete(node.data_key()).delete(node.parent_key());
            }
        }
        let batch = batch.put(parent.children_key(), self.encoder.encode(&siblings)?);

        self.commit(batch).await?;
        tracing::debug!(
            "Deleted {id} and {} descendants from {parent}",
            subtree.len().saturating_sub(1)
        );

        Ok(())
    }

    /// Detach the node `id` (with its subtree) from its parent and append it
    /// to the children of `new_parent`.
    ///
    /// Moving the root, or moving a node beneath itself, fails with
    /// [`TreeError::InvalidMove`]. Moving a node to its current parent moves
    /// it to the end of that parent's children.
    pub async fn move_node(&self, id: &NodeId, new_parent: &NodeId) -> Result<(), TreeError> {
        let _permit = self.enter().await?;
        let _guard = self.lock_mutations().await;

        if *id == self.root {
            return Err(TreeError::InvalidMove(format!("{id} is the root of the tree")));
        }

        self.require_children(id).await?;
        let mut new_siblings = self.require_children(new_parent).await?;

        let mut seen = BTreeSet::new();
        let mut ancestor = Some(new_parent.clone());
        while let Some(current) = ancestor {
            if current == *id {
                return Err(TreeError::InvalidMove(format!(
                    "{new_parent} is within the subtree of {id}"
                )));
            }
            if !seen.insert(current.clone()) {
                tracing::warn!("Parent references of {new_parent} loop back to {current}");
                return Err(TreeError::ParentCycle(current));
            }
            ancestor = self.read(current.parent_key()).await?;
        }

        let old_parent = self.require_parent(id).await?;

        let batch = if old_parent == *new_parent {
            new_siblings.retain(|sibling| sibling != id);
            new_siblings.push(id.clone());
            Batch::default().put(new_parent.children_key(), self.encoder.encode(&new_siblings)?)
        } else {
            let mut old_siblings = self.require_children(&old_parent).await?;
            old_siblings.retain(|sibling| sibling != id);
            new_siblings.push(id.clone());
            Batch::default()
                .put(old_parent.children_key(), self.encoder.encode(&old_siblings)?)
                .put(new_parent.children_key(), self.encoder.encode(&new_siblings)?)
        };
        let batch = batch.put(id.parent_key(), self.encoder.encode(new_parent)?);

        self.commit(batch).await?;
        tracing::debug!("Moved {id} from {old_parent} to {new_parent}");

        Ok(())
    }

    /// Pass the readiness gate. The returned permit (if any) must be held for
    /// the remainder of the operation.
    pub(crate) async fn enter(&self) -> Result<Option<SemaphorePermit<'_>>, TreeError> {
        self.gate.enter().await
    }

    /// The children of `id`, or `None` if `id` is not a live node
    pub(crate) async fn read_children(&self, id: &NodeId) -> Result<Option<Vec<NodeId>>, TreeError> {
        self.read(id.children_key()).await
    }

    pub(crate) async fn read_data(&self, id: &NodeId) -> Result<NodeData, TreeError> {
        Ok(self.read(id.data_key()).await?.unwrap_or_default())
    }

    async fn require_children(&self, id: &NodeId) -> Result<Vec<NodeId>, TreeError> {
        self.read_children(id)
            .await?
            .ok_or_else(|| TreeError::NodeNotFound(id.clone()))
    }

    async fn require_parent(&self, id: &NodeId) -> Result<NodeId, TreeError> {
        self.read(id.parent_key())
            .await?
            .ok_or_else(|| TreeError::MissingParent(id.clone()))
    }

    async fn read<T>(&self, key: String) -> Result<Option<T>, TreeError>
    where
        T: DeserializeOwned,
    {
        tracing::trace!("Reading {key}");
        match self
            .storage
            .get(&key)
            .await
            .map_err(Into::<ArborStorageError>::into)?
        {
            Some(bytes) => Ok(Some(self.encoder.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn commit(&self, batch: Batch<String, Vec<u8>>) -> Result<(), TreeError> {
        tracing::trace!("Committing a batch of {} operations", batch.len());
        let mut storage = self.storage.clone();
        storage
            .write(batch)
            .await
            .map_err(Into::<ArborStorageError>::into)?;
        Ok(())
    }

    async fn lock_mutations(&self) -> Option<MutexGuard<'_, ()>> {
        if self.config.serialize_mutations {
            Some(self.mutations.lock().await)
        } else {
            None
        }
    }

    async fn establish_root(&self) -> Result<(), ArborStorageError> {
        let key = self.root.children_key();

        if self
            .storage
            .get(&key)
            .await
            .map_err(Into::<ArborStorageError>::into)?
            .is_some()
        {
            tracing::debug!("Found existing root {}", self.root);
            return Ok(());
        }

        let empty = self.encoder.encode(&Vec::<NodeId>::new())?;
        let mut storage = self.storage.clone();
        storage
            .set(key, empty)
            .await
            .map_err(Into::<ArborStorageError>::into)?;
        tracing::debug!("Created root {}", self.root);

        Ok(())
    }
}

impl<Backend, Codec> std::fmt::Debug for Tree<Backend, Codec>
where
    Backend: StorageBackend<Key = String, Value = Vec<u8>>,
    Codec: Encoder,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("readiness", &self.gate.readiness())
            .finish()
    }
}
