use arbor_storage::ArborStorageError;
use thiserror::Error;

use crate::NodeId;

/// The common error type used by this crate
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    /// There was a problem when accessing storage
    #[error("Storage error: {0}")]
    Storage(ArborStorageError),

    /// The root could not be established, so the tree never became ready
    #[error("Tree failed to initialize: {0}")]
    Initialization(ArborStorageError),

    /// A node has no children entry in storage
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// A children sequence names a node that has no children entry
    #[error("Node {parent} lists child {child}, which is not in storage")]
    DanglingChild {
        /// The node whose children sequence is inconsistent
        parent: NodeId,
        /// The listed child that could not be found
        child: NodeId,
    },

    /// A live, non-root node has no parent back-reference
    #[error("Node {0} has no parent reference")]
    MissingParent(NodeId),

    /// Following parent references from this node leads back to it
    #[error("Parent references form a cycle through {0}")]
    ParentCycle(NodeId),

    /// The requested move would detach the root or create a cycle
    #[error("Invalid move: {0}")]
    InvalidMove(String),

    /// The requested delete is not allowed
    #[error("Invalid delete: {0}")]
    InvalidDelete(String),

    /// A traversal visitor aborted the walk
    #[error("Visitor failed: {0}")]
    Visitor(String),
}

impl From<ArborStorageError> for TreeError {
    fn from(value: ArborStorageError) -> Self {
        TreeError::Storage(value)
    }
}
