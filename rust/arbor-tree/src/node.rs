use serde::{Deserialize, Serialize};

use crate::NodeId;

/// The opaque data associated with a node. Nodes without stored data read
/// back as an empty map.
pub type NodeData = serde_json::Map<String, serde_json::Value>;

/// A snapshot of one node as read from storage: its identifier, its ordered
/// children and its data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// The node's identifier
    pub id: NodeId,
    /// The node's children, in insertion order
    pub children: Vec<NodeId>,
    /// The node's data
    pub data: NodeData,
}

impl Node {
    /// True if the node has no children
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
