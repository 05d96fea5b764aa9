use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DATA_SUFFIX: &str = "/data";
const PARENT_SUFFIX: &str = "/parent";

/// The identifier of a node within a tree.
///
/// Every node occupies three storage entries derived from its identifier:
///
/// | entry    | key                 | value                      |
/// |----------|---------------------|----------------------------|
/// | children | `{id}`              | ordered child identifiers  |
/// | data     | `{id}/data`         | the node's [`crate::NodeData`] |
/// | parent   | `{id}/parent`       | the parent's identifier    |
///
/// Identifiers produced by [`NodeId::root`] and [`NodeId::mint`] end in
/// `root` or a UUID, so they can never be mistaken for a derived key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// The stable identifier of the root of the tree named `tree_id`
    pub fn root(tree_id: &str) -> Self {
        Self(format!("{tree_id}/root"))
    }

    /// A fresh identifier, namespaced under `tree_id`, backed by a random
    /// 128-bit UUID
    pub fn mint(tree_id: &str) -> Self {
        Self(format!("{tree_id}/node-{}", Uuid::new_v4()))
    }

    /// The key holding this node's children sequence
    pub fn children_key(&self) -> String {
        self.0.clone()
    }

    /// The key holding this node's data
    pub fn data_key(&self) -> String {
        format!("{}{DATA_SUFFIX}", self.0)
    }

    /// The key holding this node's parent back-reference
    pub fn parent_key(&self) -> String {
        format!("{}{PARENT_SUFFIX}", self.0)
    }

    /// The identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<NodeId> for String {
    fn from(value: NodeId) -> Self {
        value.0
    }
}
