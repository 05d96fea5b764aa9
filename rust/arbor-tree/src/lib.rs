#![warn(missing_docs)]

//! A hierarchical tree of nodes persisted on an ordered key-value store.
//!
//! Each node is stored as a handful of entries in any [StorageBackend]: its
//! ordered children, its data and a reference to its parent. Structural
//! changes are committed atomically, and the whole tree can be walked or
//! searched breadth-first or depth-first.
//!
//! ```rust
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), arbor_tree::TreeError> {
//! use arbor_storage::MemoryStorageBackend;
//! use arbor_tree::{NodeData, Tree, TreeConfig};
//!
//! let storage = MemoryStorageBackend::<String, Vec<u8>>::default();
//! let tree = Tree::open(storage, TreeConfig::new("myTree")).await?;
//!
//! let child = tree.insert_node(tree.root_id(), NodeData::new()).await?;
//! let grandchild = tree.insert_node(&child, NodeData::new()).await?;
//!
//! let leaf = tree.depth_leaf_search(None, |node| node.is_leaf()).await?;
//! assert_eq!(leaf.map(|node| node.id), Some(grandchild));
//! # Ok(())
//! # }
//! ```
//!
//! [StorageBackend]: arbor_storage::StorageBackend

mod config;
pub use config::*;

mod error;
pub use error::*;

mod gate;

mod key;
pub use key::*;

mod node;
pub use node::*;

mod traversal;
pub use traversal::*;

mod tree;
pub use tree::*;
