#![allow(dead_code)]

use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use arbor_storage::{MemoryStorageBackend, StorageBackend};
use arbor_tree::{Node, NodeData, NodeId, Tree, TreeConfig};
use serde_json::json;

pub type MemoryStorage = MemoryStorageBackend<String, Vec<u8>>;

/// The children of every non-leaf node, by name, plus the name of the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Structure {
    pub root: String,
    pub children: BTreeMap<String, Vec<String>>,
}

impl Structure {
    /// Children are given as space separated names, e.g. `("a", "b c d")`
    pub fn new(root: &str, children: &[(&str, &str)]) -> Self {
        Self {
            root: root.into(),
            children: children
                .iter()
                .map(|(parent, children)| {
                    (
                        parent.to_string(),
                        children.split_whitespace().map(String::from).collect(),
                    )
                })
                .collect(),
        }
    }
}

/// Data holding nothing but a name
pub fn named(name: &str) -> NodeData {
    let mut data = NodeData::new();
    data.insert("name".into(), json!(name));
    data
}

/// The name stored in a node's data
pub fn name_of(node: &Node) -> String {
    node.data
        .get("name")
        .and_then(|name| name.as_str())
        .unwrap_or_default()
        .to_owned()
}

/// A predicate matching nodes by name
pub fn is_named(name: &'static str) -> impl FnMut(&Node) -> bool + Send {
    move |node: &Node| name_of(node) == name
}

pub async fn open_memory_tree(config: TreeConfig) -> Result<(Tree<MemoryStorage>, MemoryStorage)> {
    let storage = MemoryStorage::default();
    let tree = Tree::open(storage.clone(), config).await?;
    Ok((tree, storage))
}

/// Names the root "a" and builds beneath it:
///
/// ```text
/// a ─┬─ b ─┬─ e ─┬─ i
///    │     │     └─ j
///    │     └─ f
///    ├─ c
///    └─ d ─┬─ g ─┬─ k
///          │     └─ l
///          └─ h
/// ```
///
/// Returns the identifier of every node by name.
pub async fn build_fixture<Backend>(tree: &Tree<Backend>) -> Result<BTreeMap<String, NodeId>>
where
    Backend: StorageBackend<Key = String, Value = Vec<u8>> + Send + Sync + 'static,
{
    let mut ids = BTreeMap::new();

    tree.set_node_data(tree.root_id(), named("a")).await?;
    ids.insert("a".to_string(), tree.root_id().clone());

    for (parent, child) in [
        ("a", "b"),
        ("a", "c"),
        ("a", "d"),
        ("b", "e"),
        ("b", "f"),
        ("d", "g"),
        ("d", "h"),
        ("e", "i"),
        ("e", "j"),
        ("g", "k"),
        ("g", "l"),
    ] {
        let parent_id = ids
            .get(parent)
            .cloned()
            .ok_or_else(|| anyhow!("{parent} was not inserted"))?;
        let id = tree.insert_node(&parent_id, named(child)).await?;
        ids.insert(child.to_string(), id);
    }

    Ok(ids)
}

pub fn fixture_structure() -> Structure {
    Structure::new(
        "a",
        &[
            ("a", "b c d"),
            ("b", "e f"),
            ("d", "g h"),
            ("e", "i j"),
            ("g", "k l"),
        ],
    )
}

/// Read the whole tree back as a [Structure]
pub async fn structure_of<Backend>(tree: &Tree<Backend>) -> Result<Structure>
where
    Backend: StorageBackend<Key = String, Value = Vec<u8>> + Send + Sync + 'static,
{
    let mut names = BTreeMap::new();
    let mut nodes = Vec::new();

    tree.breadth_walk(None, |node| {
        names.insert(node.id.clone(), name_of(node));
        nodes.push(node.clone());
    })
    .await?;

    let root = names.get(tree.root_id()).cloned().unwrap_or_default();
    let children = nodes
        .into_iter()
        .filter(|node| !node.is_leaf())
        .map(|node| {
            let parent = names.get(&node.id).cloned().unwrap_or_default();
            let children = node
                .children
                .iter()
                .map(|child| names.get(child).cloned().unwrap_or_default())
                .collect();
            (parent, children)
        })
        .collect();

    Ok(Structure { root, children })
}

/// The names of the nodes visited by a traversal, concatenated
pub fn visited(nodes: &[Node]) -> String {
    nodes.iter().map(name_of).collect()
}
