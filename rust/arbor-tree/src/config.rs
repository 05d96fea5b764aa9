use serde::Deserialize;

/// Settings for a [`crate::Tree`]
///
/// ```rust
/// use arbor_tree::TreeConfig;
///
/// let config: TreeConfig = serde_json::from_str(r#"{ "tree_id": "myTree" }"#).unwrap();
///
/// assert_eq!(config.tree_id, "myTree");
/// assert!(config.serialize_mutations);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Namespace for every key the tree writes; trees with different ids can
    /// share one store
    pub tree_id: String,

    /// Run insert, delete and move one at a time per tree handle (and its
    /// clones), so that concurrent mutations under a shared parent cannot
    /// lose each other's updates
    pub serialize_mutations: bool,

    /// Remove the data and parent entries of deleted nodes along with their
    /// children entries
    pub reclaim_orphans: bool,
}

impl TreeConfig {
    /// Default settings for the tree named `tree_id`
    pub fn new(tree_id: impl Into<String>) -> Self {
        Self {
            tree_id: tree_id.into(),
            ..Self::default()
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            tree_id: "tree".into(),
            serialize_mutations: true,
            reclaim_orphans: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TreeConfig;

    #[test]
    fn it_fills_missing_fields_with_defaults() -> anyhow::Result<()> {
        let config: TreeConfig = serde_json::from_str(r#"{ "reclaim_orphans": false }"#)?;

        assert_eq!(
            config,
            TreeConfig {
                tree_id: "tree".into(),
                serialize_mutations: true,
                reclaim_orphans: false,
            }
        );

        Ok(())
    }
}
