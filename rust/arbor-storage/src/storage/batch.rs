use std::collections::BTreeMap;

/// A single write queued in a [Batch]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation<Key, Value> {
    /// Store `value` against `key`
    Put {
        /// The key to write
        key: Key,
        /// The value to store
        value: Value,
    },
    /// Remove whatever is stored against `key`
    Delete {
        /// The key to remove
        key: Key,
    },
}

impl<Key, Value> Operation<Key, Value> {
    /// The key this operation targets
    pub fn key(&self) -> &Key {
        match self {
            Operation::Put { key, .. } | Operation::Delete { key } => key,
        }
    }
}

/// An ordered list of writes that a [crate::StorageBackend] commits as one
/// unit: either every operation becomes visible or none does.
///
/// When the same key appears more than once, the last operation wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<Key, Value> {
    operations: Vec<Operation<Key, Value>>,
}

impl<Key, Value> Default for Batch<Key, Value> {
    fn default() -> Self {
        Self {
            operations: Vec::new(),
        }
    }
}

impl<Key, Value> Batch<Key, Value> {
    /// Queue a write of `value` against `key`
    pub fn put(mut self, key: Key, value: Value) -> Self {
        self.operations.push(Operation::Put { key, value });
        self
    }

    /// Queue the removal of `key`
    pub fn delete(mut self, key: Key) -> Self {
        self.operations.push(Operation::Delete { key });
        self
    }

    /// The number of queued operations
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// True if nothing has been queued
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Iterate over the queued operations in the order they were added
    pub fn iter(&self) -> impl Iterator<Item = &Operation<Key, Value>> {
        self.operations.iter()
    }

    /// Apply every queued operation to an in-memory map.
    pub fn apply_to(self, entries: &mut BTreeMap<Key, Value>)
    where
        Key: Ord,
    {
        for operation in self.operations {
            match operation {
                Operation::Put { key, value } => {
                    entries.insert(key, value);
                }
                Operation::Delete { key } => {
                    entries.remove(&key);
                }
            }
        }
    }
}

impl<Key, Value> IntoIterator for Batch<Key, Value> {
    type Item = Operation<Key, Value>;
    type IntoIter = std::vec::IntoIter<Operation<Key, Value>>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{Batch, Operation};

    #[test]
    fn it_applies_operations_in_order() {
        let mut entries = BTreeMap::from([("a", 1), ("b", 2)]);

        Batch::default()
            .put("c", 3)
            .delete("a")
            .put("b", 20)
            .put("b", 200)
            .delete("c")
            .apply_to(&mut entries);

        assert_eq!(entries, BTreeMap::from([("b", 200)]));
    }

    #[test]
    fn it_tracks_queued_operations() {
        let batch = Batch::default().put("a", 1).delete("b");

        assert_eq!(batch.len(), 2);
        assert!(!batch.is_empty());
        assert_eq!(
            batch.iter().map(|operation| *operation.key()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert_eq!(
            batch.into_iter().last(),
            Some(Operation::<&str, i32>::Delete { key: "b" })
        );
    }
}
