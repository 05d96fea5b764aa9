mod helpers;

use anyhow::Result;
use arbor_storage::{ArborStorageError, FailingStorageBackend, MemoryStorageBackend};
use arbor_tree::{NodeId, Tree, TreeConfig, TreeError};
use helpers::{MemoryStorage, named};

#[tokio::test]
async fn it_creates_the_root_of_a_fresh_tree() -> Result<()> {
    let storage = MemoryStorage::default();
    let tree = Tree::open(storage.clone(), TreeConfig::new("myTree")).await?;

    assert!(tree.is_ready());
    assert_eq!(storage.keys().await, vec!["myTree/root".to_string()]);
    assert_eq!(tree.get_root().await?, Vec::<NodeId>::new());

    Ok(())
}

#[tokio::test]
async fn it_adopts_an_existing_root() -> Result<()> {
    let storage = MemoryStorage::default();

    let first = Tree::open(storage.clone(), TreeConfig::default()).await?;
    let child = first.insert_node(first.root_id(), named("b")).await?;

    let second = Tree::open(storage, TreeConfig::default()).await?;

    assert_eq!(second.get_root().await?, vec![child]);

    Ok(())
}

#[test_log::test(tokio::test)]
async fn it_runs_operations_issued_before_ready_in_order() -> Result<()> {
    let storage = MemoryStorage::default();
    let tree = Tree::new(storage, TreeConfig::default());

    // Root establishment has not had a chance to run on this thread yet
    assert!(!tree.is_ready());

    let root = tree.root_id().clone();
    let (first, second, children, data) = futures::join!(
        tree.insert_node(&root, named("first")),
        tree.insert_node(&root, named("second")),
        tree.get_root(),
        tree.set_node_data(&root, named("a")),
    );

    let (first, second, children) = (first?, second?, children?);
    data?;

    assert_eq!(children, vec![first, second]);
    assert_eq!(tree.get_node_data(&root).await?, named("a"));
    assert!(tree.is_ready());

    Ok(())
}

#[tokio::test]
async fn it_notifies_every_waiter_once_ready() -> Result<()> {
    let tree = Tree::new(MemoryStorage::default(), TreeConfig::default());
    let other = tree.clone();

    let (first, second) = futures::join!(tree.ready(), other.ready());
    first?;
    second?;

    // Resolves immediately once settled
    tree.ready().await?;

    Ok(())
}

#[test_log::test(tokio::test)]
async fn it_fails_every_operation_when_the_root_cannot_be_read() -> Result<()> {
    let storage = FailingStorageBackend::new(MemoryStorageBackend::<String, Vec<u8>>::default());
    storage.fail_reads_of("tree/root".to_string()).await;

    let tree = Tree::new(storage, TreeConfig::default());
    let root = tree.root_id().clone();

    let (insert, children) = futures::join!(
        tree.insert_node(&root, named("b")),
        tree.get_root()
    );

    let failure = TreeError::Initialization(ArborStorageError::StorageBackend(
        "Injected read failure".into(),
    ));

    assert_eq!(insert, Err(failure.clone()));
    assert_eq!(children, Err(failure.clone()));
    assert_eq!(tree.ready().await, Err(failure.clone()));
    assert_eq!(tree.get_node_data(&root).await, Err(failure));
    assert!(!tree.is_ready());

    Ok(())
}

#[tokio::test]
async fn it_fails_to_open_when_the_root_cannot_be_written() -> Result<()> {
    let inner = MemoryStorageBackend::<String, Vec<u8>>::default();
    let storage = FailingStorageBackend::new(inner.clone());
    storage.fail_writes(true);

    let result = Tree::open(storage, TreeConfig::default()).await;

    assert!(matches!(result, Err(TreeError::Initialization(_))));
    assert!(inner.is_empty().await);

    Ok(())
}
