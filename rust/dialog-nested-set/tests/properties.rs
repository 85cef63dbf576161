use dialog_nested_set::{DialogNestedSetError, NestedSet, NestedSetConfig, RebuildOrder, inspect};
use dialog_table::{MemoryTableBackend, NodeId, Payload};
use proptest::prelude::*;
use tokio::runtime::Runtime;

#[derive(Debug, Clone)]
enum Operation {
    InsertRoot,
    InsertChild { parent: usize },
    Move { node: usize, parent: usize },
    MoveToRoot { node: usize },
    Delete { node: usize, subtree: bool },
}

fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        1 => Just(Operation::InsertRoot),
        4 => any::<usize>().prop_map(|parent| Operation::InsertChild { parent }),
        3 => (any::<usize>(), any::<usize>())
            .prop_map(|(node, parent)| Operation::Move { node, parent }),
        1 => any::<usize>().prop_map(|node| Operation::MoveToRoot { node }),
        2 => (any::<usize>(), any::<bool>())
            .prop_map(|(node, subtree)| Operation::Delete { node, subtree }),
    ]
}

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn pick(ids: &[NodeId], index: usize) -> Option<NodeId> {
    (!ids.is_empty()).then(|| ids[index % ids.len()])
}

/// Apply `operation`, returning `Ok(false)` when there was nothing to apply
/// it to. Refusals the tree is expected to make are not failures.
async fn apply(
    tree: &NestedSet<MemoryTableBackend>,
    operation: &Operation,
) -> Result<bool, DialogNestedSetError> {
    let ids: Vec<NodeId> = tree
        .get_tree()
        .await?
        .into_iter()
        .map(|node| node.id)
        .collect();

    let outcome = match *operation {
        Operation::InsertRoot => tree.insert_root(Payload::default()).await.map(|_| ()),
        Operation::InsertChild { parent } => match pick(&ids, parent) {
            Some(parent) => tree
                .insert_child(parent, Payload::default())
                .await
                .map(|_| ()),
            None => return Ok(false),
        },
        Operation::Move { node, parent } => match (pick(&ids, node), pick(&ids, parent)) {
            (Some(node), Some(parent)) => {
                let before = tree.get_descendants(node, true).await?;
                let moved = tree.move_subtree(node, parent).await;
                if let Ok(moved) = &moved {
                    let after = tree.get_descendants(node, true).await?;
                    assert_eq!(moved.parent_id, Some(parent));
                    assert_eq!(
                        before.iter().map(|node| node.id).collect::<Vec<_>>(),
                        after.iter().map(|node| node.id).collect::<Vec<_>>()
                    );
                }
                moved.map(|_| ())
            }
            _ => return Ok(false),
        },
        Operation::MoveToRoot { node } => match pick(&ids, node) {
            Some(node) => tree.move_to_root(node).await.map(|_| ()),
            None => return Ok(false),
        },
        Operation::Delete { node, subtree } => match pick(&ids, node) {
            Some(node) => tree.delete_node(node, subtree).await.map(|_| ()),
            None => return Ok(false),
        },
    };

    match outcome {
        Ok(()) | Err(DialogNestedSetError::InvalidOperation(_)) => Ok(true),
        Err(error) => Err(error),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn it_preserves_every_invariant_across_random_mutations(
        operations in prop::collection::vec(operation(), 1..40)
    ) {
        runtime().block_on(async {
            let backend = MemoryTableBackend::default();
            let tree = NestedSet::new(backend.clone());

            for operation in &operations {
                apply(&tree, operation).await.unwrap();
                let violations = inspect(&backend.snapshot().await);
                assert!(violations.is_empty(), "{operation:?}: {violations:?}");
            }

            // A valid tree numbered by its own sibling order is already canonical
            let rebuilder = NestedSet::with_config(
                backend.clone(),
                NestedSetConfig {
                    rebuild_order: RebuildOrder::Lft,
                    ..Default::default()
                },
            );
            assert_eq!(rebuilder.rebuild_tree().await.unwrap().rewritten, 0);
        });
    }

    #[test]
    fn it_rebuilds_idempotently(
        operations in prop::collection::vec(operation(), 1..30)
    ) {
        runtime().block_on(async {
            let tree = NestedSet::new(MemoryTableBackend::default());

            for operation in &operations {
                apply(&tree, operation).await.unwrap();
            }

            let first = tree.rebuild_tree().await.unwrap();
            let numbered = tree.get_tree().await.unwrap();
            let second = tree.rebuild_tree().await.unwrap();

            assert_eq!(second.nodes, first.nodes);
            assert_eq!(second.rewritten, 0);
            assert_eq!(tree.get_tree().await.unwrap(), numbered);
            assert!(tree.verify().await.unwrap().is_empty());
        });
    }
}
