use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use anyhow::Result;
use dialog_nested_set::NestedSet;
use dialog_table::{MemoryTableBackend, Payload};
use pretty_assertions::assert_eq;
use serde_json::json;

fn numbered(worker: usize, step: usize) -> Payload {
    Payload::from([
        ("worker".to_string(), json!(worker)),
        ("step".to_string(), json!(step)),
    ])
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn it_serialises_concurrent_writers() -> Result<()> {
    let tree = NestedSet::new(MemoryTableBackend::default());
    let root = tree.insert_root(Payload::default()).await?;

    let workers = 8;
    let steps = 12;
    let mut handles = Vec::new();

    for worker in 0..workers {
        let tree = tree.clone();
        handles.push(tokio::spawn(async move {
            let branch = tree.insert_child(root, numbered(worker, 0)).await?;
            let mut last = branch;
            for step in 1..steps {
                last = if step % 3 == 0 {
                    tree.insert_child(branch, numbered(worker, step)).await?
                } else {
                    tree.insert_child(last, numbered(worker, step)).await?
                };
                if step % 4 == 0 {
                    tree.move_subtree(last, root).await?;
                }
            }
            Ok::<_, anyhow::Error>(())
        }));
    }

    for handle in handles {
        handle.await??;
    }

    assert_eq!(tree.verify().await?, vec![]);
    assert_eq!(tree.count_descendants(root).await?, (workers * steps) as i64);

    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn it_only_shows_readers_committed_trees() -> Result<()> {
    let tree = NestedSet::new(MemoryTableBackend::default());
    let root = tree.insert_root(Payload::default()).await?;
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let tree = tree.clone();
        let done = done.clone();
        tokio::spawn(async move {
            let mut observations = 0;
            loop {
                let violations = tree.verify().await?;
                assert!(violations.is_empty(), "{violations:?}");
                observations += 1;
                if done.load(Ordering::SeqCst) {
                    break;
                }
                tokio::task::yield_now().await;
            }
            Ok::<_, anyhow::Error>(observations)
        })
    };

    let mut previous = root;
    for step in 0..50 {
        let child = tree.insert_child(previous, numbered(0, step)).await?;
        if step % 5 == 4 {
            tree.move_subtree(child, root).await?;
        }
        if step % 7 == 6 {
            tree.delete_node(child, true).await?;
        } else {
            previous = child;
        }
    }
    done.store(true, Ordering::SeqCst);

    assert!(reader.await?? > 0);
    assert_eq!(tree.verify().await?, vec![]);

    Ok(())
}
