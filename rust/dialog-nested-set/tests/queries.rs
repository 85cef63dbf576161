use anyhow::Result;
use dialog_nested_set::{DialogNestedSetError, NestedSet, Node};
use dialog_table::{MemoryTableBackend, NodeId, Payload};
use pretty_assertions::assert_eq;
use serde_json::json;

fn named(name: &str) -> Payload {
    Payload::from([("name".to_string(), json!(name))])
}

fn names(nodes: &[Node]) -> Vec<&str> {
    nodes
        .iter()
        .map(|node| node.payload["name"].as_str().unwrap_or_default())
        .collect()
}

struct Forest {
    tree: NestedSet<MemoryTableBackend>,
    a: NodeId,
    b: NodeId,
    b1: NodeId,
    c: NodeId,
    d: NodeId,
}

/// ```text
/// A          D
/// ├── B
/// │   ├── B1
/// │   └── B2
/// └── C
/// ```
async fn forest() -> Result<Forest> {
    let tree = NestedSet::new(MemoryTableBackend::default());

    let a = tree.insert_root(named("A")).await?;
    let b = tree.insert_child(a, named("B")).await?;
    let b1 = tree.insert_child(b, named("B1")).await?;
    tree.insert_child(b, named("B2")).await?;
    let c = tree.insert_child(a, named("C")).await?;
    let d = tree.insert_root(named("D")).await?;

    Ok(Forest {
        tree,
        a,
        b,
        b1,
        c,
        d,
    })
}

#[test_log::test(tokio::test)]
async fn it_lists_an_empty_table_as_an_empty_forest() -> Result<()> {
    let tree = NestedSet::new(MemoryTableBackend::default());

    assert!(tree.get_tree().await?.is_empty());
    assert!(tree.get_roots().await?.is_empty());
    assert!(tree.get_leaves().await?.is_empty());
    assert_eq!(tree.verify().await?, vec![]);

    Ok(())
}

#[test_log::test(tokio::test)]
async fn it_lists_the_forest_in_preorder() -> Result<()> {
    let Forest { tree, .. } = forest().await?;

    let nodes = tree.get_tree().await?;

    assert_eq!(names(&nodes), vec!["A", "B", "B1", "B2", "C", "D"]);
    assert!(nodes.windows(2).all(|pair| pair[0].lft < pair[1].lft));

    Ok(())
}

#[test_log::test(tokio::test)]
async fn it_reads_single_nodes() -> Result<()> {
    let Forest { tree, b1, .. } = forest().await?;

    let node = tree.get_node(b1).await?.unwrap();
    assert_eq!((node.lft, node.rgt, node.depth), (3, 4, 2));
    assert!(node.is_leaf());

    assert_eq!(tree.get_node(NodeId(404)).await?, None);

    Ok(())
}

#[test_log::test(tokio::test)]
async fn it_finds_descendants_strictly_inside_the_interval() -> Result<()> {
    let Forest { tree, a, b, b1, .. } = forest().await?;

    assert_eq!(
        names(&tree.get_descendants(a, false).await?),
        vec!["B", "B1", "B2", "C"]
    );
    assert_eq!(
        names(&tree.get_descendants(b, true).await?),
        vec!["B", "B1", "B2"]
    );
    assert!(tree.get_descendants(b1, false).await?.is_empty());
    assert_eq!(
        tree.get_descendants(NodeId(404), true).await,
        Err(DialogNestedSetError::NotFound(NodeId(404)))
    );

    Ok(())
}

#[test_log::test(tokio::test)]
async fn it_finds_ancestors_root_first() -> Result<()> {
    let Forest { tree, a, b1, d, .. } = forest().await?;

    assert_eq!(names(&tree.get_ancestors(b1, false).await?), vec!["A", "B"]);
    assert_eq!(
        names(&tree.get_ancestors(b1, true).await?),
        vec!["A", "B", "B1"]
    );
    assert!(tree.get_ancestors(a, false).await?.is_empty());
    assert!(tree.get_ancestors(d, false).await?.is_empty());
    assert_eq!(
        tree.get_ancestors(NodeId(404), false).await,
        Err(DialogNestedSetError::NotFound(NodeId(404)))
    );

    Ok(())
}

#[test_log::test(tokio::test)]
async fn it_agrees_on_descendants_and_ancestors() -> Result<()> {
    let Forest { tree, .. } = forest().await?;
    let nodes = tree.get_tree().await?;

    for upper in &nodes {
        let descendants = tree.get_descendants(upper.id, false).await?;
        for lower in &nodes {
            let ancestors = tree.get_ancestors(lower.id, false).await?;
            let below = descendants.iter().any(|node| node.id == lower.id);
            let above = ancestors.iter().any(|node| node.id == upper.id);
            assert_eq!(below, above, "{} / {}", upper.id, lower.id);
            assert_eq!(below, lower.is_descendant_of(upper));
        }
    }

    Ok(())
}

#[test_log::test(tokio::test)]
async fn it_lists_children_in_sibling_order() -> Result<()> {
    let Forest { tree, a, b, c, .. } = forest().await?;

    let children = tree.get_children(a).await?;
    assert_eq!(
        children.iter().map(|node| node.id).collect::<Vec<_>>(),
        vec![b, c]
    );
    assert!(
        children
            .iter()
            .all(|child| child.depth == 1 && child.parent_id == Some(a))
    );

    assert!(tree.get_children(c).await?.is_empty());
    assert!(tree.get_children(NodeId(404)).await?.is_empty());

    Ok(())
}

#[test_log::test(tokio::test)]
async fn it_lists_siblings_and_roots() -> Result<()> {
    let Forest { tree, a, b, b1, d, .. } = forest().await?;

    assert_eq!(names(&tree.get_siblings(b, false).await?), vec!["C"]);
    assert_eq!(names(&tree.get_siblings(b1, true).await?), vec!["B1", "B2"]);
    assert_eq!(names(&tree.get_siblings(d, false).await?), vec!["A"]);
    assert_eq!(names(&tree.get_roots().await?), vec!["A", "D"]);
    assert_eq!(
        tree.get_siblings(NodeId(404), true).await,
        Err(DialogNestedSetError::NotFound(NodeId(404)))
    );

    let roots = tree.get_roots().await?;
    assert_eq!(roots[0].id, a);
    assert!(roots.iter().all(Node::is_root));

    Ok(())
}

#[test_log::test(tokio::test)]
async fn it_lists_leaves_and_counts_descendants() -> Result<()> {
    let Forest { tree, a, b, b1, d, .. } = forest().await?;

    assert_eq!(
        names(&tree.get_leaves().await?),
        vec!["B1", "B2", "C", "D"]
    );
    assert_eq!(tree.count_descendants(a).await?, 4);
    assert_eq!(tree.count_descendants(b).await?, 2);
    assert_eq!(tree.count_descendants(b1).await?, 0);
    assert_eq!(tree.count_descendants(d).await?, 0);
    assert_eq!(
        tree.count_descendants(NodeId(404)).await,
        Err(DialogNestedSetError::NotFound(NodeId(404)))
    );

    Ok(())
}

#[test_log::test(tokio::test)]
async fn it_reads_through_the_reader_half() -> Result<()> {
    let Forest { tree, a, .. } = forest().await?;

    let reader = tree.reader().clone();
    assert_eq!(
        reader.get_descendants(a, true).await?,
        tree.get_descendants(a, true).await?
    );

    Ok(())
}
