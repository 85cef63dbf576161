use dialog_table::{
    Column, NewRow, NodeId, Payload, Predicate, TableBackend, TableTransaction,
};
use tracing::{debug, trace};

use crate::{
    DialogNestedSetError, NestedSetConfig, Node,
    payload::sanitize,
    reader::{find, within},
    work::{begin_write, settle},
};

/// Where a relocated subtree lands: the interval position its gap opens at,
/// the depth its root takes and the parent it hangs from
struct Destination {
    parent_id: Option<NodeId>,
    target: i64,
    depth: i64,
}

/// Inserts, moves and deletes nodes by shifting intervals to make or close
/// room. Each operation is one read-write transaction: it either commits in
/// full or is rolled back before its error is returned.
#[derive(Clone)]
pub struct TreeMutator<Backend>
where
    Backend: TableBackend,
{
    backend: Backend,
    config: NestedSetConfig,
}

impl<Backend> TreeMutator<Backend>
where
    Backend: TableBackend,
{
    /// Mutate trees held by `backend`
    pub fn new(backend: Backend, config: NestedSetConfig) -> Self {
        Self { backend, config }
    }

    /// Append a new root to the right of every existing tree
    pub async fn insert_root(&self, payload: Payload) -> Result<NodeId, DialogNestedSetError> {
        let payload = sanitize(payload);
        let mut transaction = begin_write(&self.backend).await?;
        let outcome = append_root(&mut transaction, payload).await;
        settle(transaction, outcome, &self.config, "insert_root").await
    }

    /// Insert a new node as the last child of `parent_id`
    pub async fn insert_child(
        &self,
        parent_id: NodeId,
        payload: Payload,
    ) -> Result<NodeId, DialogNestedSetError> {
        let payload = sanitize(payload);
        let mut transaction = begin_write(&self.backend).await?;
        let outcome = append_child(&mut transaction, parent_id, payload).await;
        settle(transaction, outcome, &self.config, "insert_child").await
    }

    /// Move the subtree rooted at `node_id` to become the last child of
    /// `new_parent_id`, returning its root at the new position
    pub async fn move_subtree(
        &self,
        node_id: NodeId,
        new_parent_id: NodeId,
    ) -> Result<Node, DialogNestedSetError> {
        if node_id == new_parent_id {
            return Err(DialogNestedSetError::InvalidOperation(format!(
                "cannot move node {node_id} under itself"
            )));
        }
        let mut transaction = begin_write(&self.backend).await?;
        let outcome = move_under(&mut transaction, node_id, new_parent_id).await;
        settle(transaction, outcome, &self.config, "move_subtree").await
    }

    /// Detach the subtree rooted at `node_id` and append it as the last root
    pub async fn move_to_root(&self, node_id: NodeId) -> Result<Node, DialogNestedSetError> {
        let mut transaction = begin_write(&self.backend).await?;
        let outcome = move_out(&mut transaction, node_id).await;
        settle(transaction, outcome, &self.config, "move_to_root").await
    }

    /// Delete `node_id`, and its whole subtree when `delete_subtree` is set,
    /// returning how many nodes were removed. Without `delete_subtree` a node
    /// that still has children is refused rather than orphaning them.
    pub async fn delete_node(
        &self,
        node_id: NodeId,
        delete_subtree: bool,
    ) -> Result<u64, DialogNestedSetError> {
        let mut transaction = begin_write(&self.backend).await?;
        let outcome = remove(&mut transaction, node_id, delete_subtree).await;
        settle(transaction, outcome, &self.config, "delete_node").await
    }
}

async fn require<Transaction>(
    transaction: &Transaction,
    id: NodeId,
) -> Result<Node, DialogNestedSetError>
where
    Transaction: TableTransaction,
{
    find(transaction, id)
        .await?
        .ok_or(DialogNestedSetError::NotFound(id))
}

async fn append_root<Transaction>(
    transaction: &mut Transaction,
    payload: Payload,
) -> Result<NodeId, DialogNestedSetError>
where
    Transaction: TableTransaction,
{
    let extent = transaction
        .max(Column::Rgt, &Predicate::All)
        .await?
        .unwrap_or(0);

    let id = transaction
        .insert(NewRow {
            parent_id: None,
            lft: extent + 1,
            rgt: extent + 2,
            depth: 0,
            payload,
        })
        .await?;

    debug!(%id, lft = extent + 1, "Inserted root");
    Ok(id)
}

async fn append_child<Transaction>(
    transaction: &mut Transaction,
    parent_id: NodeId,
    payload: Payload,
) -> Result<NodeId, DialogNestedSetError>
where
    Transaction: TableTransaction,
{
    let parent = require(transaction, parent_id).await?;
    let at = parent.rgt;

    // Right bounds first so the parent itself widens; both passes use the
    // original insertion point.
    transaction
        .update_many(&Column::Rgt.ge(at), &[Column::Rgt.shift(2)])
        .await?;
    transaction
        .update_many(&Column::Lft.ge(at), &[Column::Lft.shift(2)])
        .await?;

    let id = transaction
        .insert(NewRow {
            parent_id: Some(parent.id),
            lft: at,
            rgt: at + 1,
            depth: parent.depth + 1,
            payload,
        })
        .await?;

    debug!(%id, parent = %parent.id, lft = at, "Inserted child");
    Ok(id)
}

async fn move_under<Transaction>(
    transaction: &mut Transaction,
    node_id: NodeId,
    new_parent_id: NodeId,
) -> Result<Node, DialogNestedSetError>
where
    Transaction: TableTransaction,
{
    let node = require(transaction, node_id).await?;
    let parent = require(transaction, new_parent_id).await?;

    if node.contains(&parent) {
        return Err(DialogNestedSetError::InvalidOperation(format!(
            "cannot move node {node_id} into its own subtree under {new_parent_id}"
        )));
    }

    relocate(
        transaction,
        &node,
        Destination {
            parent_id: Some(parent.id),
            target: parent.rgt,
            depth: parent.depth + 1,
        },
    )
    .await
}

async fn move_out<Transaction>(
    transaction: &mut Transaction,
    node_id: NodeId,
) -> Result<Node, DialogNestedSetError>
where
    Transaction: TableTransaction,
{
    let node = require(transaction, node_id).await?;
    let extent = transaction
        .max(Column::Rgt, &Predicate::All)
        .await?
        .unwrap_or(0);

    relocate(
        transaction,
        &node,
        Destination {
            parent_id: None,
            target: extent + 1,
            depth: 0,
        },
    )
    .await
}

async fn relocate<Transaction>(
    transaction: &mut Transaction,
    node: &Node,
    destination: Destination,
) -> Result<Node, DialogNestedSetError>
where
    Transaction: TableTransaction,
{
    let width = node.width();
    let target = destination.target;
    let (mut lft, mut rgt) = (node.lft, node.rgt);

    debug!(
        id = %node.id,
        lft,
        rgt,
        target,
        parent = ?destination.parent_id,
        "Relocating subtree"
    );

    // Open a gap of `width` positions at the target
    transaction
        .update_many(&Column::Rgt.ge(target), &[Column::Rgt.shift(width)])
        .await?;
    transaction
        .update_many(&Column::Lft.ge(target), &[Column::Lft.shift(width)])
        .await?;
    if lft >= target {
        lft += width;
        rgt += width;
    }
    trace!(lft, rgt, "Opened gap");

    // Park the subtree on negative bounds so the following shifts skip it
    let parked = transaction
        .update_many(
            &Column::Lft.ge(lft).and(Column::Rgt.le(rgt)),
            &[Column::Lft.reflect(0), Column::Rgt.reflect(0)],
        )
        .await?;
    trace!(parked, "Parked subtree");

    // Close the hole the subtree left behind
    transaction
        .update_many(&Column::Lft.gt(rgt), &[Column::Lft.shift(-width)])
        .await?;
    transaction
        .update_many(&Column::Rgt.gt(rgt), &[Column::Rgt.shift(-width)])
        .await?;

    // The gap itself moved down if it lay beyond the hole
    let start = if target > rgt { target - width } else { target };
    let offset = start - lft;
    transaction
        .update_many(
            &Column::Lft.lt(0),
            &[Column::Lft.reflect(offset), Column::Rgt.reflect(offset)],
        )
        .await?;
    trace!(start, offset, "Landed subtree");

    transaction
        .update_many(
            &Column::Id.equals(node.id),
            &[Column::ParentId.set(destination.parent_id.map(i64::from))],
        )
        .await?;

    let moved = Node {
        lft: start,
        rgt: start + width - 1,
        ..node.clone()
    };
    let delta = destination.depth - node.depth;
    if delta != 0 {
        transaction
            .update_many(&within(&moved, true), &[Column::Depth.shift(delta)])
            .await?;
    }

    require(transaction, node.id).await
}

async fn remove<Transaction>(
    transaction: &mut Transaction,
    node_id: NodeId,
    delete_subtree: bool,
) -> Result<u64, DialogNestedSetError>
where
    Transaction: TableTransaction,
{
    let node = require(transaction, node_id).await?;

    let (removed, width) = if delete_subtree {
        let removed = transaction.delete_many(&within(&node, true)).await?;
        (removed, node.width())
    } else {
        let children = transaction
            .count(&Column::ParentId.equals(node.id))
            .await?;
        if children > 0 {
            return Err(DialogNestedSetError::InvalidOperation(format!(
                "node {node_id} has {children} children; delete its subtree instead"
            )));
        }
        let removed = transaction
            .delete_many(&Column::Id.equals(node.id))
            .await?;
        (removed, 2)
    };

    transaction
        .update_many(&Column::Lft.gt(node.rgt), &[Column::Lft.shift(-width)])
        .await?;
    transaction
        .update_many(&Column::Rgt.gt(node.rgt), &[Column::Rgt.shift(-width)])
        .await?;

    debug!(id = %node_id, removed, width, "Deleted nodes");
    Ok(removed)
}
