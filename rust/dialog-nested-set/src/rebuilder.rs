use std::collections::{BTreeMap, HashMap, HashSet};

use dialog_table::{Column, NodeId, Order, Predicate, Row, TableBackend, TableTransaction};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    DialogNestedSetError, NestedSetConfig, RebuildOrder,
    work::{begin_write, settle},
};

/// What a [TreeRebuilder::rebuild_tree] pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildReport {
    /// Number of nodes numbered
    pub nodes: usize,
    /// Number of nodes whose `lft`, `rgt` or `depth` had to be rewritten
    pub rewritten: usize,
}

/// The structural fields a rebuild assigns to one node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Numbering {
    pub lft: i64,
    pub rgt: i64,
    pub depth: i64,
}

enum Visit {
    Enter { id: NodeId, depth: i64 },
    Exit { id: NodeId, lft: i64, depth: i64 },
}

/// Number `rows` from their parent references alone. Siblings are visited in
/// the order they appear in `rows`.
///
/// Fails with [DialogNestedSetError::InvalidOperation] when a row names a
/// parent that does not exist, or when parent references form a cycle (such
/// rows are never reached from a root).
pub(crate) fn number(rows: &[Row]) -> Result<BTreeMap<NodeId, Numbering>, DialogNestedSetError> {
    let known: HashSet<NodeId> = rows.iter().map(|row| row.id).collect();
    let mut children: HashMap<Option<NodeId>, Vec<NodeId>> = HashMap::new();

    for row in rows {
        if let Some(parent) = row.parent_id {
            if !known.contains(&parent) {
                return Err(DialogNestedSetError::InvalidOperation(format!(
                    "node {} references missing parent {parent}",
                    row.id
                )));
            }
        }
        children.entry(row.parent_id).or_default().push(row.id);
    }

    let mut numbering = BTreeMap::new();
    let mut counter = 0;
    let mut stack: Vec<Visit> = children
        .get(&None)
        .into_iter()
        .flatten()
        .rev()
        .map(|id| Visit::Enter { id: *id, depth: 0 })
        .collect();

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter { id, depth } => {
                counter += 1;
                stack.push(Visit::Exit {
                    id,
                    lft: counter,
                    depth,
                });
                stack.extend(
                    children
                        .get(&Some(id))
                        .into_iter()
                        .flatten()
                        .rev()
                        .map(|child| Visit::Enter {
                            id: *child,
                            depth: depth + 1,
                        }),
                );
            }
            Visit::Exit { id, lft, depth } => {
                counter += 1;
                numbering.insert(
                    id,
                    Numbering {
                        lft,
                        rgt: counter,
                        depth,
                    },
                );
            }
        }
    }

    if numbering.len() < rows.len() {
        let unreachable: Vec<String> = rows
            .iter()
            .filter(|row| !numbering.contains_key(&row.id))
            .map(|row| row.id.to_string())
            .collect();
        return Err(DialogNestedSetError::InvalidOperation(format!(
            "parent references form a cycle through nodes {}",
            unreachable.join(", ")
        )));
    }

    Ok(numbering)
}

/// Reconstructs every interval and depth from `parent_id` references,
/// discarding the stored `lft`, `rgt` and `depth` as untrusted. This is the
/// repair path for a table left inconsistent by an interrupted mutation.
#[derive(Clone)]
pub struct TreeRebuilder<Backend>
where
    Backend: TableBackend,
{
    backend: Backend,
    config: NestedSetConfig,
}

impl<Backend> TreeRebuilder<Backend>
where
    Backend: TableBackend,
{
    /// Rebuild trees held by `backend`
    pub fn new(backend: Backend, config: NestedSetConfig) -> Self {
        Self { backend, config }
    }

    /// Renumber the whole table in one transaction. Nothing is written unless
    /// every row can be numbered and rewritten; `id`, `parent_id` and payloads
    /// are never touched.
    pub async fn rebuild_tree(&self) -> Result<RebuildReport, DialogNestedSetError> {
        let mut transaction = begin_write(&self.backend).await?;
        let outcome = renumber(&mut transaction, self.config.rebuild_order).await;
        settle(transaction, outcome, &self.config, "rebuild_tree").await
    }
}

async fn renumber<Transaction>(
    transaction: &mut Transaction,
    order: RebuildOrder,
) -> Result<RebuildReport, DialogNestedSetError>
where
    Transaction: TableTransaction,
{
    let sibling_order: Vec<Order> = match order {
        RebuildOrder::Id => vec![Column::Id.ascending()],
        RebuildOrder::Lft => vec![Column::Lft.ascending()],
    };
    let rows = transaction
        .select_many(&Predicate::All, &sibling_order)
        .await?;
    let numbering = number(&rows)?;

    let mut rewritten = 0;
    for row in &rows {
        let Some(assigned) = numbering.get(&row.id) else {
            continue;
        };
        if (row.lft, row.rgt, row.depth) == (assigned.lft, assigned.rgt, assigned.depth) {
            continue;
        }
        trace!(
            id = %row.id,
            lft = assigned.lft,
            rgt = assigned.rgt,
            depth = assigned.depth,
            "Renumbering node"
        );
        transaction
            .update_many(
                &Column::Id.equals(row.id),
                &[
                    Column::Lft.set(Some(assigned.lft)),
                    Column::Rgt.set(Some(assigned.rgt)),
                    Column::Depth.set(Some(assigned.depth)),
                ],
            )
            .await?;
        rewritten += 1;
    }

    debug!(nodes = rows.len(), rewritten, ?order, "Rebuilt tree");
    Ok(RebuildReport {
        nodes: rows.len(),
        rewritten,
    })
}
