use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
};

use async_trait::async_trait;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tracing::trace;

use crate::{
    Assignment, Column, DialogTableError, NewRow, NodeId, Order, Predicate, Row,
};

use super::{TableBackend, TableTransaction, TransactionMode};

type Rows = BTreeMap<NodeId, Row>;

/// A trivial implementation of [TableBackend] - backed by a [BTreeMap] - where
/// all rows are kept in memory and never persisted.
///
/// Read-write transactions work on a private copy of the table and hold the
/// table's write lock until they finish, so there is exactly one writer at a
/// time and readers only ever observe committed state.
#[derive(Clone, Default)]
pub struct MemoryTableBackend {
    rows: Arc<RwLock<Rows>>,
    sequence: Arc<AtomicI64>,
}

impl MemoryTableBackend {
    /// An empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// A table pre-populated with `rows` exactly as given, with no validation.
    /// Generated identifiers continue after the largest id present.
    pub fn from_rows(rows: impl IntoIterator<Item = Row>) -> Self {
        let rows: Rows = rows.into_iter().map(|row| (row.id, row)).collect();
        let last = rows.keys().next_back().map(|id| id.0).unwrap_or(0);
        Self {
            rows: Arc::new(RwLock::new(rows)),
            sequence: Arc::new(AtomicI64::new(last)),
        }
    }

    /// Every committed row, ordered by id
    pub async fn snapshot(&self) -> Vec<Row> {
        self.rows.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl TableBackend for MemoryTableBackend {
    type Transaction = MemoryTableTransaction;

    async fn begin(&self, mode: TransactionMode) -> Result<Self::Transaction, DialogTableError> {
        let state = match mode {
            TransactionMode::ReadOnly => {
                TransactionState::Reading(self.rows.clone().read_owned().await)
            }
            TransactionMode::ReadWrite => {
                let guard = self.rows.clone().write_owned().await;
                let working = guard.clone();
                TransactionState::Writing {
                    guard,
                    working,
                    sequence: self.sequence.clone(),
                }
            }
        };
        trace!(?mode, "Began memory table transaction");
        Ok(MemoryTableTransaction { state })
    }
}

enum TransactionState {
    Reading(OwnedRwLockReadGuard<Rows>),
    Writing {
        guard: OwnedRwLockWriteGuard<Rows>,
        working: Rows,
        sequence: Arc<AtomicI64>,
    },
}

/// The [TableTransaction] of a [MemoryTableBackend]
pub struct MemoryTableTransaction {
    state: TransactionState,
}

impl MemoryTableTransaction {
    fn rows(&self) -> &Rows {
        match &self.state {
            TransactionState::Reading(guard) => guard,
            TransactionState::Writing { working, .. } => working,
        }
    }

    fn rows_mut(&mut self) -> Result<&mut Rows, DialogTableError> {
        match &mut self.state {
            TransactionState::Reading(_) => Err(DialogTableError::ReadOnlyTransaction),
            TransactionState::Writing { working, .. } => Ok(working),
        }
    }

    fn matching<'a>(&'a self, predicate: &'a Predicate) -> impl Iterator<Item = &'a Row> + 'a {
        self.rows().values().filter(move |row| predicate.matches(row))
    }
}

#[async_trait]
impl TableTransaction for MemoryTableTransaction {
    fn mode(&self) -> TransactionMode {
        match self.state {
            TransactionState::Reading(_) => TransactionMode::ReadOnly,
            TransactionState::Writing { .. } => TransactionMode::ReadWrite,
        }
    }

    async fn select_one(&self, predicate: &Predicate) -> Result<Option<Row>, DialogTableError> {
        Ok(self.matching(predicate).next().cloned())
    }

    async fn select_many(
        &self,
        predicate: &Predicate,
        order: &[Order],
    ) -> Result<Vec<Row>, DialogTableError> {
        let mut rows: Vec<Row> = self.matching(predicate).cloned().collect();
        rows.sort_by(|left, right| Order::compare(order, left, right));
        Ok(rows)
    }

    async fn max(
        &self,
        column: Column,
        predicate: &Predicate,
    ) -> Result<Option<i64>, DialogTableError> {
        Ok(self.matching(predicate).filter_map(|row| row.get(column)).max())
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64, DialogTableError> {
        Ok(self.matching(predicate).count() as u64)
    }

    async fn insert(&mut self, row: NewRow) -> Result<NodeId, DialogTableError> {
        let TransactionState::Writing {
            working, sequence, ..
        } = &mut self.state
        else {
            return Err(DialogTableError::ReadOnlyTransaction);
        };
        let id = NodeId(sequence.fetch_add(1, Ordering::SeqCst) + 1);
        working.insert(id, row.identify(id));
        trace!(%id, "Inserted row");
        Ok(id)
    }

    async fn update_many(
        &mut self,
        predicate: &Predicate,
        assignments: &[Assignment],
    ) -> Result<u64, DialogTableError> {
        let rows = self.rows_mut()?;

        // Compute every new row before writing any, so a failed assignment
        // leaves the statement without effect.
        let mut updated = Vec::new();
        for row in rows.values().filter(|row| predicate.matches(row)) {
            let mut next = row.clone();
            for assignment in assignments {
                next.set(
                    assignment.column,
                    assignment.expression.evaluate(row.get(assignment.column)),
                )?;
            }
            updated.push(next);
        }

        let affected = updated.len() as u64;
        for row in updated {
            rows.insert(row.id, row);
        }
        trace!(?predicate, ?assignments, affected, "Updated rows");
        Ok(affected)
    }

    async fn delete_many(&mut self, predicate: &Predicate) -> Result<u64, DialogTableError> {
        let rows = self.rows_mut()?;
        let before = rows.len();
        rows.retain(|_, row| !predicate.matches(row));
        let affected = (before - rows.len()) as u64;
        trace!(?predicate, affected, "Deleted rows");
        Ok(affected)
    }

    async fn commit(self) -> Result<(), DialogTableError> {
        if let TransactionState::Writing {
            mut guard, working, ..
        } = self.state
        {
            *guard = working;
            trace!("Committed memory table transaction");
        }
        Ok(())
    }

    async fn rollback(self) -> Result<(), DialogTableError> {
        trace!(mode = ?self.mode(), "Rolled back memory table transaction");
        Ok(())
    }
}
