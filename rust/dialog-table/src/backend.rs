use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Assignment, Column, DialogTableError, NewRow, NodeId, Order, Predicate, Row};

mod memory;
pub use memory::*;

/// Whether a transaction may write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionMode {
    /// Sees a committed snapshot; any write fails
    ReadOnly,
    /// Exclusive writer for the table
    ReadWrite,
}

/// A [TableBackend] is a facade over a relational store holding one
/// nested-set table. All access goes through a [TableTransaction].
#[async_trait]
pub trait TableBackend: Clone + Send + Sync {
    /// The unit of work handed out by [TableBackend::begin]
    type Transaction: TableTransaction;

    /// Open a transaction. A [TransactionMode::ReadWrite] transaction excludes
    /// every other transaction on the table until it is committed or rolled
    /// back; [TransactionMode::ReadOnly] transactions may run concurrently
    /// with each other.
    async fn begin(&self, mode: TransactionMode) -> Result<Self::Transaction, DialogTableError>;
}

/// Point and range access to a table inside caller-controlled transaction
/// boundaries. Dropping a transaction without committing rolls it back.
#[async_trait]
pub trait TableTransaction: Send + Sync + Sized {
    /// The mode this transaction was opened with
    fn mode(&self) -> TransactionMode;

    /// The lowest-id row matching `predicate`, if any
    async fn select_one(&self, predicate: &Predicate) -> Result<Option<Row>, DialogTableError>;

    /// Every row matching `predicate`, sorted by `order` (ties broken by id)
    async fn select_many(
        &self,
        predicate: &Predicate,
        order: &[Order],
    ) -> Result<Vec<Row>, DialogTableError>;

    /// The largest non-null value of `column` over rows matching `predicate`
    async fn max(
        &self,
        column: Column,
        predicate: &Predicate,
    ) -> Result<Option<i64>, DialogTableError>;

    /// The number of rows matching `predicate`
    async fn count(&self, predicate: &Predicate) -> Result<u64, DialogTableError>;

    /// Insert a row, returning its generated identifier
    async fn insert(&mut self, row: NewRow) -> Result<NodeId, DialogTableError>;

    /// Apply `assignments` to every row matching `predicate`, returning the
    /// number of rows touched. Matching rows are chosen before any of them is
    /// written, and every assignment reads the row's pre-update values.
    async fn update_many(
        &mut self,
        predicate: &Predicate,
        assignments: &[Assignment],
    ) -> Result<u64, DialogTableError>;

    /// Remove every row matching `predicate`, returning the number removed
    async fn delete_many(&mut self, predicate: &Predicate) -> Result<u64, DialogTableError>;

    /// Make every write of this transaction visible
    async fn commit(self) -> Result<(), DialogTableError>;

    /// Discard every write of this transaction
    async fn rollback(self) -> Result<(), DialogTableError>;
}
