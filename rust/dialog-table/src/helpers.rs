//! Test doubles for exercising failure paths of code built on a [TableBackend].

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::{
    Assignment, Column, DialogTableError, NewRow, NodeId, Order, Predicate, Row, TableBackend,
    TableTransaction, TransactionMode,
};

/// A failure that a [FaultyTableBackend] will produce once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Let `after` writes succeed inside the next read-write transaction, then
    /// fail the one that follows
    Write {
        /// Number of successful writes before the failing one
        after: usize,
    },
    /// Fail the commit of the next read-write transaction
    Commit,
}

#[derive(Default)]
struct Faults {
    pending: Mutex<Option<Fault>>,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

/// Wraps a [TableBackend], injecting a one-shot [Fault] and counting how
/// transactions end.
#[derive(Clone)]
pub struct FaultyTableBackend<Backend> {
    inner: Backend,
    faults: Arc<Faults>,
}

impl<Backend> FaultyTableBackend<Backend>
where
    Backend: TableBackend,
{
    /// Wrap `inner` without any pending fault
    pub fn new(inner: Backend) -> Self {
        Self {
            inner,
            faults: Arc::default(),
        }
    }

    /// Arm `fault` for the next read-write transaction
    pub fn inject(&self, fault: Fault) {
        *self.faults.pending.lock() = Some(fault);
    }

    /// The wrapped backend
    pub fn inner(&self) -> &Backend {
        &self.inner
    }

    /// Number of transactions committed through this wrapper
    pub fn commits(&self) -> usize {
        self.faults.commits.load(Ordering::SeqCst)
    }

    /// Number of transactions explicitly rolled back through this wrapper
    pub fn rollbacks(&self) -> usize {
        self.faults.rollbacks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<Backend> TableBackend for FaultyTableBackend<Backend>
where
    Backend: TableBackend,
{
    type Transaction = FaultyTableTransaction<Backend::Transaction>;

    async fn begin(&self, mode: TransactionMode) -> Result<Self::Transaction, DialogTableError> {
        let inner = self.inner.begin(mode).await?;
        let fault = match mode {
            TransactionMode::ReadOnly => None,
            TransactionMode::ReadWrite => self.faults.pending.lock().take(),
        };
        if let Some(fault) = fault {
            debug!(?fault, "Armed fault for transaction");
        }
        Ok(FaultyTableTransaction {
            inner,
            fault,
            writes: 0,
            faults: self.faults.clone(),
        })
    }
}

/// The [TableTransaction] of a [FaultyTableBackend]
pub struct FaultyTableTransaction<Transaction> {
    inner: Transaction,
    fault: Option<Fault>,
    writes: usize,
    faults: Arc<Faults>,
}

impl<Transaction> FaultyTableTransaction<Transaction> {
    fn write(&mut self) -> Result<(), DialogTableError> {
        let attempt = self.writes;
        self.writes += 1;
        match self.fault {
            Some(Fault::Write { after }) if attempt == after => Err(DialogTableError::Injected(
                format!("write #{} refused", attempt + 1),
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl<Transaction> TableTransaction for FaultyTableTransaction<Transaction>
where
    Transaction: TableTransaction,
{
    fn mode(&self) -> TransactionMode {
        self.inner.mode()
    }

    async fn select_one(&self, predicate: &Predicate) -> Result<Option<Row>, DialogTableError> {
        self.inner.select_one(predicate).await
    }

    async fn select_many(
        &self,
        predicate: &Predicate,
        order: &[Order],
    ) -> Result<Vec<Row>, DialogTableError> {
        self.inner.select_many(predicate, order).await
    }

    async fn max(
        &self,
        column: Column,
        predicate: &Predicate,
    ) -> Result<Option<i64>, DialogTableError> {
        self.inner.max(column, predicate).await
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64, DialogTableError> {
        self.inner.count(predicate).await
    }

    async fn insert(&mut self, row: NewRow) -> Result<NodeId, DialogTableError> {
        self.write()?;
        self.inner.insert(row).await
    }

    async fn update_many(
        &mut self,
        predicate: &Predicate,
        assignments: &[Assignment],
    ) -> Result<u64, DialogTableError> {
        self.write()?;
        self.inner.update_many(predicate, assignments).await
    }

    async fn delete_many(&mut self, predicate: &Predicate) -> Result<u64, DialogTableError> {
        self.write()?;
        self.inner.delete_many(predicate).await
    }

    async fn commit(self) -> Result<(), DialogTableError> {
        if self.fault == Some(Fault::Commit) {
            self.inner.rollback().await?;
            return Err(DialogTableError::Injected("commit refused".into()));
        }
        self.inner.commit().await?;
        self.faults.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self) -> Result<(), DialogTableError> {
        self.faults.rollbacks.fetch_add(1, Ordering::SeqCst);
        self.inner.rollback().await
    }
}
