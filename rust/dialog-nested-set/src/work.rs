use dialog_table::{TableBackend, TableTransaction, TransactionMode};
use tracing::{debug, warn};

use crate::{DialogNestedSetError, NestedSetConfig, integrity};

/// Open the read-write transaction a mutation runs in
pub(crate) async fn begin_write<Backend>(
    backend: &Backend,
) -> Result<Backend::Transaction, DialogNestedSetError>
where
    Backend: TableBackend,
{
    Ok(backend.begin(TransactionMode::ReadWrite).await?)
}

/// Open the read-only transaction a query runs in
pub(crate) async fn begin_read<Backend>(
    backend: &Backend,
) -> Result<Backend::Transaction, DialogNestedSetError>
where
    Backend: TableBackend,
{
    backend
        .begin(TransactionMode::ReadOnly)
        .await
        .map_err(DialogNestedSetError::read)
}

/// Finish a mutation: commit when `outcome` succeeded (and, if configured,
/// the tree still verifies), otherwise roll everything back before handing
/// the error to the caller.
pub(crate) async fn settle<Transaction, T>(
    transaction: Transaction,
    outcome: Result<T, DialogNestedSetError>,
    config: &NestedSetConfig,
    operation: &'static str,
) -> Result<T, DialogNestedSetError>
where
    Transaction: TableTransaction,
{
    let outcome = match outcome {
        Ok(value) if config.verify_after_mutation => {
            match integrity::verify(&transaction).await {
                Ok(violations) if violations.is_empty() => Ok(value),
                Ok(violations) => Err(DialogNestedSetError::Inconsistent(
                    violations
                        .iter()
                        .map(|violation| violation.to_string())
                        .collect::<Vec<_>>()
                        .join("; "),
                )),
                Err(error) => Err(error.into()),
            }
        }
        outcome => outcome,
    };

    match outcome {
        Ok(value) => {
            transaction.commit().await?;
            debug!(operation, "Committed tree mutation");
            Ok(value)
        }
        Err(error) => {
            warn!(operation, %error, "Rolling back tree mutation");
            if let Err(rollback) = transaction.rollback().await {
                warn!(operation, %rollback, "Rollback reported an error");
            }
            Err(error)
        }
    }
}

/// Finish a query, releasing its snapshot
pub(crate) async fn conclude<Transaction, T>(
    transaction: Transaction,
    outcome: Result<T, DialogNestedSetError>,
) -> Result<T, DialogNestedSetError>
where
    Transaction: TableTransaction,
{
    match outcome {
        Ok(value) => {
            transaction
                .commit()
                .await
                .map_err(DialogNestedSetError::read)?;
            Ok(value)
        }
        Err(error) => {
            let _ = transaction.rollback().await;
            Err(error)
        }
    }
}
