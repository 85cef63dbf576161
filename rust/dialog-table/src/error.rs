use thiserror::Error;

/// The common error type used by this crate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DialogTableError {
    /// A write was attempted inside a read-only transaction
    #[error("Cannot write inside a read-only transaction")]
    ReadOnlyTransaction,

    /// An assignment targeted a column that cannot take the given value
    #[error("Invalid assignment: {0}")]
    InvalidAssignment(String),

    /// An error that occurs when working with a table backend
    #[error("Table backend error: {0}")]
    Backend(String),

    /// A failure deliberately injected by a test backend
    #[error("Injected failure: {0}")]
    Injected(String),
}
