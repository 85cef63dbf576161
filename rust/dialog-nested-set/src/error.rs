use dialog_table::{DialogTableError, NodeId};
use thiserror::Error;

/// The common error type used by this crate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DialogNestedSetError {
    /// A node the operation positions itself against does not exist
    #[error("Node {0} not found")]
    NotFound(NodeId),

    /// The operation would break the tree (self-move, move into own subtree,
    /// delete with children without cascade, unrepairable parent references)
    #[error("Invalid tree operation: {0}")]
    InvalidOperation(String),

    /// A mutation could not be applied; its transaction has been rolled back
    #[error("Tree write failed: {0}")]
    WriteFailure(String),

    /// A read-only operation could not complete
    #[error("Tree read failed: {0}")]
    ReadFailure(String),

    /// A mutation left the tree violating its invariants and was rolled back
    #[error("Tree became inconsistent: {0}")]
    Inconsistent(String),
}

impl DialogNestedSetError {
    pub(crate) fn write(error: DialogTableError) -> Self {
        DialogNestedSetError::WriteFailure(format!("{error}"))
    }

    pub(crate) fn read(error: DialogTableError) -> Self {
        DialogNestedSetError::ReadFailure(format!("{error}"))
    }
}

/// Table errors raised while mutating surface as [DialogNestedSetError::WriteFailure];
/// read-only operations map them to [DialogNestedSetError::ReadFailure] explicitly.
impl From<DialogTableError> for DialogNestedSetError {
    fn from(value: DialogTableError) -> Self {
        DialogNestedSetError::write(value)
    }
}
