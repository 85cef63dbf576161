#![warn(missing_docs)]

//! This crate contains the storage port that nested-set trees are maintained
//! through: a single relational table of [Row]s, reachable only inside
//! transactions opened on a [TableBackend].
//!
//! A transaction offers point and range selects, inserts with generated ids,
//! and bulk arithmetic updates and deletes driven by a [Predicate]:
//!
//! ```rust
//! # async fn example() -> Result<(), dialog_table::DialogTableError> {
//! use dialog_table::{
//!     Column, MemoryTableBackend, NewRow, Payload, TableBackend, TableTransaction,
//!     TransactionMode,
//! };
//!
//! let backend = MemoryTableBackend::default();
//! let mut transaction = backend.begin(TransactionMode::ReadWrite).await?;
//!
//! transaction
//!     .insert(NewRow {
//!         parent_id: None,
//!         lft: 1,
//!         rgt: 2,
//!         depth: 0,
//!         payload: Payload::default(),
//!     })
//!     .await?;
//!
//! // Make room for two more interval positions at the right edge
//! transaction
//!     .update_many(&Column::Rgt.ge(2), &[Column::Rgt.shift(2)])
//!     .await?;
//!
//! transaction.commit().await?;
//! # Ok(())
//! # }
//! ```

mod error;
pub use error::*;

mod row;
pub use row::*;

mod predicate;
pub use predicate::*;

mod backend;
pub use backend::*;

#[cfg(any(test, feature = "helpers"))]
mod helpers;
#[cfg(any(test, feature = "helpers"))]
pub use helpers::*;
