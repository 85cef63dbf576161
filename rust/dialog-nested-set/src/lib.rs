#![warn(missing_docs)]

//! This crate maintains hierarchies inside a flat table using the nested-set
//! (modified preorder tree traversal) encoding: every node stores a `lft` /
//! `rgt` interval and a `depth`, chosen so that ancestry, descendance and
//! preorder position are all interval comparisons.
//!
//! Trees live in any [`dialog_table::TableBackend`]. Wrap one in a
//! [NestedSet] to read, mutate and repair them:
//!
//! ```rust
//! # async fn example() -> Result<(), dialog_nested_set::DialogNestedSetError> {
//! use dialog_nested_set::NestedSet;
//! use dialog_table::{MemoryTableBackend, Payload};
//!
//! let tree = NestedSet::new(MemoryTableBackend::default());
//!
//! let a = tree.insert_root(Payload::default()).await?;
//! let b = tree.insert_child(a, Payload::default()).await?;
//! let c = tree.insert_child(a, Payload::default()).await?;
//!
//! // Make `b` the last child of `c`
//! let b_moved = tree.move_subtree(b, c).await?;
//! assert_eq!(b_moved.depth, 2);
//!
//! assert!(tree.verify().await?.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! Every mutation runs in a single read-write transaction and is rolled back
//! in full on failure. The interval arithmetic is only sound with one writer
//! at a time per table; backends enforce that by serialising read-write
//! transactions.

mod error;
pub use error::*;

mod config;
pub use config::*;

mod node;
pub use node::*;

mod payload;
pub use payload::*;

mod integrity;
pub use integrity::{Violation, inspect};

mod work;

mod reader;
pub use reader::*;

mod mutator;
pub use mutator::*;

mod rebuilder;
pub use rebuilder::*;

mod nested_set;
pub use nested_set::*;
