use std::{collections::BTreeMap, fmt::Display};

use serde::{Deserialize, Serialize};

use crate::{Column, DialogTableError};

/// Opaque, caller-defined key/value data carried by every row
pub type Payload = BTreeMap<String, serde_json::Value>;

/// The identifier a backend generates for each inserted row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for NodeId {
    fn from(value: i64) -> Self {
        NodeId(value)
    }
}

impl From<NodeId> for i64 {
    fn from(value: NodeId) -> Self {
        value.0
    }
}

/// A single row of a nested-set table.
///
/// `lft` and `rgt` are signed: mutations may park rows on negative values
/// while a subtree is in transit inside a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Backend-generated identifier
    pub id: NodeId,
    /// The enclosing row, `None` for roots
    pub parent_id: Option<NodeId>,
    /// Left interval bound
    pub lft: i64,
    /// Right interval bound
    pub rgt: i64,
    /// Number of proper ancestors
    pub depth: i64,
    /// Caller data
    #[serde(default)]
    pub payload: Payload,
}

impl Row {
    /// Read the value held in `column`; `None` stands for SQL `NULL`
    pub fn get(&self, column: Column) -> Option<i64> {
        match column {
            Column::Id => Some(self.id.0),
            Column::ParentId => self.parent_id.map(|parent| parent.0),
            Column::Lft => Some(self.lft),
            Column::Rgt => Some(self.rgt),
            Column::Depth => Some(self.depth),
        }
    }

    /// Write `value` into `column`
    pub fn set(&mut self, column: Column, value: Option<i64>) -> Result<(), DialogTableError> {
        match (column, value) {
            (Column::Id, _) => {
                return Err(DialogTableError::InvalidAssignment(
                    "the id column is immutable".into(),
                ));
            }
            (Column::ParentId, value) => self.parent_id = value.map(NodeId),
            (Column::Lft, Some(value)) => self.lft = value,
            (Column::Rgt, Some(value)) => self.rgt = value,
            (Column::Depth, Some(value)) => self.depth = value,
            (column, None) => {
                return Err(DialogTableError::InvalidAssignment(format!(
                    "{column} cannot be null"
                )));
            }
        }
        Ok(())
    }
}

/// A row that has not been assigned an identifier yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRow {
    /// The enclosing row, `None` for roots
    pub parent_id: Option<NodeId>,
    /// Left interval bound
    pub lft: i64,
    /// Right interval bound
    pub rgt: i64,
    /// Number of proper ancestors
    pub depth: i64,
    /// Caller data
    pub payload: Payload,
}

impl NewRow {
    /// Attach the generated `id`, producing a complete [`Row`]
    pub fn identify(self, id: NodeId) -> Row {
        Row {
            id,
            parent_id: self.parent_id,
            lft: self.lft,
            rgt: self.rgt,
            depth: self.depth,
            payload: self.payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        NewRow {
            parent_id: None,
            lft: 1,
            rgt: 2,
            depth: 0,
            payload: Payload::default(),
        }
        .identify(NodeId(7))
    }

    #[test]
    fn it_reads_null_parent_as_none() {
        let row = row();
        assert_eq!(row.get(Column::ParentId), None);
        assert_eq!(row.get(Column::Id), Some(7));
    }

    #[test]
    fn it_refuses_to_overwrite_the_id() {
        let mut row = row();
        assert!(row.set(Column::Id, Some(3)).is_err());
        assert!(row.set(Column::Lft, None).is_err());
        row.set(Column::ParentId, Some(3)).unwrap();
        assert_eq!(row.parent_id, Some(NodeId(3)));
    }
}
