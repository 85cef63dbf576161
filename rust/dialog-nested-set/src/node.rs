use dialog_table::{NodeId, Payload, Row};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tree node as stored in a nested-set table.
///
/// The interval `[lft, rgt]` encloses the intervals of every node in this
/// node's subtree, so ancestry and preorder position are both readable
/// without walking parent references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Backend-generated identifier
    pub id: NodeId,
    /// The parent node, `None` for roots
    pub parent_id: Option<NodeId>,
    /// Left interval bound
    pub lft: i64,
    /// Right interval bound
    pub rgt: i64,
    /// Number of proper ancestors; roots are at depth 0
    pub depth: i64,
    /// Caller data, untouched by tree operations
    pub payload: Payload,
}

impl Node {
    /// `rgt - lft + 1`, the number of interval positions the subtree occupies
    pub fn width(&self) -> i64 {
        self.rgt - self.lft + 1
    }

    /// Number of nodes in the subtree rooted here, this node included
    pub fn size(&self) -> i64 {
        self.width() / 2
    }

    /// Number of proper descendants
    pub fn descendant_count(&self) -> i64 {
        self.size() - 1
    }

    /// Whether this node has no parent
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Whether this node has no descendants
    pub fn is_leaf(&self) -> bool {
        self.rgt == self.lft + 1
    }

    /// Whether `other` lies within this node's interval (itself included)
    pub fn contains(&self, other: &Node) -> bool {
        self.lft <= other.lft && other.rgt <= self.rgt
    }

    /// Whether this node is a proper descendant of `other`
    pub fn is_descendant_of(&self, other: &Node) -> bool {
        other.lft < self.lft && self.rgt < other.rgt
    }

    /// The payload merged with the structural fields. Structural keys always
    /// win over payload keys of the same name.
    pub fn record(&self) -> Map<String, Value> {
        let mut record: Map<String, Value> = self
            .payload
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        record.insert("id".into(), Value::from(self.id.0));
        record.insert(
            "parent_id".into(),
            self.parent_id
                .map(|parent| Value::from(parent.0))
                .unwrap_or(Value::Null),
        );
        record.insert("lft".into(), Value::from(self.lft));
        record.insert("rgt".into(), Value::from(self.rgt));
        record.insert("depth".into(), Value::from(self.depth));
        record
    }
}

impl From<Row> for Node {
    fn from(row: Row) -> Self {
        Node {
            id: row.id,
            parent_id: row.parent_id,
            lft: row.lft,
            rgt: row.rgt,
            depth: row.depth,
            payload: row.payload,
        }
    }
}
