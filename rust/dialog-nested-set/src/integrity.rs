use std::fmt::Display;

use dialog_table::{
    Column, DialogTableError, NodeId, Predicate, Row, TableTransaction,
};
use serde::{Deserialize, Serialize};

/// A broken nested-set invariant found by [inspect]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// `lft` is not strictly below `rgt`
    InvertedInterval {
        /// Offending node
        id: NodeId,
        /// Its left bound
        lft: i64,
        /// Its right bound
        rgt: i64,
    },
    /// `rgt - lft` is even, so the interval cannot hold whole nodes
    EvenWidth {
        /// Offending node
        id: NodeId,
        /// Its left bound
        lft: i64,
        /// Its right bound
        rgt: i64,
    },
    /// A bound is negative, as left behind by an interrupted subtree move
    NegativeBound {
        /// Offending node
        id: NodeId,
    },
    /// The interval claims a different number of nodes than it encloses
    SizeMismatch {
        /// Offending node
        id: NodeId,
        /// `(rgt - lft + 1) / 2`
        expected: i64,
        /// Nodes actually enclosed, itself included
        actual: i64,
    },
    /// Two intervals overlap without one containing the other
    Overlap {
        /// The node with the smaller `lft`
        left: NodeId,
        /// The node reaching past `left`'s right bound
        right: NodeId,
    },
    /// `depth` differs from the number of enclosing intervals
    DepthMismatch {
        /// Offending node
        id: NodeId,
        /// Number of enclosing intervals
        expected: i64,
        /// Stored depth
        actual: i64,
    },
    /// `parent_id` is not the nearest enclosing interval
    ParentMismatch {
        /// Offending node
        id: NodeId,
        /// Nearest enclosing node
        expected: Option<NodeId>,
        /// Stored parent
        actual: Option<NodeId>,
    },
    /// The bounds are not exactly `1..=2n`
    Gap {
        /// The bound expected at this position
        expected: i64,
        /// The bound found there
        found: i64,
    },
}

impl Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::InvertedInterval { id, lft, rgt } => {
                write!(f, "node {id} has inverted interval [{lft}, {rgt}]")
            }
            Violation::EvenWidth { id, lft, rgt } => {
                write!(f, "node {id} has even-width interval [{lft}, {rgt}]")
            }
            Violation::NegativeBound { id } => write!(f, "node {id} has a negative bound"),
            Violation::SizeMismatch {
                id,
                expected,
                actual,
            } => write!(
                f,
                "node {id} spans {expected} nodes but encloses {actual}"
            ),
            Violation::Overlap { left, right } => {
                write!(f, "nodes {left} and {right} partially overlap")
            }
            Violation::DepthMismatch {
                id,
                expected,
                actual,
            } => write!(f, "node {id} has depth {actual}, expected {expected}"),
            Violation::ParentMismatch {
                id,
                expected,
                actual,
            } => write!(
                f,
                "node {id} has parent {}, expected {}",
                describe(actual),
                describe(expected)
            ),
            Violation::Gap { expected, found } => {
                write!(f, "bound {expected} expected but {found} found")
            }
        }
    }
}

fn describe(parent: &Option<NodeId>) -> String {
    parent
        .map(|parent| parent.to_string())
        .unwrap_or_else(|| "none".into())
}

/// Check `rows` against every nested-set invariant, returning each violation
/// found. An empty result means the rows form a valid forest.
pub fn inspect(rows: &[Row]) -> Vec<Violation> {
    let mut violations = Vec::new();

    let mut sorted: Vec<&Row> = rows.iter().collect();
    sorted.sort_by_key(|row| (row.lft, row.id));
    let lefts: Vec<i64> = sorted.iter().map(|row| row.lft).collect();

    for row in &sorted {
        if row.lft < 0 || row.rgt < 0 {
            violations.push(Violation::NegativeBound { id: row.id });
        }
        if row.lft >= row.rgt {
            violations.push(Violation::InvertedInterval {
                id: row.id,
                lft: row.lft,
                rgt: row.rgt,
            });
            continue;
        }
        if (row.rgt - row.lft) % 2 == 0 {
            violations.push(Violation::EvenWidth {
                id: row.id,
                lft: row.lft,
                rgt: row.rgt,
            });
            continue;
        }

        let enclosed = lefts.partition_point(|lft| *lft < row.rgt)
            - lefts.partition_point(|lft| *lft <= row.lft);
        let expected = (row.rgt - row.lft + 1) / 2;
        let actual = enclosed as i64 + 1;
        if expected != actual {
            violations.push(Violation::SizeMismatch {
                id: row.id,
                expected,
                actual,
            });
        }
    }

    let mut enclosing: Vec<&Row> = Vec::new();
    for row in &sorted {
        while enclosing.last().is_some_and(|open| open.rgt < row.lft) {
            enclosing.pop();
        }
        if let Some(open) = enclosing.last() {
            if row.rgt > open.rgt {
                violations.push(Violation::Overlap {
                    left: open.id,
                    right: row.id,
                });
            }
        }

        let parent = enclosing.last().map(|open| open.id);
        if row.parent_id != parent {
            violations.push(Violation::ParentMismatch {
                id: row.id,
                expected: parent,
                actual: row.parent_id,
            });
        }
        let depth = enclosing.len() as i64;
        if row.depth != depth {
            violations.push(Violation::DepthMismatch {
                id: row.id,
                expected: depth,
                actual: row.depth,
            });
        }

        enclosing.push(row);
    }

    let mut bounds: Vec<i64> = rows.iter().flat_map(|row| [row.lft, row.rgt]).collect();
    bounds.sort_unstable();
    if let Some((position, found)) = bounds
        .iter()
        .enumerate()
        .find(|(position, bound)| **bound != *position as i64 + 1)
    {
        violations.push(Violation::Gap {
            expected: position as i64 + 1,
            found: *found,
        });
    }

    violations
}

/// Read the whole table through `transaction` and [inspect] it
pub(crate) async fn verify<Transaction>(
    transaction: &Transaction,
) -> Result<Vec<Violation>, DialogTableError>
where
    Transaction: TableTransaction,
{
    let rows = transaction
        .select_many(&Predicate::All, &[Column::Lft.ascending()])
        .await?;
    Ok(inspect(&rows))
}

#[cfg(test)]
mod tests {
    use dialog_table::Payload;

    use super::*;

    fn row(id: i64, parent: Option<i64>, lft: i64, rgt: i64, depth: i64) -> Row {
        Row {
            id: NodeId(id),
            parent_id: parent.map(NodeId),
            lft,
            rgt,
            depth,
            payload: Payload::default(),
        }
    }

    #[test]
    fn it_accepts_a_valid_forest() {
        let rows = vec![
            row(1, None, 1, 6, 0),
            row(2, Some(1), 2, 3, 1),
            row(3, Some(1), 4, 5, 1),
            row(4, None, 7, 8, 0),
        ];

        assert_eq!(inspect(&rows), vec![]);
        assert_eq!(inspect(&[]), vec![]);
    }

    #[test]
    fn it_reports_a_leftover_gap() {
        let rows = vec![
            row(1, None, 1, 8, 0),
            row(3, Some(1), 4, 7, 1),
            row(2, Some(3), 5, 6, 2),
        ];

        let violations = inspect(&rows);

        assert!(violations.contains(&Violation::SizeMismatch {
            id: NodeId(1),
            expected: 4,
            actual: 3,
        }));
        assert!(violations.contains(&Violation::Gap {
            expected: 2,
            found: 4,
        }));
    }

    #[test]
    fn it_reports_partial_overlaps_and_wrong_parents() {
        let rows = vec![
            row(1, None, 1, 4, 0),
            row(2, Some(1), 3, 6, 1),
            row(3, Some(1), 5, 2, 1),
        ];

        let violations = inspect(&rows);

        assert!(violations.contains(&Violation::Overlap {
            left: NodeId(1),
            right: NodeId(2),
        }));
        assert!(violations.contains(&Violation::InvertedInterval {
            id: NodeId(3),
            lft: 5,
            rgt: 2,
        }));
    }

    #[test]
    fn it_reports_stale_depth_and_parent() {
        let rows = vec![
            row(1, None, 1, 4, 0),
            row(2, None, 2, 3, 0),
        ];

        assert_eq!(
            inspect(&rows),
            vec![
                Violation::ParentMismatch {
                    id: NodeId(2),
                    expected: Some(NodeId(1)),
                    actual: None,
                },
                Violation::DepthMismatch {
                    id: NodeId(2),
                    expected: 1,
                    actual: 0,
                },
            ]
        );
    }

    #[test]
    fn it_reports_negative_markers() {
        let rows = vec![row(1, None, -2, -1, 0)];

        assert!(inspect(&rows).contains(&Violation::NegativeBound { id: NodeId(1) }));
    }
}
