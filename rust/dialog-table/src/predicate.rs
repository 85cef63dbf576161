use std::{cmp::Ordering, fmt::Display};

use serde::{Deserialize, Serialize};

use crate::Row;

/// The structural columns of a nested-set table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    /// Row identifier
    Id,
    /// Parent reference, nullable
    ParentId,
    /// Left interval bound
    Lft,
    /// Right interval bound
    Rgt,
    /// Number of proper ancestors
    Depth,
}

impl Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Column::Id => "id",
            Column::ParentId => "parent_id",
            Column::Lft => "lft",
            Column::Rgt => "rgt",
            Column::Depth => "depth",
        };
        write!(f, "{name}")
    }
}

impl Column {
    /// `column = value`
    pub fn equals(self, value: impl Into<i64>) -> Predicate {
        self.compare(Comparison::Eq, value.into())
    }

    /// `column > value`
    pub fn gt(self, value: i64) -> Predicate {
        self.compare(Comparison::Gt, value)
    }

    /// `column >= value`
    pub fn ge(self, value: i64) -> Predicate {
        self.compare(Comparison::Ge, value)
    }

    /// `column < value`
    pub fn lt(self, value: i64) -> Predicate {
        self.compare(Comparison::Lt, value)
    }

    /// `column <= value`
    pub fn le(self, value: i64) -> Predicate {
        self.compare(Comparison::Le, value)
    }

    /// `column IS NULL`
    pub fn is_null(self) -> Predicate {
        Predicate::IsNull(self)
    }

    /// `column = column + delta`
    pub fn shift(self, delta: i64) -> Assignment {
        Assignment {
            column: self,
            expression: Expression::Add(delta),
        }
    }

    /// `column = -column + offset`
    pub fn reflect(self, offset: i64) -> Assignment {
        Assignment {
            column: self,
            expression: Expression::Reflect(offset),
        }
    }

    /// `column = value`
    pub fn set(self, value: Option<i64>) -> Assignment {
        Assignment {
            column: self,
            expression: Expression::Set(value),
        }
    }

    /// Ascending [`Order`] on this column
    pub fn ascending(self) -> Order {
        Order {
            column: self,
            direction: Direction::Ascending,
        }
    }

    /// Descending [`Order`] on this column
    pub fn descending(self) -> Order {
        Order {
            column: self,
            direction: Direction::Descending,
        }
    }

    fn compare(self, comparison: Comparison, value: i64) -> Predicate {
        Predicate::Compare {
            column: self,
            comparison,
            value,
        }
    }
}

/// Binary comparison operators available to a [`Predicate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    /// `=`
    Eq,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
}

impl Comparison {
    fn holds(self, left: i64, right: i64) -> bool {
        match self {
            Comparison::Eq => left == right,
            Comparison::Gt => left > right,
            Comparison::Ge => left >= right,
            Comparison::Lt => left < right,
            Comparison::Le => left <= right,
        }
    }
}

/// A row filter. Comparisons against `NULL` never hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Matches every row
    All,
    /// `column <comparison> value`
    Compare {
        /// Column on the left-hand side
        column: Column,
        /// Operator
        comparison: Comparison,
        /// Constant on the right-hand side
        value: i64,
    },
    /// `column IS NULL`
    IsNull(Column),
    /// Every inner predicate holds
    And(Vec<Predicate>),
}

impl Predicate {
    /// Conjunction of `self` and `other`
    pub fn and(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::All, other) => other,
            (this, Predicate::All) => this,
            (Predicate::And(mut left), Predicate::And(right)) => {
                left.extend(right);
                Predicate::And(left)
            }
            (Predicate::And(mut left), other) => {
                left.push(other);
                Predicate::And(left)
            }
            (this, other) => Predicate::And(vec![this, other]),
        }
    }

    /// Whether `row` satisfies this predicate
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Predicate::All => true,
            Predicate::Compare {
                column,
                comparison,
                value,
            } => row
                .get(*column)
                .is_some_and(|current| comparison.holds(current, *value)),
            Predicate::IsNull(column) => row.get(*column).is_none(),
            Predicate::And(predicates) => predicates.iter().all(|inner| inner.matches(row)),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Smallest first
    Ascending,
    /// Largest first
    Descending,
}

/// One key of an `ORDER BY` clause. `NULL` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Sort key
    pub column: Column,
    /// Sort direction
    pub direction: Direction,
}

impl Order {
    /// Compare two rows on every key of `orders` in turn, falling back to
    /// `id` so that the result is total
    pub fn compare(orders: &[Order], left: &Row, right: &Row) -> Ordering {
        orders
            .iter()
            .map(|order| {
                let ordering = left.get(order.column).cmp(&right.get(order.column));
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| left.id.cmp(&right.id))
    }
}

/// The right-hand side of an [`Assignment`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expression {
    /// `column + delta`
    Add(i64),
    /// `-column + offset`
    Reflect(i64),
    /// A constant
    Set(Option<i64>),
}

impl Expression {
    /// Evaluate against the current column value
    pub fn evaluate(&self, current: Option<i64>) -> Option<i64> {
        match self {
            Expression::Add(delta) => current.map(|value| value + delta),
            Expression::Reflect(offset) => current.map(|value| offset - value),
            Expression::Set(value) => *value,
        }
    }
}

/// `column = expression`, one clause of a bulk update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// The column written
    pub column: Column,
    /// The value computed from the row's pre-update state
    pub expression: Expression,
}
