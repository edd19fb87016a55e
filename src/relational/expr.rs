//! Relational expressions and predicates.
//!
//! These nodes address physical structure (table aliases, columns, JDBC
//! type descriptors) and are what the downstream SQL renderer consumes.

use serde::{Deserialize, Serialize};

use crate::domain::expr::{Literal, ParameterId, TemporalUnit};
use crate::domain::predicate::{ComparisonOp, JunctionKind};
use crate::metamodel::JdbcType;
use crate::relational::SqlQuerySpec;

/// A column of one table reference, addressed by the reference's alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnReference {
    pub table_alias: String,
    pub column: String,
    pub jdbc: JdbcType,
}

/// One execution-time placeholder.
///
/// `index` is the zero-based position within the owning parameter's
/// placeholder list; a scalar parameter has exactly one placeholder with
/// index 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    pub parameter: ParameterId,
    pub index: usize,
    pub jdbc: Option<JdbcType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlCaseExpression {
    Simple {
        operand: Box<SqlExpression>,
        branches: Vec<(SqlExpression, SqlExpression)>,
        otherwise: Option<Box<SqlExpression>>,
    },
    Searched {
        branches: Vec<(SqlPredicate, SqlExpression)>,
        otherwise: Option<Box<SqlExpression>>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlExpression {
    Column(ColumnReference),

    /// Tuple of columns produced by an embedded or composite-valued path.
    ColumnTuple(Vec<ColumnReference>),

    Literal(Literal),

    Placeholder(Placeholder),

    Arithmetic {
        op: crate::domain::expr::BinaryArithmeticOp,
        lhs: Box<SqlExpression>,
        rhs: Box<SqlExpression>,
    },

    Negated(Box<SqlExpression>),

    Function {
        name: String,
        args: Vec<SqlExpression>,
        jdbc: Option<JdbcType>,
    },

    Case(Box<SqlCaseExpression>),

    Tuple(Vec<SqlExpression>),

    Subquery(Box<SqlQuerySpec>),

    /// Vendor-neutral "add N units to a timestamp" primitive.
    AddInterval {
        timestamp: Box<SqlExpression>,
        magnitude: Box<SqlExpression>,
        unit: TemporalUnit,
    },

    /// Vendor-neutral "difference of two timestamps in N units" primitive.
    DiffInterval {
        unit: TemporalUnit,
        start: Box<SqlExpression>,
        end: Box<SqlExpression>,
    },

    /// Converts a duration magnitude from one unit to another.
    UnitConversion {
        magnitude: Box<SqlExpression>,
        from: TemporalUnit,
        to: TemporalUnit,
    },
}

impl SqlExpression {
    pub fn integer(value: i64) -> Self {
        SqlExpression::Literal(Literal::Integer(value))
    }

    /// The resolved JDBC type of this expression, when locally known.
    pub fn jdbc(&self) -> Option<JdbcType> {
        match self {
            SqlExpression::Column(column) => Some(column.jdbc),
            SqlExpression::Placeholder(placeholder) => placeholder.jdbc,
            SqlExpression::Literal(Literal::Integer(_)) => Some(JdbcType::BigInt),
            SqlExpression::Literal(Literal::Float(_)) => Some(JdbcType::Double),
            SqlExpression::Literal(Literal::Boolean(_)) => Some(JdbcType::Boolean),
            SqlExpression::Literal(Literal::String(_)) => Some(JdbcType::Varchar),
            SqlExpression::Literal(Literal::Null) => None,
            SqlExpression::Function { jdbc, .. } => *jdbc,
            SqlExpression::Arithmetic { lhs, rhs, .. } => lhs.jdbc().or_else(|| rhs.jdbc()),
            SqlExpression::Negated(inner) => inner.jdbc(),
            SqlExpression::AddInterval { timestamp, .. } => timestamp.jdbc(),
            SqlExpression::DiffInterval { .. } | SqlExpression::UnitConversion { .. } => {
                Some(JdbcType::BigInt)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlPredicate {
    Comparison {
        op: ComparisonOp,
        lhs: SqlExpression,
        rhs: SqlExpression,
    },

    Between {
        expr: SqlExpression,
        lower: SqlExpression,
        upper: SqlExpression,
        negated: bool,
    },

    Like {
        expr: SqlExpression,
        pattern: SqlExpression,
        escape: Option<SqlExpression>,
        negated: bool,
    },

    NullCheck {
        expr: SqlExpression,
        negated: bool,
    },

    InList {
        expr: SqlExpression,
        items: Vec<SqlExpression>,
        negated: bool,
    },

    InSubquery {
        expr: SqlExpression,
        subquery: Box<SqlQuerySpec>,
        negated: bool,
    },

    Exists {
        subquery: Box<SqlQuerySpec>,
        negated: bool,
    },

    Junction {
        kind: JunctionKind,
        predicates: Vec<SqlPredicate>,
    },

    Negation(Box<SqlPredicate>),

    Grouping(Box<SqlPredicate>),

    /// Degenerate always-true predicate.
    ConstantTrue,

    /// Degenerate always-false predicate (e.g. an IN over an empty
    /// expanded list).
    ConstantFalse,
}

impl SqlPredicate {
    pub fn equal(lhs: SqlExpression, rhs: SqlExpression) -> Self {
        SqlPredicate::Comparison {
            op: ComparisonOp::Equal,
            lhs,
            rhs,
        }
    }

    /// AND-combine, collapsing the empty and one-element cases.
    pub fn conjunction(mut parts: Vec<SqlPredicate>) -> Self {
        if parts.len() > 1 {
            SqlPredicate::Junction {
                kind: JunctionKind::Conjunction,
                predicates: parts,
            }
        } else {
            parts.pop().unwrap_or(SqlPredicate::ConstantTrue)
        }
    }

    /// AND this predicate onto an optional accumulator slot.
    pub fn combine_into(slot: &mut Option<SqlPredicate>, predicate: SqlPredicate) {
        *slot = Some(match slot.take() {
            None => predicate,
            Some(SqlPredicate::Junction {
                kind: JunctionKind::Conjunction,
                mut predicates,
            }) => {
                predicates.push(predicate);
                SqlPredicate::Junction {
                    kind: JunctionKind::Conjunction,
                    predicates,
                }
            }
            Some(existing) => SqlPredicate::Junction {
                kind: JunctionKind::Conjunction,
                predicates: vec![existing, predicate],
            },
        });
    }
}
