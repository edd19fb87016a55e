//! Domain predicates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::expr::Expression;
use crate::domain::path::NavigablePath;
use crate::domain::statement::QuerySpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            ComparisonOp::Equal => "=",
            ComparisonOp::NotEqual => "<>",
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessThanEqual => "<=",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterThanEqual => ">=",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JunctionKind {
    Conjunction,
    Disjunction,
}

/// The closed domain predicate grammar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Comparison {
        op: ComparisonOp,
        lhs: Expression,
        rhs: Expression,
    },

    Between {
        expr: Expression,
        lower: Expression,
        upper: Expression,
        negated: bool,
    },

    Like {
        expr: Expression,
        pattern: Expression,
        escape: Option<Expression>,
        negated: bool,
    },

    NullCheck {
        expr: Expression,
        negated: bool,
    },

    InList {
        expr: Expression,
        items: Vec<Expression>,
        negated: bool,
    },

    InSubquery {
        expr: Expression,
        subquery: Box<QuerySpec>,
        negated: bool,
    },

    Exists {
        subquery: Box<QuerySpec>,
        negated: bool,
    },

    /// `value member of owner.pluralAttribute`
    MemberOf {
        expr: Expression,
        plural_path: NavigablePath,
        negated: bool,
    },

    /// A boolean-valued expression used where a predicate is expected;
    /// translated as `expr = TRUE`.
    BooleanExpression(Expression),

    Junction {
        kind: JunctionKind,
        predicates: Vec<Predicate>,
    },

    Negation(Box<Predicate>),

    Grouping(Box<Predicate>),
}

impl Predicate {
    pub fn equal(lhs: Expression, rhs: Expression) -> Self {
        Predicate::Comparison {
            op: ComparisonOp::Equal,
            lhs,
            rhs,
        }
    }

    pub fn and(predicates: Vec<Predicate>) -> Self {
        Predicate::Junction {
            kind: JunctionKind::Conjunction,
            predicates,
        }
    }

    pub fn or(predicates: Vec<Predicate>) -> Self {
        Predicate::Junction {
            kind: JunctionKind::Disjunction,
            predicates,
        }
    }
}
