//! Domain expressions.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::path::NavigablePath;
use crate::domain::predicate::Predicate;
use crate::domain::statement::QuerySpec;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    Null,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(v) => write!(f, "{}", v),
            Literal::Float(v) => write!(f, "{}", v),
            Literal::Boolean(v) => write!(f, "{}", v),
            Literal::String(v) => write!(f, "'{}'", v),
            Literal::Null => write!(f, "null"),
        }
    }
}

/// Identity of a domain-level parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterId {
    Named(String),
    Positional(usize),
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterId::Named(name) => write!(f, ":{}", name),
            ParameterId::Positional(ordinal) => write!(f, "?{}", ordinal),
        }
    }
}

/// One occurrence of a parameter in the query tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterRef {
    pub id: ParameterId,
    /// Whether a collection value bound to this parameter may be expanded
    /// into multiple placeholders (IN-list expansion).
    pub allow_multi_valued: bool,
}

impl ParameterRef {
    pub fn named(name: impl Into<String>) -> Self {
        ParameterRef {
            id: ParameterId::Named(name.into()),
            allow_multi_valued: false,
        }
    }

    pub fn positional(ordinal: usize) -> Self {
        ParameterRef {
            id: ParameterId::Positional(ordinal),
            allow_multi_valued: false,
        }
    }

    pub fn multi_valued(mut self) -> Self {
        self.allow_multi_valued = true;
        self
    }
}

/// Value bound to a parameter at translation time.
///
/// Bindings are optional: a parameter with no bound value still translates,
/// its placeholder count falling back to its resolved value mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BoundValue {
    Scalar(Literal),
    List(Vec<Literal>),
}

/// Parameter values known at translation time, keyed by parameter identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterValues {
    values: HashMap<ParameterId, BoundValue>,
}

impl ParameterValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, id: ParameterId, value: BoundValue) {
        self.values.insert(id, value);
    }

    pub fn with(mut self, id: ParameterId, value: BoundValue) -> Self {
        self.bind(id, value);
        self
    }

    pub fn get(&self, id: &ParameterId) -> Option<&BoundValue> {
        self.values.get(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryArithmeticOp {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl fmt::Display for BinaryArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryArithmeticOp::Add => "+",
            BinaryArithmeticOp::Subtract => "-",
            BinaryArithmeticOp::Multiply => "*",
            BinaryArithmeticOp::Divide => "/",
            BinaryArithmeticOp::Modulo => "%",
        };
        write!(f, "{}", symbol)
    }
}

/// Calendar/time unit for duration arithmetic.
///
/// `Nanosecond` is the native granularity of a bare duration value; `Day`
/// is the native granularity when both operands of a diff are date-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemporalUnit {
    Nanosecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl fmt::Display for TemporalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TemporalUnit::Nanosecond => "nanosecond",
            TemporalUnit::Second => "second",
            TemporalUnit::Minute => "minute",
            TemporalUnit::Hour => "hour",
            TemporalUnit::Day => "day",
            TemporalUnit::Week => "week",
            TemporalUnit::Month => "month",
            TemporalUnit::Quarter => "quarter",
            TemporalUnit::Year => "year",
        };
        write!(f, "{}", text)
    }
}

/// A CASE expression, simple or searched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CaseExpression {
    /// `case operand when value then result ... else other end`
    Simple {
        operand: Box<Expression>,
        branches: Vec<(Expression, Expression)>,
        otherwise: Option<Box<Expression>>,
    },
    /// `case when predicate then result ... else other end`
    Searched {
        branches: Vec<(Predicate, Expression)>,
        otherwise: Option<Box<Expression>>,
    },
}

/// The closed domain expression grammar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Literal(Literal),

    Parameter(ParameterRef),

    /// Navigable path reference (attribute access rooted at a query root
    /// or correlation).
    Path(NavigablePath),

    Unary {
        op: UnaryArithmeticOp,
        operand: Box<Expression>,
    },

    Binary {
        op: BinaryArithmeticOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },

    Function {
        name: String,
        args: Vec<Expression>,
    },

    Case(CaseExpression),

    Tuple(Vec<Expression>),

    /// Scalar subquery.
    Subquery(Box<QuerySpec>),

    /// `to-duration(magnitude, unit)`: a literal "N units" duration.
    ToDuration {
        magnitude: Box<Expression>,
        unit: TemporalUnit,
    },

    /// `by-unit(duration, unit)`: converts a duration value into a plain
    /// number of the given unit.
    ByUnit {
        duration: Box<Expression>,
        unit: TemporalUnit,
    },
}

impl Expression {
    pub fn path(path: NavigablePath) -> Self {
        Expression::Path(path)
    }

    pub fn integer(value: i64) -> Self {
        Expression::Literal(Literal::Integer(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expression::Literal(Literal::String(value.into()))
    }

    pub fn binary(op: BinaryArithmeticOp, lhs: Expression, rhs: Expression) -> Self {
        Expression::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}
