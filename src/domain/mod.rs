//! The domain query tree: the immutable input of the translator.
//!
//! A domain query addresses entities and attributes by [`NavigablePath`],
//! never by table or column. The upstream parser (out of scope for this
//! crate) produces these trees; the translator only reads them.

pub mod expr;
pub mod from;
pub mod path;
pub mod predicate;
pub mod statement;

pub use expr::{
    BinaryArithmeticOp, BoundValue, CaseExpression, Expression, Literal, ParameterId,
    ParameterRef, ParameterValues, TemporalUnit, UnaryArithmeticOp,
};
pub use from::{FromClause, FromJoin, FromRoot, JoinKind, JoinTarget};
pub use path::{NavigablePath, PathSegment};
pub use predicate::{ComparisonOp, JunctionKind, Predicate};
pub use statement::{
    AppliedFetchGraph, Assignment, FetchGraphNode, FetchStyleHint, QueryGroup, QueryPart,
    QuerySpec, Selection, SetOperator, SortSpec, Statement,
};
