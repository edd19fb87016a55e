//! Domain statements and query parts.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::expr::Expression;
use crate::domain::from::FromClause;
use crate::domain::path::NavigablePath;
use crate::domain::predicate::Predicate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetOperator {
    Union,
    UnionAll,
    Intersect,
    Except,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub expression: Expression,
    pub alias: Option<String>,
}

impl Selection {
    pub fn of(expression: Expression) -> Self {
        Selection {
            expression,
            alias: None,
        }
    }

    pub fn aliased(expression: Expression, alias: impl Into<String>) -> Self {
        Selection {
            expression,
            alias: Some(alias.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    pub expression: Expression,
    pub descending: bool,
    pub nulls_first: bool,
}

impl SortSpec {
    pub fn ascending(expression: Expression) -> Self {
        SortSpec {
            expression,
            descending: false,
            nulls_first: false,
        }
    }
}

/// A single select/from/where/group/having/order/offset/fetch block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuerySpec {
    pub from: FromClause,
    pub distinct: bool,
    pub selections: Vec<Selection>,
    pub predicate: Option<Predicate>,
    pub group_by: Vec<Expression>,
    pub having: Option<Predicate>,
    pub order_by: Vec<SortSpec>,
    pub offset: Option<Expression>,
    pub fetch: Option<Expression>,
}

/// An ordered combination of query parts under one set operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryGroup {
    pub operator: SetOperator,
    pub parts: Vec<QueryPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryPart {
    Spec(QuerySpec),
    Group(QueryGroup),
}

impl QueryPart {
    /// The first query spec in document order; every query part contains
    /// at least one.
    pub fn first_spec(&self) -> Option<&QuerySpec> {
        match self {
            QueryPart::Spec(spec) => Some(spec),
            QueryPart::Group(group) => group.parts.first().and_then(QueryPart::first_spec),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub target: NavigablePath,
    pub value: Expression,
}

/// Fetch style requested by an applied fetch graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchStyleHint {
    Join,
    Select,
}

impl Default for FetchStyleHint {
    fn default() -> Self {
        FetchStyleHint::Join
    }
}

/// One node of an explicitly applied fetch graph: which attribute to fetch,
/// how, and what to fetch beneath it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FetchGraphNode {
    pub children: HashMap<String, (FetchStyleHint, FetchGraphNode)>,
}

/// An explicitly supplied fetch graph for the statement's result entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppliedFetchGraph {
    pub root: FetchGraphNode,
}

impl AppliedFetchGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a join-fetched attribute path (dotted) to the graph.
    pub fn join(mut self, dotted: &str) -> Self {
        self.add(dotted, FetchStyleHint::Join);
        self
    }

    /// Add a select-fetched attribute path (dotted) to the graph.
    pub fn select(mut self, dotted: &str) -> Self {
        self.add(dotted, FetchStyleHint::Select);
        self
    }

    fn add(&mut self, dotted: &str, style: FetchStyleHint) {
        let mut node = &mut self.root;
        for part in dotted.split('.') {
            let entry = node
                .children
                .entry(part.to_string())
                .or_insert_with(|| (style, FetchGraphNode::default()));
            entry.0 = style;
            node = &mut entry.1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Select {
        query: QueryPart,
        /// Result entity whose fetch graph is planned after translation of
        /// the query part; `None` for scalar selections.
        result_entity: Option<String>,
    },
    InsertSelect {
        target: String,
        target_paths: Vec<NavigablePath>,
        source: QueryPart,
    },
    InsertValues {
        target: String,
        target_paths: Vec<NavigablePath>,
        values: Vec<Vec<Expression>>,
    },
    Update {
        target: String,
        alias: String,
        assignments: Vec<Assignment>,
        predicate: Option<Predicate>,
    },
    Delete {
        target: String,
        alias: String,
        predicate: Option<Predicate>,
    },
}
