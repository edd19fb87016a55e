//! The relational AST: the translator's output.
//!
//! Structure mirrors the domain query tree but addresses physical tables
//! and columns. Table groups live in a [`TableGroupArena`] and are
//! addressed by [`TableGroupId`] everywhere (joins, symbol tables, fetch
//! nodes), so the AST itself carries no shared ownership.

pub mod expr;

pub use expr::{ColumnReference, Placeholder, SqlCaseExpression, SqlExpression, SqlPredicate};

use serde::{Deserialize, Serialize};

use crate::domain::expr::ParameterId;
use crate::domain::path::NavigablePath;
use crate::domain::statement::SetOperator;
use crate::metamodel::FetchTiming;

/// Index of a table group within one translation's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableGroupId(pub usize);

/// One physical table occurrence with its rendering alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReference {
    pub table: String,
    pub alias: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlJoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableGroupJoin {
    pub kind: SqlJoinKind,
    pub joined: TableGroupId,
    pub predicate: Option<SqlPredicate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableGroupKind {
    /// A from-clause root.
    Root,
    /// Joined under another group (explicit or implicit join).
    Joined,
    /// A correlated root reusing the parent scope's group; no table of its
    /// own is ever rendered for it.
    Correlated { parent: TableGroupId },
}

/// One or more table references sharing one row-owning key: the primary
/// table of an entity plus its secondary tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableGroup {
    /// The navigable path that introduced this group.
    pub path: NavigablePath,
    /// Entity (or collection-element) type answered by this group.
    pub model_type: String,
    pub kind: TableGroupKind,
    pub primary: TableReference,
    pub secondary: Vec<TableReference>,
    pub joins: Vec<TableGroupJoin>,
    /// Whether rows of this group are guaranteed to exist for every row of
    /// the owning query (root, or reached through inner joins only).
    /// Drives the implicit-join inner-vs-left decision.
    pub guarantees_rows: bool,
}

impl TableGroup {
    /// The alias paths and predicates render against. A correlated group
    /// has no table of its own; callers resolve through the parent first.
    pub fn alias(&self) -> &str {
        &self.primary.alias
    }
}

/// Arena of all table groups created during one translation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableGroupArena {
    groups: Vec<TableGroup>,
}

impl TableGroupArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, group: TableGroup) -> TableGroupId {
        let id = TableGroupId(self.groups.len());
        self.groups.push(group);
        id
    }

    pub fn get(&self, id: TableGroupId) -> &TableGroup {
        &self.groups[id.0]
    }

    pub fn get_mut(&mut self, id: TableGroupId) -> &mut TableGroup {
        &mut self.groups[id.0]
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TableGroupId, &TableGroup)> {
        self.groups
            .iter()
            .enumerate()
            .map(|(index, group)| (TableGroupId(index), group))
    }

    /// Resolve through correlated groups to the group that actually owns
    /// table references.
    pub fn dereference(&self, id: TableGroupId) -> TableGroupId {
        match self.get(id).kind {
            TableGroupKind::Correlated { parent } => self.dereference(parent),
            _ => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlSelection {
    pub expression: SqlExpression,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlSortSpec {
    pub expression: SqlExpression,
    pub descending: bool,
    pub nulls_first: bool,
}

/// A fetch decision for one related attribute of a fetch parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fetch {
    /// Association role, `Entity.attribute` form; what error reports name.
    pub role: String,
    pub path: NavigablePath,
    pub timing: FetchTiming,
    pub joined: bool,
    /// The joined table group, when `joined` is true.
    pub table_group: Option<TableGroupId>,
    /// Set when this fetch is a back-reference to an ancestor of the fetch
    /// graph instead of a re-fetch (cycle termination).
    pub circular_reference: Option<NavigablePath>,
    pub children: Vec<Fetch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlQuerySpec {
    pub roots: Vec<TableGroupId>,
    pub distinct: bool,
    pub selections: Vec<SqlSelection>,
    pub predicate: Option<SqlPredicate>,
    pub group_by: Vec<SqlExpression>,
    pub having: Option<SqlPredicate>,
    pub order_by: Vec<SqlSortSpec>,
    pub offset: Option<SqlExpression>,
    pub fetch: Option<SqlExpression>,
    /// Fetch decisions for the statement's result entity; populated only
    /// on the top-level query spec of a select statement.
    pub fetches: Vec<Fetch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlQueryPart {
    Spec(Box<SqlQuerySpec>),
    Group {
        operator: SetOperator,
        parts: Vec<SqlQueryPart>,
    },
}

impl SqlQueryPart {
    pub fn first_spec(&self) -> Option<&SqlQuerySpec> {
        match self {
            SqlQueryPart::Spec(spec) => Some(spec),
            SqlQueryPart::Group { parts, .. } => parts.first().and_then(SqlQueryPart::first_spec),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlAssignment {
    pub column: ColumnReference,
    pub value: SqlExpression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlStatement {
    Select {
        query: SqlQueryPart,
    },
    InsertSelect {
        target: TableReference,
        columns: Vec<ColumnReference>,
        source: SqlQueryPart,
    },
    InsertValues {
        target: TableReference,
        columns: Vec<ColumnReference>,
        values: Vec<Vec<SqlExpression>>,
    },
    Update {
        target: TableGroupId,
        assignments: Vec<SqlAssignment>,
        predicate: Option<SqlPredicate>,
    },
    Delete {
        target: TableGroupId,
        predicate: Option<SqlPredicate>,
    },
}

/// One domain parameter occurrence mapped to its execution-time
/// placeholders, in binding order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterBinding {
    pub parameter: ParameterId,
    pub placeholders: Vec<Placeholder>,
}

/// The result of one `translate()` call, owned by the execution layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub statement: SqlStatement,
    pub table_groups: TableGroupArena,
    /// Parameter occurrences in translation order; execution supplies
    /// bound values in exactly this order.
    pub parameters: Vec<ParameterBinding>,
}
