//! From-clause elements: roots and explicit joins.

use serde::{Deserialize, Serialize};

use crate::domain::path::NavigablePath;
use crate::domain::predicate::Predicate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

/// What an explicit join targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JoinTarget {
    /// Join along a mapped attribute (association or collection); the join
    /// predicate comes from the attribute's foreign key unless overridden.
    Attribute(NavigablePath),
    /// Join against an unrelated entity; the join predicate must be
    /// author-supplied (`on`), or absent for a cross join.
    Entity {
        entity: String,
        path: NavigablePath,
    },
}

impl JoinTarget {
    pub fn path(&self) -> &NavigablePath {
        match self {
            JoinTarget::Attribute(path) => path,
            JoinTarget::Entity { path, .. } => path,
        }
    }
}

/// One explicit join written in the query's from-clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FromJoin {
    pub kind: JoinKind,
    pub target: JoinTarget,
    pub alias: Option<String>,
    /// Explicit join predicate; resolved against the joined table group,
    /// so it is translated after the group is registered.
    pub on: Option<Predicate>,
    /// `join fetch`: the joined data also participates in result
    /// materialization. Only meaningful for attribute joins.
    pub fetched: bool,
    /// Nested explicit joins hanging off this one, processed depth-first.
    pub joins: Vec<FromJoin>,
}

impl FromJoin {
    pub fn attribute(kind: JoinKind, path: NavigablePath) -> Self {
        FromJoin {
            kind,
            target: JoinTarget::Attribute(path),
            alias: None,
            on: None,
            fetched: false,
            joins: Vec::new(),
        }
    }

    pub fn entity(kind: JoinKind, entity: impl Into<String>, path: NavigablePath) -> Self {
        FromJoin {
            kind,
            target: JoinTarget::Entity {
                entity: entity.into(),
                path,
            },
            alias: None,
            on: None,
            fetched: false,
            joins: Vec::new(),
        }
    }

    pub fn fetched(mut self) -> Self {
        self.fetched = true;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_on(mut self, predicate: Predicate) -> Self {
        self.on = Some(predicate);
        self
    }

    pub fn with_join(mut self, join: FromJoin) -> Self {
        self.joins.push(join);
        self
    }
}

/// One root of a query spec's from-clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FromRoot {
    pub entity: String,
    pub path: NavigablePath,
    pub alias: Option<String>,
    /// A correlated root refers to a same-named root of an enclosing scope
    /// instead of introducing a fresh row source.
    pub correlated: bool,
    pub joins: Vec<FromJoin>,
}

impl FromRoot {
    pub fn new(entity: impl Into<String>, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        FromRoot {
            entity: entity.into(),
            path: NavigablePath::root(alias.clone()),
            alias: Some(alias),
            correlated: false,
            joins: Vec::new(),
        }
    }

    pub fn correlated(entity: impl Into<String>, alias: impl Into<String>) -> Self {
        let mut root = Self::new(entity, alias);
        root.correlated = true;
        root
    }

    pub fn with_join(mut self, join: FromJoin) -> Self {
        self.joins.push(join);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FromClause {
    pub roots: Vec<FromRoot>,
}

impl FromClause {
    pub fn single(root: FromRoot) -> Self {
        FromClause { roots: vec![root] }
    }
}
