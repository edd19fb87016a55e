//! The from-clause index: one symbol table per lexical scope.
//!
//! Scopes form an arena with parent indices rather than a linked stack of
//! owned objects; lookup walks parent indices until a binding is found.
//! Entering a subquery or set-operation branch pushes a scope, leaving pops
//! it; the pop is closure-guarded in the translator so an error mid-subquery
//! still leaves the stack balanced.

use std::collections::HashMap;

use crate::domain::path::NavigablePath;
use crate::relational::{SqlPredicate, TableGroupId};
use crate::translator::errors::TranslationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    bindings: HashMap<NavigablePath, TableGroupId>,
    /// Predicates synthesized during from-clause processing (correlation
    /// restrictions) to be ANDed into the owning query spec's where clause.
    restrictions: Vec<SqlPredicate>,
}

#[derive(Debug)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
    stack: Vec<ScopeId>,
}

impl ScopeArena {
    /// Create the arena with the outermost scope already entered.
    pub fn new() -> Self {
        ScopeArena {
            scopes: vec![Scope::default()],
            stack: vec![ScopeId(0)],
        }
    }

    pub fn current(&self) -> ScopeId {
        *self
            .stack
            .last()
            .expect("scope stack is never empty by construction")
    }

    pub fn push(&mut self) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            parent: Some(self.current()),
            bindings: HashMap::new(),
            restrictions: Vec::new(),
        });
        self.stack.push(id);
        id
    }

    pub fn pop(&mut self) {
        debug_assert!(self.stack.len() > 1, "cannot pop the outermost scope");
        self.stack.pop();
    }

    /// Bind `path` to `group` in the current scope. Rebinding the same path
    /// to the same group is a no-op (idempotent resolution); rebinding to a
    /// different group is a translator bug.
    pub fn register(
        &mut self,
        path: NavigablePath,
        group: TableGroupId,
    ) -> Result<(), TranslationError> {
        let scope = self.current();
        let bindings = &mut self.scopes[scope.0].bindings;
        if let Some(existing) = bindings.get(&path) {
            if *existing != group {
                return Err(TranslationError::Internal(format!(
                    "path `{}` already bound to a different table group in this scope",
                    path
                )));
            }
            return Ok(());
        }
        log::trace!("scope {:?}: register `{}` -> {:?}", scope, path, group);
        bindings.insert(path, group);
        Ok(())
    }

    /// Look up a path in the current scope, then recursively in enclosing
    /// scopes (correlated references).
    pub fn resolve(&self, path: &NavigablePath) -> Option<TableGroupId> {
        let mut scope = Some(self.current());
        while let Some(id) = scope {
            if let Some(group) = self.scopes[id.0].bindings.get(path) {
                return Some(*group);
            }
            scope = self.scopes[id.0].parent;
        }
        None
    }

    /// Look up a path in enclosing scopes only, skipping the current one.
    /// Used to resolve what a correlated root correlates to.
    pub fn resolve_in_parent(&self, path: &NavigablePath) -> Option<TableGroupId> {
        let mut scope = self.scopes[self.current().0].parent;
        while let Some(id) = scope {
            if let Some(group) = self.scopes[id.0].bindings.get(path) {
                return Some(*group);
            }
            scope = self.scopes[id.0].parent;
        }
        None
    }

    pub fn resolve_in_current(&self, path: &NavigablePath) -> Option<TableGroupId> {
        self.scopes[self.current().0].bindings.get(path).copied()
    }

    pub fn add_restriction(&mut self, predicate: SqlPredicate) {
        let scope = self.current();
        self.scopes[scope.0].restrictions.push(predicate);
    }

    /// Drain the restrictions accumulated in the current scope.
    pub fn take_restrictions(&mut self) -> Vec<SqlPredicate> {
        let scope = self.current();
        std::mem::take(&mut self.scopes[scope.0].restrictions)
    }
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}
