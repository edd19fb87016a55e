//! From-clause construction: roots, correlated subquery roots, and
//! explicit joins, registered depth-first so later clauses resolve them.

use crate::domain::from::{FromClause, FromJoin, FromRoot, JoinKind, JoinTarget};
use crate::domain::path::NavigablePath;
use crate::relational::{
    SqlJoinKind, SqlPredicate, TableGroup, TableGroupId, TableGroupJoin, TableGroupKind,
};
use crate::translator::errors::TranslationError;
use crate::translator::Translator;

fn sql_join_kind(kind: JoinKind) -> SqlJoinKind {
    match kind {
        JoinKind::Inner => SqlJoinKind::Inner,
        JoinKind::Left => SqlJoinKind::Left,
        JoinKind::Right => SqlJoinKind::Right,
        JoinKind::Full => SqlJoinKind::Full,
        JoinKind::Cross => SqlJoinKind::Cross,
    }
}

/// True when every join under `joins`, transitively, is inner.
fn all_joins_inner(joins: &[FromJoin]) -> bool {
    joins
        .iter()
        .all(|join| join.kind == JoinKind::Inner && all_joins_inner(&join.joins))
}

impl Translator<'_> {
    pub(crate) fn build_from_clause(
        &mut self,
        from: &FromClause,
    ) -> Result<Vec<TableGroupId>, TranslationError> {
        let mut roots = Vec::with_capacity(from.roots.len());
        for root in &from.roots {
            roots.push(self.build_root(root)?);
        }
        Ok(roots)
    }

    fn build_root(&mut self, root: &FromRoot) -> Result<TableGroupId, TranslationError> {
        if root.correlated {
            return self.build_correlated_root(root);
        }
        let group = self.create_entity_group(
            &root.entity,
            root.path.clone(),
            TableGroupKind::Root,
            true,
            root.alias.as_deref(),
        )?;
        self.scopes.register(root.path.clone(), group)?;
        if let Some(alias) = &root.alias {
            self.scopes.register(NavigablePath::root(alias), group)?;
        }
        self.build_explicit_joins(group, &root.joins)?;
        Ok(group)
    }

    /// A correlated root names a from-element of an enclosing query.
    ///
    /// With only inner joins beneath it, the subquery can reuse the outer
    /// tables directly: a correlated stand-in group shares the outer
    /// aliases and contributes no table of its own. Any other join kind
    /// needs genuine left/right semantics against a real copy of the
    /// entity, correlated back through an identifier-equality restriction.
    fn build_correlated_root(&mut self, root: &FromRoot) -> Result<TableGroupId, TranslationError> {
        let parent = self
            .scopes
            .resolve_in_parent(&root.path)
            .ok_or_else(|| TranslationError::UnresolvedPath {
                path: root.path.to_string(),
                segment: root.path.root_name().to_string(),
                type_name: "any enclosing query scope".to_string(),
            })?;

        if all_joins_inner(&root.joins) {
            let parent_real = self.groups.dereference(parent);
            let outer = self.groups.get(parent_real);
            let group = self.groups.insert(TableGroup {
                path: root.path.clone(),
                model_type: outer.model_type.clone(),
                kind: TableGroupKind::Correlated { parent },
                primary: outer.primary.clone(),
                secondary: outer.secondary.clone(),
                joins: Vec::new(),
                guarantees_rows: outer.guarantees_rows,
            });
            log::debug!(
                "correlated root `{}` reuses outer alias `{}`",
                root.path,
                self.groups.get(group).alias()
            );
            self.scopes.register(root.path.clone(), group)?;
            if let Some(alias) = &root.alias {
                self.scopes.register(NavigablePath::root(alias), group)?;
            }
            self.build_explicit_joins(group, &root.joins)?;
            return Ok(group);
        }

        // Real copy, tied to the outer row by identifier equality.
        let group = self.create_entity_group(
            &root.entity,
            root.path.clone(),
            TableGroupKind::Root,
            true,
            root.alias.as_deref(),
        )?;
        self.scopes.register(root.path.clone(), group)?;
        if let Some(alias) = &root.alias {
            self.scopes.register(NavigablePath::root(alias), group)?;
        }
        let outer_id = self.identifier_columns(parent);
        let inner_id = self.identifier_columns(group);
        let mut parts = Vec::with_capacity(outer_id.len());
        for (outer, inner) in outer_id.into_iter().zip(inner_id) {
            parts.push(SqlPredicate::equal(
                crate::relational::SqlExpression::Column(outer),
                crate::relational::SqlExpression::Column(inner),
            ));
        }
        self.scopes.add_restriction(SqlPredicate::conjunction(parts));
        self.build_explicit_joins(group, &root.joins)?;
        Ok(group)
    }

    fn build_explicit_joins(
        &mut self,
        lhs: TableGroupId,
        joins: &[FromJoin],
    ) -> Result<(), TranslationError> {
        for join in joins {
            let group = match &join.target {
                JoinTarget::Attribute(path) => {
                    let Some((_, last)) = path.parent() else {
                        return Err(TranslationError::Internal(format!(
                            "attribute join `{}` has no attribute segment",
                            path
                        )));
                    };
                    let last = last.clone();
                    let model_type = self
                        .groups
                        .get(self.groups.dereference(lhs))
                        .model_type
                        .clone();
                    let attribute = self
                        .metamodel
                        .find_sub_part(&model_type, &last.name, last.treat_target.as_deref())
                        .cloned()
                        .ok_or_else(|| TranslationError::UnresolvedPath {
                            path: path.to_string(),
                            segment: last.name.clone(),
                            type_name: last
                                .treat_target
                                .clone()
                                .unwrap_or_else(|| model_type.clone()),
                        })?;
                    let group = self.join_attribute(
                        lhs,
                        path,
                        &attribute,
                        sql_join_kind(join.kind),
                        join.alias.as_deref(),
                    )?;
                    if join.fetched {
                        self.fetched_join_paths.insert(path.clone());
                    }
                    group
                }
                JoinTarget::Entity { entity, path } => {
                    let kind = sql_join_kind(join.kind);
                    let guarantees =
                        self.groups.get(lhs).guarantees_rows && kind == SqlJoinKind::Inner;
                    let group = self.create_entity_group(
                        entity,
                        path.clone(),
                        TableGroupKind::Joined,
                        guarantees,
                        join.alias.as_deref(),
                    )?;
                    // Entity joins carry no model association; the join
                    // condition is whatever the on-clause supplies.
                    self.groups.get_mut(lhs).joins.push(TableGroupJoin {
                        kind,
                        joined: group,
                        predicate: None,
                    });
                    self.scopes.register(path.clone(), group)?;
                    group
                }
            };
            if let Some(alias) = &join.alias {
                self.scopes.register(NavigablePath::root(alias), group)?;
            }
            if let Some(on) = &join.on {
                // Translated after registration so the on-clause can name
                // the joined element itself.
                let predicate = self.translate_predicate(on)?;
                self.attach_join_predicate(lhs, group, predicate)?;
            }
            self.build_explicit_joins(group, &join.joins)?;
        }
        Ok(())
    }

    fn attach_join_predicate(
        &mut self,
        owner: TableGroupId,
        joined: TableGroupId,
        predicate: SqlPredicate,
    ) -> Result<(), TranslationError> {
        let join = self
            .groups
            .get_mut(owner)
            .joins
            .iter_mut()
            .find(|j| j.joined == joined)
            .ok_or_else(|| {
                TranslationError::Internal("on-clause names a join that was never wired".to_string())
            })?;
        let mut slot = join.predicate.take();
        SqlPredicate::combine_into(&mut slot, predicate);
        join.predicate = slot;
        Ok(())
    }
}
