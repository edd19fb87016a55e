//! Path resolution: navigable paths to columns, tuples, or table groups.
//!
//! Resolution is idempotent per scope chain: the first resolution of an
//! association step synthesizes an implicit join and registers the path;
//! every later resolution of the same path finds the registered group.

use crate::domain::path::{NavigablePath, PathSegment};
use crate::metamodel::{Attribute, AttributeKind, PluralElement};
use crate::relational::{
    ColumnReference, SqlJoinKind, TableGroup, TableGroupId, TableGroupJoin, TableGroupKind,
    TableReference,
};
use crate::translator::errors::TranslationError;
use crate::translator::Translator;

/// What a navigable path denotes after resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedPath {
    /// A basic value: one column.
    Column(ColumnReference),
    /// An embedded value: its flattened columns, in declaration order.
    Tuple(Vec<ColumnReference>),
    /// An entity- or collection-valued path: its table group.
    Group(TableGroupId),
}

/// Intermediate position while walking a path: either a table group or an
/// embedded value carried on one.
enum PathCursor {
    Group(TableGroupId),
    Embedded {
        group: TableGroupId,
        owner: String,
        attributes: Vec<Attribute>,
    },
}

impl Translator<'_> {
    /// Resolve `path` in the current scope chain, synthesizing implicit
    /// joins for unvisited association steps.
    pub(crate) fn resolve_path(
        &mut self,
        path: &NavigablePath,
    ) -> Result<ResolvedPath, TranslationError> {
        if let Some(group) = self.scopes.resolve(path) {
            return Ok(ResolvedPath::Group(group));
        }
        let Some((parent, last)) = path.parent() else {
            // A bare root identifier with no scope binding: nothing in the
            // from-clause declared it.
            return Err(TranslationError::UnresolvedPath {
                path: path.to_string(),
                segment: path.root_name().to_string(),
                type_name: "any visible from-clause element".to_string(),
            });
        };
        let last = last.clone();
        let cursor = self.resolve_cursor(&parent)?;
        self.resolve_terminal(path, &parent, &last, cursor)
    }

    /// Resolve a non-terminal prefix. The prefix must denote something
    /// navigable: a group or an embedded value.
    fn resolve_cursor(
        &mut self,
        path: &NavigablePath,
    ) -> Result<PathCursor, TranslationError> {
        if let Some(group) = self.scopes.resolve(path) {
            return Ok(PathCursor::Group(group));
        }
        let Some((parent, last)) = path.parent() else {
            return Err(TranslationError::UnresolvedPath {
                path: path.to_string(),
                segment: path.root_name().to_string(),
                type_name: "any visible from-clause element".to_string(),
            });
        };
        let last = last.clone();
        let cursor = self.resolve_cursor(&parent)?;
        let (owner_group, owner_name, attribute) =
            self.cursor_attribute(path, &cursor, &last)?;
        match attribute.kind {
            AttributeKind::Basic { .. } => Err(TranslationError::UnresolvedPath {
                path: path.to_string(),
                segment: last.name.clone(),
                type_name: format!("the basic-valued `{}.{}`", owner_name, last.name),
            }),
            AttributeKind::Embedded { ref attributes } => Ok(PathCursor::Embedded {
                group: owner_group,
                owner: owner_name,
                attributes: attributes.clone(),
            }),
            AttributeKind::ToOne { .. } | AttributeKind::Plural { .. } => {
                let kind = self.implicit_join_kind(owner_group, &attribute);
                let group = self.join_attribute(owner_group, path, &attribute, kind, None)?;
                Ok(PathCursor::Group(group))
            }
        }
    }

    fn resolve_terminal(
        &mut self,
        path: &NavigablePath,
        parent: &NavigablePath,
        last: &PathSegment,
        cursor: PathCursor,
    ) -> Result<ResolvedPath, TranslationError> {
        // Collection pseudo-attributes resolve against the collection
        // group itself, before the owning type's attributes.
        if let PathCursor::Group(group) = &cursor {
            if let Some(resolved) = self.resolve_plural_part(*group, parent, &last.name)? {
                return Ok(resolved);
            }
        }
        let (owner_group, owner_name, attribute) = self.cursor_attribute(path, &cursor, last)?;
        match attribute.kind {
            AttributeKind::Basic { ref column, jdbc } => Ok(ResolvedPath::Column(
                self.column_ref(owner_group, column, jdbc),
            )),
            AttributeKind::Embedded { .. } => {
                let mapping = attribute.scalar_value_mapping().ok_or_else(|| {
                    TranslationError::Unsupported(format!(
                        "embedded `{}.{}` nests an association",
                        owner_name, last.name
                    ))
                })?;
                Ok(ResolvedPath::Tuple(
                    mapping
                        .columns
                        .iter()
                        .map(|c| self.column_ref(owner_group, &c.column, c.jdbc))
                        .collect(),
                ))
            }
            AttributeKind::ToOne { .. } | AttributeKind::Plural { .. } => {
                let kind = self.implicit_join_kind(owner_group, &attribute);
                let group = self.join_attribute(owner_group, path, &attribute, kind, None)?;
                Ok(ResolvedPath::Group(group))
            }
        }
    }

    /// Look up the attribute the cursor's type declares for `segment`,
    /// honoring a treat target when present.
    fn cursor_attribute(
        &self,
        path: &NavigablePath,
        cursor: &PathCursor,
        segment: &PathSegment,
    ) -> Result<(TableGroupId, String, Attribute), TranslationError> {
        match cursor {
            PathCursor::Group(group) => {
                let model_type = self.groups.get(self.groups.dereference(*group)).model_type.clone();
                let attribute = self
                    .metamodel
                    .find_sub_part(&model_type, &segment.name, segment.treat_target.as_deref())
                    .cloned()
                    .ok_or_else(|| TranslationError::UnresolvedPath {
                        path: path.to_string(),
                        segment: segment.name.clone(),
                        type_name: segment
                            .treat_target
                            .clone()
                            .unwrap_or_else(|| model_type.clone()),
                    })?;
                Ok((*group, model_type, attribute))
            }
            PathCursor::Embedded {
                group,
                owner,
                attributes,
            } => {
                let attribute = attributes
                    .iter()
                    .find(|a| a.name == segment.name)
                    .cloned()
                    .ok_or_else(|| TranslationError::UnresolvedPath {
                        path: path.to_string(),
                        segment: segment.name.clone(),
                        type_name: format!("the embedded value on {}", owner),
                    })?;
                Ok((*group, owner.clone(), attribute))
            }
        }
    }

    /// `elements`, `indices` and `keys` steps over a collection group.
    fn resolve_plural_part(
        &mut self,
        group: TableGroupId,
        parent: &NavigablePath,
        name: &str,
    ) -> Result<Option<ResolvedPath>, TranslationError> {
        let real = self.groups.dereference(group);
        let Some(attribute) = self.plural_groups.get(&real).cloned() else {
            return Ok(None);
        };
        let AttributeKind::Plural {
            ref element,
            ref index_column,
            ref key_column,
            ..
        } = attribute.kind
        else {
            return Ok(None);
        };
        match name {
            "elements" => match element {
                PluralElement::EntityElement { .. } => Ok(Some(ResolvedPath::Group(group))),
                PluralElement::BasicElement { column, jdbc } => Ok(Some(ResolvedPath::Column(
                    self.column_ref(group, column, *jdbc),
                ))),
            },
            "indices" => match index_column {
                Some(column) => Ok(Some(ResolvedPath::Column(self.column_ref(
                    group,
                    &column.column,
                    column.jdbc,
                )))),
                None => Err(TranslationError::semantic(
                    "indices",
                    format!("`{}` is not a list collection", parent),
                )),
            },
            "keys" => match key_column {
                Some(column) => Ok(Some(ResolvedPath::Column(self.column_ref(
                    group,
                    &column.column,
                    column.jdbc,
                )))),
                None => Err(TranslationError::semantic(
                    "keys",
                    format!("`{}` is not a map collection", parent),
                )),
            },
            _ => Ok(None),
        }
    }

    /// Left unless the parent guarantees rows and the association cannot
    /// be absent.
    fn implicit_join_kind(&self, owner: TableGroupId, attribute: &Attribute) -> SqlJoinKind {
        let guarantees = self
            .groups
            .get(self.groups.dereference(owner))
            .guarantees_rows;
        match &attribute.kind {
            AttributeKind::ToOne { optional: false, .. } if guarantees => SqlJoinKind::Inner,
            _ => SqlJoinKind::Left,
        }
    }

    /// Create the table group for an association step, wire its join into
    /// the owner, and register the path in the current scope.
    pub(crate) fn join_attribute(
        &mut self,
        owner: TableGroupId,
        path: &NavigablePath,
        attribute: &Attribute,
        kind: SqlJoinKind,
        alias_hint: Option<&str>,
    ) -> Result<TableGroupId, TranslationError> {
        // Joins hang off the group navigation went through; for a
        // correlated stand-in that keeps them inside the subquery while the
        // cloned table references still carry the outer aliases.
        let owner_real = owner;
        let owner_alias = self.groups.get(owner_real).primary.alias.clone();
        let owner_guarantees = self.groups.get(owner_real).guarantees_rows;
        let guarantees = owner_guarantees && kind == SqlJoinKind::Inner;

        let group = match &attribute.kind {
            AttributeKind::ToOne {
                entity,
                foreign_key,
                ..
            } => {
                let group = self.create_entity_group(
                    entity,
                    path.clone(),
                    TableGroupKind::Joined,
                    guarantees,
                    alias_hint,
                )?;
                let predicate = foreign_key
                    .generate_join_predicate(&owner_alias, self.groups.get(group).alias());
                self.groups.get_mut(owner_real).joins.push(TableGroupJoin {
                    kind,
                    joined: group,
                    predicate: Some(predicate),
                });
                group
            }
            AttributeKind::Plural {
                element,
                table,
                foreign_key,
                ..
            } => {
                let group = self.create_plural_group(
                    path.clone(),
                    element,
                    table,
                    guarantees,
                    alias_hint,
                )?;
                // Collection key columns refer back to the owner's
                // identifier, so the collection side is the referring side.
                let predicate = foreign_key
                    .generate_join_predicate(self.groups.get(group).alias(), &owner_alias);
                self.groups.get_mut(owner_real).joins.push(TableGroupJoin {
                    kind,
                    joined: group,
                    predicate: Some(predicate),
                });
                self.plural_groups.insert(group, attribute.clone());
                group
            }
            _ => {
                return Err(TranslationError::Internal(format!(
                    "`{}` is not a joinable attribute",
                    attribute.name
                )))
            }
        };
        log::trace!("implicit join for `{}` as {:?}", path, kind);
        self.scopes.register(path.clone(), group)?;
        Ok(group)
    }

    /// A table group over a collection table. Entity elements get the full
    /// entity group (treat and secondary tables keep working); basic
    /// elements get an anonymous single-table group.
    pub(crate) fn create_plural_group(
        &mut self,
        path: NavigablePath,
        element: &PluralElement,
        table: &str,
        guarantees_rows: bool,
        alias_hint: Option<&str>,
    ) -> Result<TableGroupId, TranslationError> {
        match element {
            PluralElement::EntityElement { entity } => self.create_entity_group(
                entity,
                path,
                TableGroupKind::Joined,
                guarantees_rows,
                alias_hint,
            ),
            PluralElement::BasicElement { .. } => {
                let alias = self.aliases.allocate(alias_hint.unwrap_or(table));
                Ok(self.groups.insert(TableGroup {
                    path,
                    model_type: String::new(),
                    kind: TableGroupKind::Joined,
                    primary: TableReference {
                        table: table.to_string(),
                        alias,
                    },
                    secondary: Vec::new(),
                    joins: Vec::new(),
                    guarantees_rows,
                }))
            }
        }
    }

    /// Resolve an insert/update target path to its columns without
    /// synthesizing joins; mutations write only the target's own tables.
    pub(crate) fn resolve_mutation_target(
        &self,
        group: TableGroupId,
        path: &NavigablePath,
    ) -> Result<Vec<ColumnReference>, TranslationError> {
        let model_type = self
            .groups
            .get(self.groups.dereference(group))
            .model_type
            .clone();
        if path.segments().is_empty() {
            return Err(TranslationError::semantic(
                "assignment",
                format!("`{}` does not name an attribute", path),
            ));
        }
        let mut owner = model_type;
        let mut embedded: Option<Vec<Attribute>> = None;
        let segments = path.segments();
        for (position, segment) in segments.iter().enumerate() {
            let attribute = match &embedded {
                Some(attributes) => attributes.iter().find(|a| a.name == segment.name).cloned(),
                None => self
                    .metamodel
                    .find_sub_part(&owner, &segment.name, segment.treat_target.as_deref())
                    .cloned(),
            }
            .ok_or_else(|| TranslationError::UnresolvedPath {
                path: path.to_string(),
                segment: segment.name.clone(),
                type_name: owner.clone(),
            })?;
            let terminal = position + 1 == segments.len();
            match attribute.kind {
                AttributeKind::Basic { ref column, jdbc } if terminal => {
                    return Ok(vec![self.column_ref(group, column, jdbc)]);
                }
                AttributeKind::Basic { .. } => {
                    return Err(TranslationError::UnresolvedPath {
                        path: path.to_string(),
                        segment: segment.name.clone(),
                        type_name: format!("the basic-valued `{}.{}`", owner, segment.name),
                    });
                }
                AttributeKind::Embedded { .. } if terminal => {
                    let mapping = attribute.scalar_value_mapping().ok_or_else(|| {
                        TranslationError::Unsupported(format!(
                            "embedded `{}.{}` nests an association",
                            owner, segment.name
                        ))
                    })?;
                    return Ok(mapping
                        .columns
                        .iter()
                        .map(|c| self.column_ref(group, &c.column, c.jdbc))
                        .collect());
                }
                AttributeKind::Embedded { attributes } => {
                    embedded = Some(attributes);
                }
                AttributeKind::ToOne {
                    ref foreign_key, ..
                } if terminal => {
                    return Ok(foreign_key
                        .referring_columns
                        .iter()
                        .zip(&foreign_key.jdbc_types)
                        .map(|(column, jdbc)| self.column_ref(group, column, *jdbc))
                        .collect());
                }
                AttributeKind::ToOne { entity, .. } => {
                    // Navigating past the association would mutate another
                    // entity's table.
                    return Err(TranslationError::Unsupported(format!(
                        "assignment through association `{}.{}` (of {})",
                        owner, segment.name, entity
                    )));
                }
                AttributeKind::Plural { .. } => {
                    return Err(TranslationError::Unsupported(format!(
                        "collection-valued `{}.{}` as a mutation target",
                        owner, segment.name
                    )));
                }
            }
        }
        Err(TranslationError::Internal(format!(
            "mutation target `{}` fell through resolution",
            path
        )))
    }
}
