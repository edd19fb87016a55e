//! The query translation engine.
//!
//! [`Translator`] compiles one domain [`Statement`] into a [`Translation`]:
//! a relational AST plus the parameter-to-placeholder map. All mutable
//! state (alias allocator, scope arena, table-group arena, type-inference
//! stack) is local to one `translate()` call; construct a fresh translator
//! per statement.
//!
//! Translation either fully succeeds or fully fails; there is no partial
//! output and no retry.

pub mod alias;
pub mod errors;
mod expression;
mod fetch;
mod from_clause;
pub mod function_registry;
mod params;
mod path_resolver;
mod predicate;
pub mod scope;
mod temporal;

pub use errors::TranslationError;
pub use path_resolver::ResolvedPath;

use std::collections::{HashMap, HashSet};

use crate::config::TranslatorConfig;
use crate::domain::expr::ParameterValues;
use crate::domain::path::NavigablePath;
use crate::domain::statement::{
    AppliedFetchGraph, Assignment, QueryGroup, QueryPart, QuerySpec, Statement,
};
use crate::metamodel::{Attribute, Metamodel, ValueMapping};
use crate::relational::{
    ColumnReference, ParameterBinding, SqlAssignment, SqlExpression, SqlPredicate, SqlQueryPart,
    SqlQuerySpec, SqlSelection, SqlSortSpec, SqlStatement, TableGroup, TableGroupArena,
    TableGroupId, TableGroupKind, TableReference, Translation,
};
use crate::translator::alias::AliasAllocator;
use crate::translator::scope::ScopeArena;

/// One-shot translator for a single domain statement.
pub struct Translator<'m> {
    metamodel: &'m Metamodel,
    config: TranslatorConfig,
    parameter_values: ParameterValues,
    fetch_graph: Option<AppliedFetchGraph>,
    aliases: AliasAllocator,
    scopes: ScopeArena,
    groups: TableGroupArena,
    /// Type-inference stack: suppliers of "the type of the other operand",
    /// consulted by literal/parameter leaves with no local type.
    inference: Vec<Option<ValueMapping>>,
    /// Parameter occurrences in translation order.
    parameters: Vec<ParameterBinding>,
    /// Plural attribute backing each collection table group.
    plural_groups: HashMap<TableGroupId, Attribute>,
    /// Paths of explicit `join fetch` from-elements.
    fetched_join_paths: HashSet<NavigablePath>,
    /// Bag-classified collection roles join-fetched so far; more than one
    /// is a fatal ambiguity, reported together.
    bag_join_fetch_roles: Vec<String>,
}

impl<'m> Translator<'m> {
    pub fn new(metamodel: &'m Metamodel, config: TranslatorConfig) -> Self {
        Translator {
            metamodel,
            config,
            parameter_values: ParameterValues::new(),
            fetch_graph: None,
            aliases: AliasAllocator::new(),
            scopes: ScopeArena::new(),
            groups: TableGroupArena::new(),
            inference: Vec::new(),
            parameters: Vec::new(),
            plural_groups: HashMap::new(),
            fetched_join_paths: HashSet::new(),
            bag_join_fetch_roles: Vec::new(),
        }
    }

    /// Supply parameter values known at translation time (enables
    /// multi-valued IN expansion).
    pub fn with_parameter_values(mut self, values: ParameterValues) -> Self {
        self.parameter_values = values;
        self
    }

    /// Apply an explicit fetch graph to the statement's result entity.
    pub fn with_fetch_graph(mut self, graph: AppliedFetchGraph) -> Self {
        self.fetch_graph = Some(graph);
        self
    }

    /// Translate one statement to completion.
    pub fn translate(mut self, statement: &Statement) -> Result<Translation, TranslationError> {
        let statement = match statement {
            Statement::Select {
                query,
                result_entity,
            } => SqlStatement::Select {
                query: self.translate_query_part(query, result_entity.as_deref())?,
            },
            Statement::InsertSelect {
                target,
                target_paths,
                source,
            } => self.translate_insert_select(target, target_paths, source)?,
            Statement::InsertValues {
                target,
                target_paths,
                values,
            } => self.translate_insert_values(target, target_paths, values)?,
            Statement::Update {
                target,
                alias,
                assignments,
                predicate,
            } => self.translate_update(target, alias, assignments, predicate.as_ref())?,
            Statement::Delete {
                target,
                alias,
                predicate,
            } => self.translate_delete(target, alias, predicate.as_ref())?,
        };
        Ok(Translation {
            statement,
            table_groups: self.groups,
            parameters: self.parameters,
        })
    }

    // ------------------------------------------------------------------
    // Query parts
    // ------------------------------------------------------------------

    fn translate_query_part(
        &mut self,
        part: &QueryPart,
        result_entity: Option<&str>,
    ) -> Result<SqlQueryPart, TranslationError> {
        match part {
            QueryPart::Spec(spec) => Ok(SqlQueryPart::Spec(Box::new(
                self.translate_query_spec(spec, result_entity)?,
            ))),
            QueryPart::Group(group) => {
                if result_entity.is_some() {
                    // Fetch planning over a set operation has no single
                    // result root; the result entity is materialized
                    // without join fetches.
                    log::debug!("skipping fetch planning for set-operation query");
                }
                self.translate_query_group(group)
            }
        }
    }

    fn translate_query_group(
        &mut self,
        group: &QueryGroup,
    ) -> Result<SqlQueryPart, TranslationError> {
        let mut parts = Vec::with_capacity(group.parts.len());
        for part in &group.parts {
            // Each branch is its own lexical scope.
            let translated = self.in_new_scope(|t| t.translate_query_part(part, None))?;
            parts.push(translated);
        }
        Ok(SqlQueryPart::Group {
            operator: group.operator,
            parts,
        })
    }

    pub(crate) fn translate_query_spec(
        &mut self,
        spec: &QuerySpec,
        result_entity: Option<&str>,
    ) -> Result<SqlQuerySpec, TranslationError> {
        let roots = self.build_from_clause(&spec.from)?;

        let mut selections = Vec::with_capacity(spec.selections.len());
        for selection in &spec.selections {
            selections.push(SqlSelection {
                expression: self.translate_expression(&selection.expression)?,
                alias: selection.alias.clone(),
            });
        }

        let mut predicate = match &spec.predicate {
            Some(predicate) => Some(self.translate_predicate(predicate)?),
            None => None,
        };
        // Correlation restrictions synthesized while building the
        // from-clause belong to this spec's where clause.
        for restriction in self.scopes.take_restrictions() {
            SqlPredicate::combine_into(&mut predicate, restriction);
        }

        let mut group_by = Vec::with_capacity(spec.group_by.len());
        for expression in &spec.group_by {
            group_by.push(self.translate_expression(expression)?);
        }
        let having = match &spec.having {
            Some(having) => Some(self.translate_predicate(having)?),
            None => None,
        };

        let mut order_by = Vec::with_capacity(spec.order_by.len());
        for sort in &spec.order_by {
            order_by.push(SqlSortSpec {
                expression: self.translate_expression(&sort.expression)?,
                descending: sort.descending,
                nulls_first: sort.nulls_first,
            });
        }

        let offset = match &spec.offset {
            Some(offset) => Some(self.translate_expression(offset)?),
            None => None,
        };
        let fetch = match &spec.fetch {
            Some(fetch) => Some(self.translate_expression(fetch)?),
            None => None,
        };

        let fetches = match (result_entity, roots.first()) {
            (Some(entity), Some(&root)) => {
                let root_path = self.groups.get(root).path.clone();
                self.plan_fetches(entity, &root_path, root)?
            }
            _ => Vec::new(),
        };

        Ok(SqlQuerySpec {
            roots,
            distinct: spec.distinct,
            selections,
            predicate,
            group_by,
            having,
            order_by,
            offset,
            fetch,
            fetches,
        })
    }

    // ------------------------------------------------------------------
    // Mutating statements
    // ------------------------------------------------------------------

    fn mutation_root(
        &mut self,
        entity: &str,
        alias: &str,
    ) -> Result<TableGroupId, TranslationError> {
        let path = NavigablePath::root(alias);
        let group = self.create_entity_group(
            entity,
            path.clone(),
            TableGroupKind::Root,
            true,
            Some(alias),
        )?;
        self.scopes.register(path, group)?;
        Ok(group)
    }

    fn translate_insert_select(
        &mut self,
        target: &str,
        target_paths: &[NavigablePath],
        source: &QueryPart,
    ) -> Result<SqlStatement, TranslationError> {
        let (target_ref, columns) = self.resolve_insert_targets(target, target_paths)?;
        let source = self.in_new_scope(|t| t.translate_query_part(source, None))?;
        Ok(SqlStatement::InsertSelect {
            target: target_ref,
            columns,
            source,
        })
    }

    fn translate_insert_values(
        &mut self,
        target: &str,
        target_paths: &[NavigablePath],
        values: &[Vec<crate::domain::expr::Expression>],
    ) -> Result<SqlStatement, TranslationError> {
        let (target_ref, columns) = self.resolve_insert_targets(target, target_paths)?;

        // Column mappings per target path, for value type inference.
        let group = self
            .scopes
            .resolve(&NavigablePath::root(target_paths[0].root_name()))
            .ok_or_else(|| {
                TranslationError::Internal("insert target group not registered".to_string())
            })?;
        let mut rows = Vec::with_capacity(values.len());
        for row in values {
            if row.len() != target_paths.len() {
                return Err(TranslationError::semantic(
                    "insert",
                    format!(
                        "values row has {} expressions but {} target paths were named",
                        row.len(),
                        target_paths.len()
                    ),
                ));
            }
            let mut translated = Vec::with_capacity(row.len());
            for (path, value) in target_paths.iter().zip(row) {
                let target_columns = self.resolve_mutation_target(group, path)?;
                let mapping = ValueMapping {
                    columns: target_columns
                        .iter()
                        .map(|c| crate::metamodel::MappedColumn {
                            column: c.column.clone(),
                            jdbc: c.jdbc,
                        })
                        .collect(),
                };
                translated.push(
                    self.with_inference(Some(mapping), |t| t.translate_expression(value))?,
                );
            }
            rows.push(translated);
        }
        Ok(SqlStatement::InsertValues {
            target: target_ref,
            columns,
            values: rows,
        })
    }

    fn resolve_insert_targets(
        &mut self,
        target: &str,
        target_paths: &[NavigablePath],
    ) -> Result<(TableReference, Vec<ColumnReference>), TranslationError> {
        let root_name = target_paths
            .first()
            .map(|p| p.root_name().to_string())
            .ok_or_else(|| {
                TranslationError::semantic("insert", "at least one target path is required")
            })?;
        let group = self.mutation_root(target, &root_name)?;
        let mut columns = Vec::new();
        for path in target_paths {
            if path.root_name() != root_name {
                return Err(TranslationError::Internal(format!(
                    "insert target paths must share one root; `{}` vs `{}`",
                    path.root_name(),
                    root_name
                )));
            }
            columns.extend(self.resolve_mutation_target(group, path)?);
        }
        let target_ref = self.groups.get(group).primary.clone();
        Ok((target_ref, columns))
    }

    fn translate_update(
        &mut self,
        target: &str,
        alias: &str,
        assignments: &[Assignment],
        predicate: Option<&crate::domain::predicate::Predicate>,
    ) -> Result<SqlStatement, TranslationError> {
        let group = self.mutation_root(target, alias)?;

        let mut translated = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let columns = self.resolve_mutation_target(group, &assignment.target)?;
            let mapping = ValueMapping {
                columns: columns
                    .iter()
                    .map(|c| crate::metamodel::MappedColumn {
                        column: c.column.clone(),
                        jdbc: c.jdbc,
                    })
                    .collect(),
            };
            let value =
                self.with_inference(Some(mapping), |t| t.translate_expression(&assignment.value))?;
            translated.extend(Self::pair_assignment(&assignment.target, columns, value)?);
        }

        let predicate = match predicate {
            Some(predicate) => Some(self.translate_predicate(predicate)?),
            None => None,
        };
        Ok(SqlStatement::Update {
            target: group,
            assignments: translated,
            predicate,
        })
    }

    /// Pair the resolved target columns with the translated value,
    /// decomposing tuple-shaped values for composite targets.
    fn pair_assignment(
        target: &NavigablePath,
        columns: Vec<ColumnReference>,
        value: SqlExpression,
    ) -> Result<Vec<SqlAssignment>, TranslationError> {
        let mut columns = columns;
        if columns.len() == 1 {
            if let Some(column) = columns.pop() {
                return Ok(vec![SqlAssignment { column, value }]);
            }
        }
        let parts: Vec<SqlExpression> = match value {
            SqlExpression::Tuple(parts) => parts,
            SqlExpression::ColumnTuple(columns) => {
                columns.into_iter().map(SqlExpression::Column).collect()
            }
            _ => {
                return Err(TranslationError::Unsupported(format!(
                    "assignment to composite path `{}` requires a tuple-shaped value",
                    target
                )))
            }
        };
        if parts.len() != columns.len() {
            return Err(TranslationError::semantic(
                "=",
                format!(
                    "composite assignment to `{}` expects {} values, got {}",
                    target,
                    columns.len(),
                    parts.len()
                ),
            ));
        }
        Ok(columns
            .into_iter()
            .zip(parts)
            .map(|(column, value)| SqlAssignment { column, value })
            .collect())
    }

    fn translate_delete(
        &mut self,
        target: &str,
        alias: &str,
        predicate: Option<&crate::domain::predicate::Predicate>,
    ) -> Result<SqlStatement, TranslationError> {
        let group = self.mutation_root(target, alias)?;
        let predicate = match predicate {
            Some(predicate) => Some(self.translate_predicate(predicate)?),
            None => None,
        };
        Ok(SqlStatement::Delete {
            target: group,
            predicate,
        })
    }

    // ------------------------------------------------------------------
    // Shared infrastructure
    // ------------------------------------------------------------------

    /// Run `f` inside a freshly pushed scope, popping it even on error so
    /// the stack stays balanced for error reporting.
    pub(crate) fn in_new_scope<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, TranslationError>,
    ) -> Result<T, TranslationError> {
        self.scopes.push();
        let result = f(self);
        self.scopes.pop();
        result
    }

    /// Run `f` with `mapping` on top of the type-inference stack.
    pub(crate) fn with_inference<T>(
        &mut self,
        mapping: Option<ValueMapping>,
        f: impl FnOnce(&mut Self) -> Result<T, TranslationError>,
    ) -> Result<T, TranslationError> {
        self.inference.push(mapping);
        let result = f(self);
        self.inference.pop();
        result
    }

    pub(crate) fn current_inference(&self) -> Option<&ValueMapping> {
        self.inference.last().and_then(|top| top.as_ref())
    }

    /// Create a table group for an entity: its primary table plus any
    /// secondary tables, each with a translation-unique alias.
    pub(crate) fn create_entity_group(
        &mut self,
        entity: &str,
        path: NavigablePath,
        kind: TableGroupKind,
        guarantees_rows: bool,
        alias_hint: Option<&str>,
    ) -> Result<TableGroupId, TranslationError> {
        let mapping = self.metamodel.entity(entity)?.clone();
        let stem = alias_hint.unwrap_or(mapping.primary_table.as_str());
        let primary = TableReference {
            table: mapping.primary_table.clone(),
            alias: self.aliases.allocate(stem),
        };
        let secondary = mapping
            .secondary_tables
            .iter()
            .map(|s| TableReference {
                table: s.table.clone(),
                alias: self.aliases.allocate(&s.table),
            })
            .collect();
        log::debug!(
            "table group for `{}` at `{}` as `{}`",
            entity,
            path,
            primary.alias
        );
        Ok(self.groups.insert(TableGroup {
            path,
            model_type: entity.to_string(),
            kind,
            primary,
            secondary,
            joins: Vec::new(),
            guarantees_rows,
        }))
    }

    /// Column reference against the table reference owning `column` within
    /// the group (primary table unless a secondary table declares it).
    pub(crate) fn column_ref(
        &self,
        group: TableGroupId,
        column: &str,
        jdbc: crate::metamodel::JdbcType,
    ) -> ColumnReference {
        let real = self.groups.dereference(group);
        let group = self.groups.get(real);
        let alias = match self.metamodel.entity(&group.model_type) {
            Ok(mapping) => {
                let table = mapping.owning_table(column);
                if table == group.primary.table {
                    &group.primary.alias
                } else {
                    group
                        .secondary
                        .iter()
                        .find(|r| r.table == table)
                        .map(|r| &r.alias)
                        .unwrap_or(&group.primary.alias)
                }
            }
            // Collection element tables are not entities; everything lives
            // on the primary reference.
            Err(_) => &group.primary.alias,
        };
        ColumnReference {
            table_alias: alias.clone(),
            column: column.to_string(),
            jdbc,
        }
    }

    /// The identifier columns of an entity-typed group.
    pub(crate) fn identifier_columns(&self, group: TableGroupId) -> Vec<ColumnReference> {
        let real = self.groups.dereference(group);
        let model_type = self.groups.get(real).model_type.clone();
        match self.metamodel.entity(&model_type) {
            Ok(mapping) => mapping
                .identifier
                .columns
                .iter()
                .map(|c| self.column_ref(group, &c.column, c.jdbc))
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}
