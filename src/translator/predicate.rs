//! Predicate translation, including multi-valued IN expansion and
//! `member of` desugaring.

use crate::domain::expr::{BoundValue, Expression};
use crate::domain::path::NavigablePath;
use crate::domain::predicate::{ComparisonOp, Predicate};
use crate::metamodel::{AttributeKind, MappedColumn, PluralElement, ValueMapping};
use crate::relational::{
    Placeholder, SqlExpression, SqlPredicate, SqlQuerySpec, SqlSelection, ParameterBinding,
};
use crate::translator::errors::TranslationError;
use crate::translator::path_resolver::ResolvedPath;
use crate::translator::Translator;

impl Translator<'_> {
    pub(crate) fn translate_predicate(
        &mut self,
        predicate: &Predicate,
    ) -> Result<SqlPredicate, TranslationError> {
        match predicate {
            Predicate::Comparison { op, lhs, rhs } => {
                let lhs_mapping = self.infer_mapping(lhs);
                let rhs_mapping = self.infer_mapping(rhs);
                let lhs = self.with_inference(rhs_mapping, |t| t.translate_expression(lhs))?;
                let rhs = self.with_inference(lhs_mapping, |t| t.translate_expression(rhs))?;
                Ok(SqlPredicate::Comparison { op: *op, lhs, rhs })
            }

            Predicate::Between {
                expr,
                lower,
                upper,
                negated,
            } => {
                let expr_mapping = self.infer_mapping(expr);
                let bound_mapping = self
                    .infer_mapping(lower)
                    .or_else(|| self.infer_mapping(upper));
                let expr = self.with_inference(bound_mapping, |t| t.translate_expression(expr))?;
                let lower =
                    self.with_inference(expr_mapping.clone(), |t| t.translate_expression(lower))?;
                let upper =
                    self.with_inference(expr_mapping, |t| t.translate_expression(upper))?;
                Ok(SqlPredicate::Between {
                    expr,
                    lower,
                    upper,
                    negated: *negated,
                })
            }

            Predicate::Like {
                expr,
                pattern,
                escape,
                negated,
            } => {
                let expr_mapping = self.infer_mapping(expr);
                let expr = self.translate_expression(expr)?;
                let pattern =
                    self.with_inference(expr_mapping, |t| t.translate_expression(pattern))?;
                let escape = match escape {
                    Some(escape) => Some(self.translate_expression(escape)?),
                    None => None,
                };
                Ok(SqlPredicate::Like {
                    expr,
                    pattern,
                    escape,
                    negated: *negated,
                })
            }

            Predicate::NullCheck { expr, negated } => Ok(SqlPredicate::NullCheck {
                expr: self.translate_expression(expr)?,
                negated: *negated,
            }),

            Predicate::InList {
                expr,
                items,
                negated,
            } => self.translate_in_list(expr, items, *negated),

            Predicate::InSubquery {
                expr,
                subquery,
                negated,
            } => {
                let expr = self.translate_expression(expr)?;
                let subquery = self.translate_subquery(subquery)?;
                Ok(SqlPredicate::InSubquery {
                    expr,
                    subquery: Box::new(subquery),
                    negated: *negated,
                })
            }

            Predicate::Exists { subquery, negated } => Ok(SqlPredicate::Exists {
                subquery: Box::new(self.translate_subquery(subquery)?),
                negated: *negated,
            }),

            Predicate::MemberOf {
                expr,
                plural_path,
                negated,
            } => self.translate_member_of(expr, plural_path, *negated),

            Predicate::BooleanExpression(expr) => {
                // A bare boolean expression becomes `expr = TRUE`.
                let expr = self.translate_expression(expr)?;
                Ok(SqlPredicate::Comparison {
                    op: ComparisonOp::Equal,
                    lhs: expr,
                    rhs: SqlExpression::Literal(crate::domain::expr::Literal::Boolean(true)),
                })
            }

            Predicate::Junction { kind, predicates } => {
                let mut translated = Vec::with_capacity(predicates.len());
                for predicate in predicates {
                    translated.push(self.translate_predicate(predicate)?);
                }
                Ok(SqlPredicate::Junction {
                    kind: *kind,
                    predicates: translated,
                })
            }

            Predicate::Negation(inner) => Ok(SqlPredicate::Negation(Box::new(
                self.translate_predicate(inner)?,
            ))),

            Predicate::Grouping(inner) => Ok(SqlPredicate::Grouping(Box::new(
                self.translate_predicate(inner)?,
            ))),
        }
    }

    /// IN over a literal list, with expansion of a single multi-valued
    /// parameter whose value is bound at translation time: one placeholder
    /// per element, degenerating to constant false (true when negated) for
    /// an empty list.
    fn translate_in_list(
        &mut self,
        expr: &Expression,
        items: &[Expression],
        negated: bool,
    ) -> Result<SqlPredicate, TranslationError> {
        if let [Expression::Parameter(parameter)] = items {
            if parameter.allow_multi_valued {
                if let Some(BoundValue::List(values)) =
                    self.parameter_values.get(&parameter.id).cloned()
                {
                    let lhs = self.translate_expression(expr)?;
                    if values.is_empty() {
                        log::debug!(
                            "empty expansion for {}; folding IN to a constant",
                            parameter.id
                        );
                        return Ok(if negated {
                            SqlPredicate::ConstantTrue
                        } else {
                            SqlPredicate::ConstantFalse
                        });
                    }
                    let jdbc = self
                        .infer_mapping(expr)
                        .as_ref()
                        .and_then(ValueMapping::single_jdbc);
                    let placeholders: Vec<Placeholder> = (0..values.len())
                        .map(|index| Placeholder {
                            parameter: parameter.id.clone(),
                            index,
                            jdbc,
                        })
                        .collect();
                    self.parameters.push(ParameterBinding {
                        parameter: parameter.id.clone(),
                        placeholders: placeholders.clone(),
                    });
                    return Ok(SqlPredicate::InList {
                        expr: lhs,
                        items: placeholders
                            .into_iter()
                            .map(SqlExpression::Placeholder)
                            .collect(),
                        negated,
                    });
                }
            }
        }
        let expr_mapping = self.infer_mapping(expr);
        let item_mapping = items.iter().find_map(|item| self.infer_mapping(item));
        let lhs = self.with_inference(item_mapping, |t| t.translate_expression(expr))?;
        let mut translated = Vec::with_capacity(items.len());
        for item in items {
            translated
                .push(self.with_inference(expr_mapping.clone(), |t| t.translate_expression(item))?);
        }
        Ok(SqlPredicate::InList {
            expr: lhs,
            items: translated,
            negated,
        })
    }

    /// `value member of owner.collection` desugars to an EXISTS over the
    /// collection table, correlated to the owner through the collection
    /// key and restricted to rows whose element equals the value.
    fn translate_member_of(
        &mut self,
        expr: &Expression,
        plural_path: &NavigablePath,
        negated: bool,
    ) -> Result<SqlPredicate, TranslationError> {
        let Some((parent, last)) = plural_path.parent() else {
            return Err(TranslationError::semantic(
                "member of",
                format!("`{}` does not name a collection attribute", plural_path),
            ));
        };
        let last = last.clone();
        let owner = match self.resolve_path(&parent)? {
            ResolvedPath::Group(group) => group,
            _ => {
                return Err(TranslationError::semantic(
                    "member of",
                    format!("`{}` is not entity-valued", parent),
                ))
            }
        };
        let owner_model = self.groups.get(self.groups.dereference(owner)).model_type.clone();
        let owner_alias = self.groups.get(owner).alias().to_string();
        let attribute = self
            .metamodel
            .find_sub_part(&owner_model, &last.name, last.treat_target.as_deref())
            .cloned()
            .ok_or_else(|| TranslationError::UnresolvedPath {
                path: plural_path.to_string(),
                segment: last.name.clone(),
                type_name: owner_model.clone(),
            })?;
        let AttributeKind::Plural {
            ref element,
            ref table,
            ref foreign_key,
            ..
        } = attribute.kind
        else {
            return Err(TranslationError::semantic(
                "member of",
                format!("`{}` is not collection-valued", plural_path),
            ));
        };
        let element = element.clone();
        let table = table.clone();
        let foreign_key = foreign_key.clone();

        let subquery = self.in_new_scope(|t| {
            let group =
                t.create_plural_group(plural_path.clone(), &element, &table, true, None)?;
            t.scopes.register(plural_path.clone(), group)?;
            t.plural_groups.insert(group, attribute.clone());

            let correlation = foreign_key
                .generate_join_predicate(t.groups.get(group).alias(), &owner_alias);

            let (element_expr, element_mapping) = match &element {
                PluralElement::BasicElement { column, jdbc } => (
                    SqlExpression::Column(t.column_ref(group, column, *jdbc)),
                    ValueMapping::scalar(column.clone(), *jdbc),
                ),
                PluralElement::EntityElement { .. } => {
                    let columns = t.identifier_columns(group);
                    let mapping = ValueMapping {
                        columns: columns
                            .iter()
                            .map(|c| MappedColumn {
                                column: c.column.clone(),
                                jdbc: c.jdbc,
                            })
                            .collect(),
                    };
                    let expr = match columns.len() {
                        1 => SqlExpression::Column(columns.into_iter().next().ok_or_else(
                            || TranslationError::Internal("identifier column vanished".to_string()),
                        )?),
                        _ => SqlExpression::ColumnTuple(columns),
                    };
                    (expr, mapping)
                }
            };
            let value = t
                .with_inference(Some(element_mapping), |t| t.translate_expression(expr))?;

            let mut predicate = Some(correlation);
            SqlPredicate::combine_into(
                &mut predicate,
                SqlPredicate::equal(element_expr, value),
            );
            for restriction in t.scopes.take_restrictions() {
                SqlPredicate::combine_into(&mut predicate, restriction);
            }

            Ok(SqlQuerySpec {
                roots: vec![group],
                distinct: false,
                selections: vec![SqlSelection {
                    expression: SqlExpression::integer(1),
                    alias: None,
                }],
                predicate,
                group_by: Vec::new(),
                having: None,
                order_by: Vec::new(),
                offset: None,
                fetch: None,
                fetches: Vec::new(),
            })
        })?;

        Ok(SqlPredicate::Exists {
            subquery: Box::new(subquery),
            negated,
        })
    }
}
