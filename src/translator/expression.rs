//! Expression translation and type inference.

use crate::domain::expr::{CaseExpression, Expression, Literal, UnaryArithmeticOp};
use crate::domain::path::NavigablePath;
use crate::domain::statement::QuerySpec;
use crate::metamodel::{Attribute, AttributeKind, JdbcType, ValueMapping};
use crate::relational::{SqlCaseExpression, SqlExpression, SqlQuerySpec};
use crate::translator::errors::TranslationError;
use crate::translator::function_registry;
use crate::translator::path_resolver::ResolvedPath;
use crate::translator::temporal::{self, TemporalCtx};
use crate::translator::Translator;

impl Translator<'_> {
    pub(crate) fn translate_expression(
        &mut self,
        expression: &Expression,
    ) -> Result<SqlExpression, TranslationError> {
        match expression {
            Expression::Literal(literal) => Ok(SqlExpression::Literal(literal.clone())),

            Expression::Parameter(parameter) => {
                let mapping = self.current_inference().cloned();
                Ok(self.bind_parameter(parameter, mapping.as_ref()))
            }

            Expression::Path(path) => self.translate_path_expression(path),

            Expression::Unary { op, operand } => {
                if temporal::is_duration(self, operand) {
                    let negate = matches!(op, UnaryArithmeticOp::Minus);
                    return temporal::translate(
                        self,
                        operand,
                        TemporalCtx {
                            negate,
                            ..TemporalCtx::default()
                        },
                    );
                }
                let operand = self.translate_expression(operand)?;
                Ok(match op {
                    UnaryArithmeticOp::Plus => operand,
                    UnaryArithmeticOp::Minus => SqlExpression::Negated(Box::new(operand)),
                })
            }

            Expression::Binary { op, lhs, rhs } => {
                if temporal::is_temporal_arithmetic(self, lhs, rhs) {
                    return temporal::translate_binary(self, *op, lhs, rhs, TemporalCtx::default());
                }
                let lhs_mapping = self.infer_mapping(lhs);
                let rhs_mapping = self.infer_mapping(rhs);
                let lhs = self.with_inference(rhs_mapping, |t| t.translate_expression(lhs))?;
                let rhs = self.with_inference(lhs_mapping, |t| t.translate_expression(rhs))?;
                Ok(SqlExpression::Arithmetic {
                    op: *op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                })
            }

            Expression::Function { name, args } => {
                let mut translated = Vec::with_capacity(args.len());
                for arg in args {
                    // Function arguments are typed by the function, not by
                    // each other.
                    translated.push(self.with_inference(None, |t| t.translate_expression(arg))?);
                }
                Ok(SqlExpression::Function {
                    name: name.clone(),
                    args: translated,
                    jdbc: function_registry::function_return_type(name),
                })
            }

            Expression::Case(case) => self.translate_case(case),

            Expression::Tuple(items) => {
                let mut translated = Vec::with_capacity(items.len());
                for item in items {
                    translated.push(self.translate_expression(item)?);
                }
                Ok(SqlExpression::Tuple(translated))
            }

            Expression::Subquery(spec) => Ok(SqlExpression::Subquery(Box::new(
                self.translate_subquery(spec)?,
            ))),

            Expression::ToDuration { .. } | Expression::ByUnit { .. } => {
                temporal::translate(self, expression, TemporalCtx::default())
            }
        }
    }

    fn translate_path_expression(
        &mut self,
        path: &NavigablePath,
    ) -> Result<SqlExpression, TranslationError> {
        match self.resolve_path(path)? {
            ResolvedPath::Column(column) => Ok(SqlExpression::Column(column)),
            ResolvedPath::Tuple(columns) => Ok(SqlExpression::ColumnTuple(columns)),
            ResolvedPath::Group(group) => {
                // An entity-valued path reads as its identifier.
                let mut columns = self.identifier_columns(group);
                match columns.len() {
                    0 => Err(TranslationError::Unsupported(format!(
                        "collection-valued path `{}` in expression position",
                        path
                    ))),
                    1 => Ok(SqlExpression::Column(
                        columns.pop().ok_or_else(|| {
                            TranslationError::Internal("identifier column vanished".to_string())
                        })?,
                    )),
                    _ => Ok(SqlExpression::ColumnTuple(columns)),
                }
            }
        }
    }

    fn translate_case(
        &mut self,
        case: &CaseExpression,
    ) -> Result<SqlExpression, TranslationError> {
        let translated = match case {
            CaseExpression::Simple {
                operand,
                branches,
                otherwise,
            } => {
                let operand_mapping = self.infer_mapping(operand);
                let operand = self.translate_expression(operand)?;
                let mut parts = Vec::with_capacity(branches.len());
                for (when, then) in branches {
                    let when = self
                        .with_inference(operand_mapping.clone(), |t| t.translate_expression(when))?;
                    parts.push((when, self.translate_expression(then)?));
                }
                let otherwise = match otherwise {
                    Some(other) => Some(Box::new(self.translate_expression(other)?)),
                    None => None,
                };
                SqlCaseExpression::Simple {
                    operand: Box::new(operand),
                    branches: parts,
                    otherwise,
                }
            }
            CaseExpression::Searched {
                branches,
                otherwise,
            } => {
                let mut parts = Vec::with_capacity(branches.len());
                for (when, then) in branches {
                    let when = self.translate_predicate(when)?;
                    parts.push((when, self.translate_expression(then)?));
                }
                let otherwise = match otherwise {
                    Some(other) => Some(Box::new(self.translate_expression(other)?)),
                    None => None,
                };
                SqlCaseExpression::Searched {
                    branches: parts,
                    otherwise,
                }
            }
        };
        Ok(SqlExpression::Case(Box::new(translated)))
    }

    pub(crate) fn translate_subquery(
        &mut self,
        spec: &QuerySpec,
    ) -> Result<SqlQuerySpec, TranslationError> {
        self.in_new_scope(|t| t.translate_query_spec(spec, None))
    }

    // ------------------------------------------------------------------
    // Type inference
    // ------------------------------------------------------------------

    /// Best-effort static type of an expression, used to type the opposite
    /// operand's parameters and null literals. `None` means "no opinion";
    /// translation proceeds untyped.
    pub(crate) fn infer_mapping(&self, expression: &Expression) -> Option<ValueMapping> {
        match expression {
            Expression::Literal(literal) => match literal {
                Literal::Integer(_) => Some(ValueMapping::scalar("", JdbcType::BigInt)),
                Literal::Float(_) => Some(ValueMapping::scalar("", JdbcType::Double)),
                Literal::Boolean(_) => Some(ValueMapping::scalar("", JdbcType::Boolean)),
                Literal::String(_) => Some(ValueMapping::scalar("", JdbcType::Varchar)),
                Literal::Null => None,
            },
            Expression::Parameter(_) => None,
            Expression::Path(path) => self.infer_path_mapping(path),
            Expression::Unary { operand, .. } => self.infer_mapping(operand),
            Expression::Binary { lhs, rhs, .. } => {
                self.infer_mapping(lhs).or_else(|| self.infer_mapping(rhs))
            }
            Expression::Function { name, .. } => {
                function_registry::function_return_type(name)
                    .map(|jdbc| ValueMapping::scalar("", jdbc))
            }
            Expression::Case(case) => match case {
                CaseExpression::Simple { branches, .. } => branches
                    .first()
                    .and_then(|(_, then)| self.infer_mapping(then)),
                CaseExpression::Searched { branches, .. } => branches
                    .first()
                    .and_then(|(_, then)| self.infer_mapping(then)),
            },
            Expression::Tuple(items) => {
                let mut columns = Vec::new();
                for item in items {
                    columns.extend(self.infer_mapping(item)?.columns);
                }
                Some(ValueMapping { columns })
            }
            Expression::Subquery(_) => None,
            Expression::ToDuration { .. } => Some(ValueMapping::scalar("", JdbcType::Interval)),
            Expression::ByUnit { .. } => Some(ValueMapping::scalar("", JdbcType::BigInt)),
        }
    }

    /// Type a path without resolving it: walk attribute declarations from
    /// the longest scope-registered prefix. Never synthesizes joins.
    pub(crate) fn infer_path_mapping(&self, path: &NavigablePath) -> Option<ValueMapping> {
        // Longest registered prefix gives the starting type.
        let mut prefix = path.clone();
        let mut remainder: Vec<_> = Vec::new();
        let group = loop {
            if let Some(group) = self.scopes.resolve(&prefix) {
                break group;
            }
            let (parent, last) = prefix.parent()?;
            remainder.push(last.clone());
            prefix = parent;
        };
        remainder.reverse();

        let mut owner = self
            .groups
            .get(self.groups.dereference(group))
            .model_type
            .clone();
        if owner.is_empty() {
            return None;
        }
        let mut embedded: Option<Vec<Attribute>> = None;
        let mut attribute: Option<Attribute> = None;
        for segment in &remainder {
            let found = match &embedded {
                Some(attributes) => attributes.iter().find(|a| a.name == segment.name).cloned(),
                None => self
                    .metamodel
                    .find_sub_part(&owner, &segment.name, segment.treat_target.as_deref())
                    .cloned(),
            }?;
            embedded = None;
            match &found.kind {
                AttributeKind::Embedded { attributes } => embedded = Some(attributes.clone()),
                AttributeKind::ToOne { entity, .. } => owner = entity.clone(),
                AttributeKind::Basic { .. } | AttributeKind::Plural { .. } => {}
            }
            attribute = Some(found);
        }
        let attribute = match attribute {
            Some(attribute) => attribute,
            // The path is exactly a registered group: an entity reads as
            // its identifier.
            None => {
                return self.metamodel.entity(&owner).ok().map(|m| m.identifier.clone());
            }
        };
        match &attribute.kind {
            AttributeKind::ToOne { foreign_key, .. } => Some(foreign_key.value_mapping()),
            AttributeKind::Plural { .. } => None,
            _ => attribute.scalar_value_mapping(),
        }
    }
}
