//! Parameter binding: one placeholder per mapped column.

use crate::domain::expr::ParameterRef;
use crate::metamodel::ValueMapping;
use crate::relational::{ParameterBinding, Placeholder, SqlExpression};
use crate::translator::Translator;

impl Translator<'_> {
    /// Expand a parameter occurrence into placeholders.
    ///
    /// The placeholder count is the column count of the inferred value
    /// mapping; with no mapping (or a mapping with no columns) a single
    /// untyped placeholder is emitted. Every call records one
    /// [`ParameterBinding`], so repeated occurrences of the same parameter
    /// each get their own placeholders in occurrence order.
    pub(crate) fn bind_parameter(
        &mut self,
        parameter: &ParameterRef,
        mapping: Option<&ValueMapping>,
    ) -> SqlExpression {
        let placeholders: Vec<Placeholder> = match mapping {
            Some(mapping) if !mapping.columns.is_empty() => mapping
                .columns
                .iter()
                .enumerate()
                .map(|(index, column)| Placeholder {
                    parameter: parameter.id.clone(),
                    index,
                    jdbc: Some(column.jdbc),
                })
                .collect(),
            _ => {
                log::trace!("no inferred type for parameter {}", parameter.id);
                vec![Placeholder {
                    parameter: parameter.id.clone(),
                    index: 0,
                    jdbc: None,
                }]
            }
        };
        self.parameters.push(ParameterBinding {
            parameter: parameter.id.clone(),
            placeholders: placeholders.clone(),
        });
        match placeholders.as_slice() {
            [single] => SqlExpression::Placeholder(single.clone()),
            _ => SqlExpression::Tuple(
                placeholders
                    .into_iter()
                    .map(SqlExpression::Placeholder)
                    .collect(),
            ),
        }
    }
}
