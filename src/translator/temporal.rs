//! Temporal arithmetic rewriting.
//!
//! Domain date arithmetic (`timestamp + duration`, `timestamp - timestamp`,
//! `scalar * duration`, unit extraction) has no direct relational
//! counterpart. The rewriter walks the arithmetic tree carrying a small
//! by-value context and emits three vendor-neutral primitives:
//! `AddInterval`, `DiffInterval` and `UnitConversion`. The context records
//! the timestamp being adjusted, an accumulated scale factor, a pending
//! negation, and the unit a surrounding `by-unit` wants the result in, so
//! that e.g. `ts + scalar * (d1 - d2)` distributes into
//! `(ts + scalar * d1) - scalar * d2` without ever materializing a duration
//! value.

use crate::domain::expr::{BinaryArithmeticOp, Expression, Literal, TemporalUnit};
use crate::metamodel::JdbcType;
use crate::relational::SqlExpression;
use crate::translator::errors::TranslationError;
use crate::translator::function_registry;
use crate::translator::Translator;

/// Rewrite context, passed by value so sibling subtrees never observe each
/// other's adjustments.
#[derive(Debug, Clone, Default)]
pub(crate) struct TemporalCtx {
    /// The already-translated timestamp the current duration subtree
    /// adjusts, if any.
    pub adjusted_timestamp: Option<SqlExpression>,
    /// Accumulated multiplicative factor over the duration magnitude.
    pub scale: Option<SqlExpression>,
    /// Whether the current subtree is subtracted rather than added.
    pub negate: bool,
    /// Target unit requested by an enclosing `by-unit`.
    pub by_unit: Option<TemporalUnit>,
}

impl TemporalCtx {
    /// Is there a pending adjustment that must be folded onto a duration?
    fn adjusting(&self) -> bool {
        self.adjusted_timestamp.is_some() || self.scale.is_some() || self.negate
    }

    fn scaled(&self, factor: SqlExpression) -> Self {
        let scale = match &self.scale {
            Some(existing) => SqlExpression::Arithmetic {
                op: BinaryArithmeticOp::Multiply,
                lhs: Box::new(existing.clone()),
                rhs: Box::new(factor),
            },
            None => factor,
        };
        TemporalCtx {
            adjusted_timestamp: self.adjusted_timestamp.clone(),
            scale: Some(scale),
            negate: self.negate,
            by_unit: self.by_unit,
        }
    }
}

/// Coarse temporal classification of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TemporalShape {
    Timestamp,
    DateOnly,
    Duration,
    Scalar,
    Other,
}

impl TemporalShape {
    fn is_instant(self) -> bool {
        matches!(self, TemporalShape::Timestamp | TemporalShape::DateOnly)
    }
}

fn shape_of_jdbc(jdbc: JdbcType) -> TemporalShape {
    if jdbc == JdbcType::Interval {
        TemporalShape::Duration
    } else if jdbc.is_date_only() {
        TemporalShape::DateOnly
    } else if jdbc.is_temporal() {
        TemporalShape::Timestamp
    } else if jdbc.is_numeric() {
        TemporalShape::Scalar
    } else {
        TemporalShape::Other
    }
}

pub(crate) fn shape_of(translator: &Translator<'_>, expression: &Expression) -> TemporalShape {
    match expression {
        Expression::Literal(Literal::Integer(_)) | Expression::Literal(Literal::Float(_)) => {
            TemporalShape::Scalar
        }
        Expression::Literal(_) => TemporalShape::Other,
        // An untyped parameter in arithmetic position is taken as scalar.
        Expression::Parameter(_) => TemporalShape::Scalar,
        Expression::Path(path) => translator
            .infer_path_mapping(path)
            .as_ref()
            .and_then(crate::metamodel::ValueMapping::single_jdbc)
            .map(shape_of_jdbc)
            .unwrap_or(TemporalShape::Other),
        Expression::Unary { operand, .. } => shape_of(translator, operand),
        Expression::Binary { op, lhs, rhs } => {
            let lhs_shape = shape_of(translator, lhs);
            let rhs_shape = shape_of(translator, rhs);
            match op {
                BinaryArithmeticOp::Add | BinaryArithmeticOp::Subtract => {
                    if lhs_shape.is_instant() && rhs_shape.is_instant() {
                        TemporalShape::Duration
                    } else if lhs_shape.is_instant() {
                        lhs_shape
                    } else if rhs_shape.is_instant() {
                        rhs_shape
                    } else if lhs_shape == TemporalShape::Duration
                        || rhs_shape == TemporalShape::Duration
                    {
                        TemporalShape::Duration
                    } else {
                        TemporalShape::Scalar
                    }
                }
                BinaryArithmeticOp::Multiply => {
                    if lhs_shape == TemporalShape::Duration || rhs_shape == TemporalShape::Duration
                    {
                        TemporalShape::Duration
                    } else {
                        TemporalShape::Scalar
                    }
                }
                _ => TemporalShape::Scalar,
            }
        }
        Expression::Function { name, .. } => function_registry::function_return_type(name)
            .map(shape_of_jdbc)
            .unwrap_or(TemporalShape::Other),
        Expression::Case(_) | Expression::Tuple(_) | Expression::Subquery(_) => {
            TemporalShape::Other
        }
        Expression::ToDuration { .. } => TemporalShape::Duration,
        Expression::ByUnit { .. } => TemporalShape::Scalar,
    }
}

pub(crate) fn is_duration(translator: &Translator<'_>, expression: &Expression) -> bool {
    shape_of(translator, expression) == TemporalShape::Duration
}

/// Does this binary node belong to the temporal rewriter?
pub(crate) fn is_temporal_arithmetic(
    translator: &Translator<'_>,
    lhs: &Expression,
    rhs: &Expression,
) -> bool {
    let lhs_shape = shape_of(translator, lhs);
    let rhs_shape = shape_of(translator, rhs);
    lhs_shape.is_instant()
        || rhs_shape.is_instant()
        || lhs_shape == TemporalShape::Duration
        || rhs_shape == TemporalShape::Duration
}

/// Entry point for any expression inside a temporal rewrite.
pub(crate) fn translate(
    translator: &mut Translator<'_>,
    expression: &Expression,
    ctx: TemporalCtx,
) -> Result<SqlExpression, TranslationError> {
    match expression {
        Expression::ToDuration { magnitude, unit } => {
            let magnitude = translator.translate_expression(magnitude)?;
            Ok(apply_duration(magnitude, *unit, ctx))
        }
        Expression::ByUnit { duration, unit } => {
            if ctx.adjusted_timestamp.is_some() {
                return Err(TranslationError::semantic(
                    "by-unit",
                    "a unit extraction cannot adjust a timestamp",
                ));
            }
            let inner = TemporalCtx {
                by_unit: Some(*unit),
                ..ctx
            };
            translate(translator, duration, inner)
        }
        Expression::Unary { op, operand } => {
            let negate = matches!(op, crate::domain::expr::UnaryArithmeticOp::Minus);
            translate(
                translator,
                operand,
                TemporalCtx {
                    negate: ctx.negate ^ negate,
                    ..ctx
                },
            )
        }
        Expression::Binary { op, lhs, rhs } => translate_binary(translator, *op, lhs, rhs, ctx),
        // A duration-valued leaf (an interval column or a duration-typed
        // function) carries nanoseconds natively.
        _ if shape_of(translator, expression) == TemporalShape::Duration => {
            let magnitude = translator.translate_expression(expression)?;
            Ok(apply_duration(magnitude, TemporalUnit::Nanosecond, ctx))
        }
        // An untyped parameter folded into timestamp arithmetic is read as
        // a duration magnitude in the native unit.
        Expression::Parameter(_) if ctx.adjusting() => {
            let magnitude = translator.translate_expression(expression)?;
            Ok(apply_duration(magnitude, TemporalUnit::Nanosecond, ctx))
        }
        _ => {
            if ctx.adjusting() {
                return Err(TranslationError::semantic(
                    "temporal arithmetic",
                    format!(
                        "expected a duration operand, found a {:?}-shaped expression",
                        shape_of(translator, expression)
                    ),
                ));
            }
            translator.translate_expression(expression)
        }
    }
}

pub(crate) fn translate_binary(
    translator: &mut Translator<'_>,
    op: BinaryArithmeticOp,
    lhs: &Expression,
    rhs: &Expression,
    ctx: TemporalCtx,
) -> Result<SqlExpression, TranslationError> {
    let lhs_shape = shape_of(translator, lhs);
    let rhs_shape = shape_of(translator, rhs);
    match op {
        BinaryArithmeticOp::Add | BinaryArithmeticOp::Subtract => {
            if lhs_shape.is_instant() && rhs_shape.is_instant() {
                if op == BinaryArithmeticOp::Add {
                    return Err(TranslationError::semantic(
                        "+",
                        "two timestamps cannot be added",
                    ));
                }
                return translate_diff(translator, lhs, rhs, lhs_shape, rhs_shape, ctx);
            }
            if lhs_shape.is_instant() {
                // ts ± duration: translate the timestamp side fresh, then
                // fold the duration side onto it.
                let timestamp = translate(translator, lhs, TemporalCtx::default())?;
                return translate(
                    translator,
                    rhs,
                    TemporalCtx {
                        adjusted_timestamp: Some(timestamp),
                        scale: ctx.scale,
                        negate: ctx.negate ^ (op == BinaryArithmeticOp::Subtract),
                        by_unit: ctx.by_unit,
                    },
                );
            }
            if rhs_shape.is_instant() {
                if op == BinaryArithmeticOp::Subtract {
                    return Err(TranslationError::semantic(
                        "-",
                        "a timestamp cannot be subtracted from a duration",
                    ));
                }
                let timestamp = translate(translator, rhs, TemporalCtx::default())?;
                return translate(
                    translator,
                    lhs,
                    TemporalCtx {
                        adjusted_timestamp: Some(timestamp),
                        scale: ctx.scale,
                        negate: ctx.negate,
                        by_unit: ctx.by_unit,
                    },
                );
            }
            // duration ± duration.
            if lhs_shape == TemporalShape::Duration && rhs_shape == TemporalShape::Duration {
                if ctx.adjusted_timestamp.is_some() {
                    // Distribute over the adjustment: fold the left side
                    // onto the timestamp, then the right side onto that.
                    let adjusted = translate(translator, lhs, ctx.clone())?;
                    return translate(
                        translator,
                        rhs,
                        TemporalCtx {
                            adjusted_timestamp: Some(adjusted),
                            scale: ctx.scale,
                            negate: ctx.negate ^ (op == BinaryArithmeticOp::Subtract),
                            by_unit: ctx.by_unit,
                        },
                    );
                }
                // Standalone duration value: combine magnitudes, negation
                // applied leaf-side.
                let left = translate(translator, lhs, ctx.clone())?;
                let right = translate(
                    translator,
                    rhs,
                    TemporalCtx {
                        negate: ctx.negate ^ (op == BinaryArithmeticOp::Subtract),
                        ..ctx
                    },
                )?;
                return Ok(SqlExpression::Arithmetic {
                    op: BinaryArithmeticOp::Add,
                    lhs: Box::new(left),
                    rhs: Box::new(right),
                });
            }
            Err(shape_error(op, lhs_shape, rhs_shape))
        }

        BinaryArithmeticOp::Multiply => {
            // scalar * duration (either order): the scalar folds into the
            // accumulated scale and the duration subtree is re-entered.
            if lhs_shape == TemporalShape::Scalar && rhs_shape == TemporalShape::Duration {
                let factor = translator.translate_expression(lhs)?;
                return translate(translator, rhs, ctx.scaled(factor));
            }
            if lhs_shape == TemporalShape::Duration && rhs_shape == TemporalShape::Scalar {
                let factor = translator.translate_expression(rhs)?;
                return translate(translator, lhs, ctx.scaled(factor));
            }
            Err(shape_error(op, lhs_shape, rhs_shape))
        }

        BinaryArithmeticOp::Divide | BinaryArithmeticOp::Modulo => {
            Err(shape_error(op, lhs_shape, rhs_shape))
        }
    }
}

/// `instant - instant`: a duration. Emits `DiffInterval` in the requested
/// unit (or the native one), scaled and adjusted per the context.
fn translate_diff(
    translator: &mut Translator<'_>,
    lhs: &Expression,
    rhs: &Expression,
    lhs_shape: TemporalShape,
    rhs_shape: TemporalShape,
    ctx: TemporalCtx,
) -> Result<SqlExpression, TranslationError> {
    let native = if lhs_shape == TemporalShape::DateOnly && rhs_shape == TemporalShape::DateOnly {
        TemporalUnit::Day
    } else {
        TemporalUnit::Nanosecond
    };
    let unit = ctx.by_unit.unwrap_or(native);

    // Either operand may itself be adjusted arithmetic.
    let minuend = translate(translator, lhs, TemporalCtx::default())?;
    let subtrahend = translate(translator, rhs, TemporalCtx::default())?;

    // Negation swaps the operands instead of wrapping the result.
    let (start, end) = if ctx.negate {
        (minuend, subtrahend)
    } else {
        (subtrahend, minuend)
    };
    let mut result = SqlExpression::DiffInterval {
        unit,
        start: Box::new(start),
        end: Box::new(end),
    };
    if let Some(scale) = ctx.scale {
        result = SqlExpression::Arithmetic {
            op: BinaryArithmeticOp::Multiply,
            lhs: Box::new(result),
            rhs: Box::new(scale),
        };
    }
    if let Some(timestamp) = ctx.adjusted_timestamp {
        result = SqlExpression::AddInterval {
            timestamp: Box::new(timestamp),
            magnitude: Box::new(result),
            unit,
        };
    }
    Ok(result)
}

/// Fold a duration magnitude in `unit` into the context: scale it, negate
/// it, then either adjust the pending timestamp or surface it as a number
/// in the requested (or native) unit.
fn apply_duration(magnitude: SqlExpression, unit: TemporalUnit, ctx: TemporalCtx) -> SqlExpression {
    let mut magnitude = magnitude;
    if let Some(scale) = ctx.scale {
        magnitude = SqlExpression::Arithmetic {
            op: BinaryArithmeticOp::Multiply,
            lhs: Box::new(magnitude),
            rhs: Box::new(scale),
        };
    }
    if ctx.negate {
        magnitude = SqlExpression::Negated(Box::new(magnitude));
    }
    if let Some(timestamp) = ctx.adjusted_timestamp {
        return SqlExpression::AddInterval {
            timestamp: Box::new(timestamp),
            magnitude: Box::new(magnitude),
            unit,
        };
    }
    let target = ctx.by_unit.unwrap_or(TemporalUnit::Nanosecond);
    if target == unit {
        magnitude
    } else {
        SqlExpression::UnitConversion {
            magnitude: Box::new(magnitude),
            from: unit,
            to: target,
        }
    }
}

fn shape_error(
    op: BinaryArithmeticOp,
    lhs: TemporalShape,
    rhs: TemporalShape,
) -> TranslationError {
    TranslationError::semantic(
        op.to_string(),
        format!("operator not defined for {:?} and {:?} operands", lhs, rhs),
    )
}
