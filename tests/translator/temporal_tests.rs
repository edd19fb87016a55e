//! Temporal arithmetic rewriting: interval primitives, unit handling and
//! the duration distribution law.

use sqlift::domain::expr::{
    BinaryArithmeticOp, Expression, ParameterRef, TemporalUnit, UnaryArithmeticOp,
};
use sqlift::domain::from::{FromClause, FromRoot};
use sqlift::domain::path::NavigablePath;
use sqlift::domain::statement::{QuerySpec, Selection};
use sqlift::relational::SqlExpression;

use crate::fixtures::{
    commerce_model, select_statement, translate_order_selection, try_translate,
};

fn placed_at() -> Expression {
    Expression::path(NavigablePath::root("o").append("placed_at"))
}

fn ship_date() -> Expression {
    Expression::path(NavigablePath::root("o").append("ship_date"))
}

fn delivery_date() -> Expression {
    Expression::path(NavigablePath::root("o").append("delivery_date"))
}

fn duration(magnitude: i64, unit: TemporalUnit) -> Expression {
    Expression::ToDuration {
        magnitude: Box::new(Expression::integer(magnitude)),
        unit,
    }
}

fn selected(translation: &sqlift::relational::Translation) -> &SqlExpression {
    &crate::fixtures::first_spec(translation).selections[0].expression
}

#[test]
fn timestamp_plus_duration_becomes_add_interval() {
    let translation = translate_order_selection(Expression::binary(
        BinaryArithmeticOp::Add,
        placed_at(),
        duration(3, TemporalUnit::Day),
    ));

    match selected(&translation) {
        SqlExpression::AddInterval {
            timestamp,
            magnitude,
            unit,
        } => {
            assert!(matches!(**timestamp, SqlExpression::Column(_)));
            assert_eq!(**magnitude, SqlExpression::integer(3));
            assert_eq!(*unit, TemporalUnit::Day);
        }
        other => panic!("expected AddInterval, got {other:?}"),
    }
}

#[test]
fn timestamp_minus_duration_negates_the_magnitude() {
    let translation = translate_order_selection(Expression::binary(
        BinaryArithmeticOp::Subtract,
        placed_at(),
        duration(2, TemporalUnit::Hour),
    ));

    match selected(&translation) {
        SqlExpression::AddInterval { magnitude, unit, .. } => {
            assert_eq!(*unit, TemporalUnit::Hour);
            assert!(matches!(**magnitude, SqlExpression::Negated(_)));
        }
        other => panic!("expected AddInterval, got {other:?}"),
    }
}

#[test]
fn scaled_duration_difference_distributes_over_the_timestamp() {
    // ts + 2 * (1 day - 2 hours) must translate exactly like its
    // distributed form (ts + 2 * 1 day) - 2 * 2 hours.
    let factored = Expression::binary(
        BinaryArithmeticOp::Add,
        placed_at(),
        Expression::binary(
            BinaryArithmeticOp::Multiply,
            Expression::integer(2),
            Expression::binary(
                BinaryArithmeticOp::Subtract,
                duration(1, TemporalUnit::Day),
                duration(2, TemporalUnit::Hour),
            ),
        ),
    );
    let distributed = Expression::binary(
        BinaryArithmeticOp::Subtract,
        Expression::binary(
            BinaryArithmeticOp::Add,
            placed_at(),
            Expression::binary(
                BinaryArithmeticOp::Multiply,
                Expression::integer(2),
                duration(1, TemporalUnit::Day),
            ),
        ),
        Expression::binary(
            BinaryArithmeticOp::Multiply,
            Expression::integer(2),
            duration(2, TemporalUnit::Hour),
        ),
    );

    let factored = translate_order_selection(factored);
    let distributed = translate_order_selection(distributed);
    assert_eq!(selected(&factored), selected(&distributed));

    // Shape check: nested adjustments, innermost first.
    match selected(&factored) {
        SqlExpression::AddInterval {
            timestamp, unit, ..
        } => {
            assert_eq!(*unit, TemporalUnit::Hour);
            assert!(matches!(**timestamp, SqlExpression::AddInterval { .. }));
        }
        other => panic!("expected nested AddInterval, got {other:?}"),
    }
}

#[test]
fn timestamp_difference_in_requested_unit() {
    let translation = translate_order_selection(Expression::ByUnit {
        duration: Box::new(Expression::binary(
            BinaryArithmeticOp::Subtract,
            delivery_date(),
            ship_date(),
        )),
        unit: TemporalUnit::Week,
    });

    match selected(&translation) {
        SqlExpression::DiffInterval { unit, start, end } => {
            assert_eq!(*unit, TemporalUnit::Week);
            // end - start reads minuend minus subtrahend.
            assert!(matches!(**end, SqlExpression::Column(_)));
            assert!(matches!(**start, SqlExpression::Column(_)));
        }
        other => panic!("expected DiffInterval, got {other:?}"),
    }
}

#[test]
fn date_only_difference_defaults_to_days() {
    let translation = translate_order_selection(Expression::binary(
        BinaryArithmeticOp::Subtract,
        delivery_date(),
        ship_date(),
    ));

    match selected(&translation) {
        SqlExpression::DiffInterval { unit, .. } => assert_eq!(*unit, TemporalUnit::Day),
        other => panic!("expected DiffInterval, got {other:?}"),
    }
}

#[test]
fn timestamp_difference_defaults_to_nanoseconds() {
    let translation = translate_order_selection(Expression::binary(
        BinaryArithmeticOp::Subtract,
        placed_at(),
        placed_at(),
    ));

    match selected(&translation) {
        SqlExpression::DiffInterval { unit, .. } => {
            assert_eq!(*unit, TemporalUnit::Nanosecond)
        }
        other => panic!("expected DiffInterval, got {other:?}"),
    }
}

#[test]
fn negated_difference_swaps_the_operands() {
    let plain = translate_order_selection(Expression::binary(
        BinaryArithmeticOp::Subtract,
        delivery_date(),
        ship_date(),
    ));
    let negated = translate_order_selection(Expression::Unary {
        op: UnaryArithmeticOp::Minus,
        operand: Box::new(Expression::binary(
            BinaryArithmeticOp::Subtract,
            delivery_date(),
            ship_date(),
        )),
    });

    match (selected(&plain), selected(&negated)) {
        (
            SqlExpression::DiffInterval {
                start: plain_start,
                end: plain_end,
                ..
            },
            SqlExpression::DiffInterval {
                start: negated_start,
                end: negated_end,
                ..
            },
        ) => {
            assert_eq!(plain_start, negated_end);
            assert_eq!(plain_end, negated_start);
        }
        other => panic!("expected two DiffIntervals, got {other:?}"),
    }
}

#[test]
fn duration_in_number_position_converts_units() {
    let translation = translate_order_selection(Expression::ByUnit {
        duration: Box::new(duration(90, TemporalUnit::Minute)),
        unit: TemporalUnit::Hour,
    });

    match selected(&translation) {
        SqlExpression::UnitConversion {
            magnitude,
            from,
            to,
        } => {
            assert_eq!(**magnitude, SqlExpression::integer(90));
            assert_eq!(*from, TemporalUnit::Minute);
            assert_eq!(*to, TemporalUnit::Hour);
        }
        other => panic!("expected UnitConversion, got {other:?}"),
    }
}

#[test]
fn bare_duration_materializes_in_nanoseconds() {
    let translation = translate_order_selection(duration(5, TemporalUnit::Day));

    match selected(&translation) {
        SqlExpression::UnitConversion { from, to, .. } => {
            assert_eq!(*from, TemporalUnit::Day);
            assert_eq!(*to, TemporalUnit::Nanosecond);
        }
        other => panic!("expected UnitConversion, got {other:?}"),
    }
}

#[test]
fn adding_two_timestamps_is_a_semantic_error() {
    let model = commerce_model();
    let spec = QuerySpec {
        from: FromClause::single(FromRoot::new("Order", "o")),
        selections: vec![Selection::of(Expression::binary(
            BinaryArithmeticOp::Add,
            placed_at(),
            placed_at(),
        ))],
        ..QuerySpec::default()
    };
    let error = try_translate(&model, &select_statement(spec, None))
        .expect_err("adding timestamps must fail");
    assert!(error.to_string().contains("timestamp"), "got: {error}");
}

#[test]
fn numeric_column_added_to_a_timestamp_is_rejected() {
    let model = commerce_model();
    let spec = QuerySpec {
        from: FromClause::single(FromRoot::new("Order", "o")),
        selections: vec![Selection::of(Expression::binary(
            BinaryArithmeticOp::Add,
            placed_at(),
            Expression::path(NavigablePath::root("o").append("total")),
        ))],
        ..QuerySpec::default()
    };
    let error = try_translate(&model, &select_statement(spec, None))
        .expect_err("a numeric column is not a duration");
    assert!(error.to_string().contains("duration"), "got: {error}");
}

#[test]
fn parameter_added_to_a_timestamp_reads_as_a_duration() {
    let translation = translate_order_selection(Expression::binary(
        BinaryArithmeticOp::Add,
        placed_at(),
        Expression::Parameter(ParameterRef::named("shift")),
    ));

    match selected(&translation) {
        SqlExpression::AddInterval {
            timestamp,
            magnitude,
            unit,
        } => {
            assert!(matches!(**timestamp, SqlExpression::Column(_)));
            assert!(matches!(**magnitude, SqlExpression::Placeholder(_)));
            assert_eq!(*unit, TemporalUnit::Nanosecond);
        }
        other => panic!("expected AddInterval, got {other:?}"),
    }
    assert_eq!(translation.parameters.len(), 1);
}
