//! Placeholder generation and multi-valued expansion.

use test_case::test_case;

use sqlift::domain::expr::{
    BoundValue, Expression, Literal, ParameterId, ParameterRef, ParameterValues,
};
use sqlift::domain::from::{FromClause, FromRoot};
use sqlift::domain::path::NavigablePath;
use sqlift::domain::predicate::{ComparisonOp, Predicate};
use sqlift::domain::statement::{QuerySpec, Selection};
use sqlift::metamodel::JdbcType;
use sqlift::relational::{SqlExpression, SqlPredicate};

use crate::fixtures::{
    commerce_model, first_spec, select_statement, translate, translate_with_values,
};

fn order_path() -> NavigablePath {
    NavigablePath::root("o")
}

fn order_query(predicate: Predicate) -> QuerySpec {
    QuerySpec {
        from: FromClause::single(FromRoot::new("Order", "o")),
        selections: vec![Selection::of(Expression::path(order_path().append("id")))],
        predicate: Some(predicate),
        ..QuerySpec::default()
    }
}

#[test]
fn scalar_parameter_gets_one_typed_placeholder() {
    let model = commerce_model();
    let spec = order_query(Predicate::Comparison {
        op: ComparisonOp::GreaterThan,
        lhs: Expression::path(order_path().append("total")),
        rhs: Expression::Parameter(ParameterRef::named("min")),
    });
    let translation = translate(&model, &select_statement(spec, None));

    assert_eq!(translation.parameters.len(), 1);
    let binding = &translation.parameters[0];
    assert_eq!(binding.parameter, ParameterId::Named("min".to_string()));
    assert_eq!(binding.placeholders.len(), 1);
    // The opposite operand's column type flows into the placeholder.
    assert_eq!(binding.placeholders[0].jdbc, Some(JdbcType::Double));
}

#[test]
fn entity_valued_comparison_types_parameter_by_foreign_key() {
    let model = commerce_model();
    let spec = order_query(Predicate::equal(
        Expression::path(order_path().append("customer")),
        Expression::Parameter(ParameterRef::named("customer")),
    ));
    let translation = translate(&model, &select_statement(spec, None));

    let binding = &translation.parameters[0];
    assert_eq!(binding.placeholders.len(), 1);
    assert_eq!(binding.placeholders[0].jdbc, Some(JdbcType::BigInt));
}

#[test]
fn embedded_comparison_expands_parameter_to_tuple() {
    let model = commerce_model();
    let spec = QuerySpec {
        from: FromClause::single(FromRoot::new("Customer", "c")),
        selections: vec![Selection::of(Expression::path(
            NavigablePath::root("c").append("id"),
        ))],
        predicate: Some(Predicate::equal(
            Expression::path(NavigablePath::root("c").append("address")),
            Expression::Parameter(ParameterRef::named("address")),
        )),
        ..QuerySpec::default()
    };
    let translation = translate(&model, &select_statement(spec, None));

    let binding = &translation.parameters[0];
    assert_eq!(binding.placeholders.len(), 2);
    assert_eq!(binding.placeholders[0].index, 0);
    assert_eq!(binding.placeholders[1].index, 1);
    let spec = first_spec(&translation);
    match &spec.predicate {
        Some(SqlPredicate::Comparison { rhs, .. }) => {
            assert!(matches!(rhs, SqlExpression::Tuple(items) if items.len() == 2));
        }
        other => panic!("expected a comparison, got {other:?}"),
    }
}

#[test]
fn repeated_parameter_binds_once_per_occurrence() {
    let model = commerce_model();
    let spec = order_query(Predicate::and(vec![
        Predicate::Comparison {
            op: ComparisonOp::GreaterThanEqual,
            lhs: Expression::path(order_path().append("total")),
            rhs: Expression::Parameter(ParameterRef::named("amount")),
        },
        Predicate::Comparison {
            op: ComparisonOp::LessThan,
            lhs: Expression::path(order_path().append("total")),
            rhs: Expression::binary(
                sqlift::domain::expr::BinaryArithmeticOp::Multiply,
                Expression::Parameter(ParameterRef::named("amount")),
                Expression::integer(2),
            ),
        },
    ]));
    let translation = translate(&model, &select_statement(spec, None));

    assert_eq!(translation.parameters.len(), 2);
    assert_eq!(
        translation.parameters[0].parameter,
        translation.parameters[1].parameter
    );
}

#[test_case(1; "singleton list")]
#[test_case(3; "three values")]
#[test_case(7; "seven values")]
fn multi_valued_in_expands_one_placeholder_per_value(count: usize) {
    let model = commerce_model();
    let values = ParameterValues::default().with(
        ParameterId::Named("statuses".to_string()),
        BoundValue::List(
            (0..count)
                .map(|i| Literal::String(format!("status-{i}")))
                .collect(),
        ),
    );
    let spec = order_query(Predicate::InList {
        expr: Expression::path(order_path().append("status")),
        items: vec![Expression::Parameter(
            ParameterRef::named("statuses").multi_valued(),
        )],
        negated: false,
    });
    let translation =
        translate_with_values(&model, &select_statement(spec, None), values).expect("translates");

    assert_eq!(translation.parameters.len(), 1);
    let binding = &translation.parameters[0];
    assert_eq!(binding.placeholders.len(), count);
    for (index, placeholder) in binding.placeholders.iter().enumerate() {
        assert_eq!(placeholder.index, index);
        assert_eq!(placeholder.jdbc, Some(JdbcType::Varchar));
    }
    let spec = first_spec(&translation);
    match &spec.predicate {
        Some(SqlPredicate::InList { items, .. }) => assert_eq!(items.len(), count),
        other => panic!("expected an in-list, got {other:?}"),
    }
}

#[test]
fn empty_expansion_folds_to_constant_false() {
    let model = commerce_model();
    let values = ParameterValues::default().with(
        ParameterId::Named("statuses".to_string()),
        BoundValue::List(Vec::new()),
    );
    let spec = order_query(Predicate::InList {
        expr: Expression::path(order_path().append("status")),
        items: vec![Expression::Parameter(
            ParameterRef::named("statuses").multi_valued(),
        )],
        negated: false,
    });
    let translation =
        translate_with_values(&model, &select_statement(spec, None), values).expect("translates");

    assert!(translation.parameters.is_empty());
    assert_eq!(
        first_spec(&translation).predicate,
        Some(SqlPredicate::ConstantFalse)
    );
}

#[test]
fn negated_empty_expansion_folds_to_constant_true() {
    let model = commerce_model();
    let values = ParameterValues::default().with(
        ParameterId::Named("statuses".to_string()),
        BoundValue::List(Vec::new()),
    );
    let spec = order_query(Predicate::InList {
        expr: Expression::path(order_path().append("status")),
        items: vec![Expression::Parameter(
            ParameterRef::named("statuses").multi_valued(),
        )],
        negated: true,
    });
    let translation =
        translate_with_values(&model, &select_statement(spec, None), values).expect("translates");

    assert_eq!(
        first_spec(&translation).predicate,
        Some(SqlPredicate::ConstantTrue)
    );
}

#[test]
fn unbound_multi_valued_parameter_stays_single_placeholder() {
    // No value known at translation time; expansion is impossible and the
    // list keeps one placeholder.
    let model = commerce_model();
    let spec = order_query(Predicate::InList {
        expr: Expression::path(order_path().append("status")),
        items: vec![Expression::Parameter(
            ParameterRef::named("statuses").multi_valued(),
        )],
        negated: false,
    });
    let translation = translate(&model, &select_statement(spec, None));

    assert_eq!(translation.parameters.len(), 1);
    assert_eq!(translation.parameters[0].placeholders.len(), 1);
}

#[test]
fn positional_parameters_keep_occurrence_order() {
    let model = commerce_model();
    let spec = order_query(Predicate::and(vec![
        Predicate::equal(
            Expression::path(order_path().append("status")),
            Expression::Parameter(ParameterRef::positional(1)),
        ),
        Predicate::equal(
            Expression::path(order_path().append("total")),
            Expression::Parameter(ParameterRef::positional(2)),
        ),
    ]));
    let translation = translate(&model, &select_statement(spec, None));

    let ids: Vec<_> = translation
        .parameters
        .iter()
        .map(|b| b.parameter.clone())
        .collect();
    assert_eq!(ids, vec![ParameterId::Positional(1), ParameterId::Positional(2)]);
}
