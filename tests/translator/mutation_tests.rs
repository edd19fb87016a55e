//! Insert, update and delete translation.

use sqlift::domain::expr::{Expression, ParameterRef};
use sqlift::domain::from::{FromClause, FromRoot};
use sqlift::domain::path::NavigablePath;
use sqlift::domain::predicate::Predicate;
use sqlift::domain::statement::{Assignment, QueryPart, QuerySpec, Selection, Statement};
use sqlift::metamodel::JdbcType;
use sqlift::relational::{SqlExpression, SqlStatement};

use crate::fixtures::{commerce_model, translate, try_translate};

fn order_path() -> NavigablePath {
    NavigablePath::root("o")
}

#[test]
fn update_resolves_basic_and_association_targets() {
    let model = commerce_model();
    let statement = Statement::Update {
        target: "Order".to_string(),
        alias: "o".to_string(),
        assignments: vec![
            Assignment {
                target: order_path().append("status"),
                value: Expression::string("shipped"),
            },
            Assignment {
                target: order_path().append("customer"),
                value: Expression::Parameter(ParameterRef::named("customer")),
            },
        ],
        predicate: Some(Predicate::equal(
            Expression::path(order_path().append("id")),
            Expression::Parameter(ParameterRef::named("id")),
        )),
    };
    let translation = translate(&model, &statement);

    match &translation.statement {
        SqlStatement::Update {
            assignments,
            predicate,
            ..
        } => {
            assert_eq!(assignments.len(), 2);
            assert_eq!(assignments[0].column.column, "status");
            // The association writes its foreign-key column.
            assert_eq!(assignments[1].column.column, "customer_id");
            assert!(predicate.is_some());
        }
        other => panic!("expected an update, got {other:?}"),
    }
    // :customer then :id, both typed from their targets.
    assert_eq!(translation.parameters.len(), 2);
    assert_eq!(
        translation.parameters[0].placeholders[0].jdbc,
        Some(JdbcType::BigInt)
    );
    assert_eq!(
        translation.parameters[1].placeholders[0].jdbc,
        Some(JdbcType::BigInt)
    );
}

#[test]
fn update_decomposes_embedded_assignment() {
    let model = commerce_model();
    let statement = Statement::Update {
        target: "Customer".to_string(),
        alias: "c".to_string(),
        assignments: vec![Assignment {
            target: NavigablePath::root("c").append("address"),
            value: Expression::Tuple(vec![
                Expression::string("1 Main St"),
                Expression::string("Springfield"),
            ]),
        }],
        predicate: None,
    };
    let translation = translate(&model, &statement);

    match &translation.statement {
        SqlStatement::Update { assignments, .. } => {
            assert_eq!(assignments.len(), 2);
            assert_eq!(assignments[0].column.column, "street");
            assert_eq!(assignments[1].column.column, "city");
        }
        other => panic!("expected an update, got {other:?}"),
    }
}

#[test]
fn update_through_association_is_rejected() {
    let model = commerce_model();
    let statement = Statement::Update {
        target: "Order".to_string(),
        alias: "o".to_string(),
        assignments: vec![Assignment {
            target: order_path().append("customer").append("name"),
            value: Expression::string("Ada"),
        }],
        predicate: None,
    };
    let error = try_translate(&model, &statement).expect_err("cross-table update must fail");
    assert!(error.to_string().contains("customer"), "got: {error}");
}

#[test]
fn delete_translates_predicate_against_target() {
    let model = commerce_model();
    let statement = Statement::Delete {
        target: "Order".to_string(),
        alias: "o".to_string(),
        predicate: Some(Predicate::equal(
            Expression::path(order_path().append("status")),
            Expression::string("cancelled"),
        )),
    };
    let translation = translate(&model, &statement);

    match &translation.statement {
        SqlStatement::Delete { target, predicate } => {
            assert_eq!(translation.table_groups.get(*target).primary.table, "orders");
            assert!(predicate.is_some());
        }
        other => panic!("expected a delete, got {other:?}"),
    }
}

#[test]
fn insert_values_types_parameters_from_target_columns() {
    let model = commerce_model();
    let statement = Statement::InsertValues {
        target: "Order".to_string(),
        target_paths: vec![
            order_path().append("id"),
            order_path().append("status"),
            order_path().append("customer"),
        ],
        values: vec![vec![
            Expression::integer(7),
            Expression::string("open"),
            Expression::Parameter(ParameterRef::named("customer")),
        ]],
    };
    let translation = translate(&model, &statement);

    match &translation.statement {
        SqlStatement::InsertValues {
            target,
            columns,
            values,
        } => {
            assert_eq!(target.table, "orders");
            let names: Vec<&str> = columns.iter().map(|c| c.column.as_str()).collect();
            assert_eq!(names, vec!["id", "status", "customer_id"]);
            assert_eq!(values.len(), 1);
            assert!(matches!(values[0][2], SqlExpression::Placeholder(_)));
        }
        other => panic!("expected insert-values, got {other:?}"),
    }
    assert_eq!(
        translation.parameters[0].placeholders[0].jdbc,
        Some(JdbcType::BigInt)
    );
}

#[test]
fn insert_values_arity_mismatch_is_rejected() {
    let model = commerce_model();
    let statement = Statement::InsertValues {
        target: "Order".to_string(),
        target_paths: vec![order_path().append("id"), order_path().append("status")],
        values: vec![vec![Expression::integer(7)]],
    };
    assert!(try_translate(&model, &statement).is_err());
}

#[test]
fn insert_select_translates_source_in_its_own_scope() {
    let model = commerce_model();
    let source = QuerySpec {
        from: FromClause::single(FromRoot::new("Order", "src")),
        selections: vec![
            Selection::of(Expression::path(NavigablePath::root("src").append("id"))),
            Selection::of(Expression::path(NavigablePath::root("src").append("status"))),
        ],
        ..QuerySpec::default()
    };
    let statement = Statement::InsertSelect {
        target: "Order".to_string(),
        target_paths: vec![order_path().append("id"), order_path().append("status")],
        source: QueryPart::Spec(source),
    };
    let translation = translate(&model, &statement);

    match &translation.statement {
        SqlStatement::InsertSelect {
            target,
            columns,
            source,
        } => {
            assert_eq!(target.table, "orders");
            assert_eq!(columns.len(), 2);
            let spec = source.first_spec().expect("source spec");
            assert_eq!(spec.selections.len(), 2);
        }
        other => panic!("expected insert-select, got {other:?}"),
    }
}
