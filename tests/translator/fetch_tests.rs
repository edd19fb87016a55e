//! Fetch planning: precedence, depth cutoff, cycles and bag detection.

use sqlift::config::TranslatorConfig;
use sqlift::domain::expr::Expression;
use sqlift::domain::from::{FromClause, FromJoin, FromRoot, JoinKind};
use sqlift::domain::path::NavigablePath;
use sqlift::domain::statement::{AppliedFetchGraph, QuerySpec, Selection, Statement};
use sqlift::metamodel::builder::MetamodelBuilder;
use sqlift::metamodel::{
    FetchStyle, FetchTiming, ForeignKeyDescriptor, JdbcType, Metamodel,
};
use sqlift::relational::{Fetch, Translation};
use sqlift::translator::{TranslationError, Translator};

use crate::fixtures::{commerce_model, first_spec, select_statement};

fn order_select() -> Statement {
    let spec = QuerySpec {
        from: FromClause::single(FromRoot::new("Order", "o")),
        selections: vec![Selection::of(Expression::path(
            NavigablePath::root("o").append("id"),
        ))],
        ..QuerySpec::default()
    };
    select_statement(spec, Some("Order"))
}

fn translate_fetches(
    model: &Metamodel,
    config: TranslatorConfig,
    statement: &Statement,
) -> Result<Translation, TranslationError> {
    let _ = env_logger::builder().is_test(true).try_init();
    Translator::new(model, config).translate(statement)
}

fn fetch<'a>(fetches: &'a [Fetch], role: &str) -> &'a Fetch {
    fetches
        .iter()
        .find(|f| f.role == role)
        .unwrap_or_else(|| panic!("no fetch planned for {role}"))
}

#[test]
fn declared_defaults_defer_associations() {
    let model = commerce_model();
    let translation =
        translate_fetches(&model, TranslatorConfig::default(), &order_select()).expect("translates");

    let spec = first_spec(&translation);
    let customer = fetch(&spec.fetches, "Order.customer");
    assert_eq!(customer.timing, FetchTiming::Delayed);
    assert!(!customer.joined);
    assert!(customer.table_group.is_none());
    // Deferred fetches plan no children.
    assert!(customer.children.is_empty());
    // The from-clause stays a single table.
    assert_eq!(translation.table_groups.len(), 1);
}

#[test]
fn explicit_join_fetch_reuses_the_joined_group() {
    let model = commerce_model();
    let spec = QuerySpec {
        from: FromClause::single(FromRoot::new("Order", "o").with_join(
            FromJoin::attribute(JoinKind::Left, NavigablePath::root("o").append("items"))
                .fetched(),
        )),
        selections: vec![Selection::of(Expression::path(
            NavigablePath::root("o").append("id"),
        ))],
        ..QuerySpec::default()
    };
    let translation = translate_fetches(
        &model,
        TranslatorConfig::default(),
        &select_statement(spec, Some("Order")),
    )
    .expect("translates");

    let spec = first_spec(&translation);
    let items = fetch(&spec.fetches, "Order.items");
    assert_eq!(items.timing, FetchTiming::Immediate);
    assert!(items.joined);
    // Same group the from-clause built; no second join.
    let root = translation.table_groups.get(spec.roots[0]);
    assert_eq!(root.joins.len(), 1);
    assert_eq!(items.table_group, Some(root.joins[0].joined));
}

#[test]
fn two_bag_join_fetches_are_rejected_together() {
    let model = commerce_model();
    let root = FromRoot::new("Order", "o")
        .with_join(
            FromJoin::attribute(JoinKind::Left, NavigablePath::root("o").append("items"))
                .fetched(),
        )
        .with_join(
            FromJoin::attribute(JoinKind::Left, NavigablePath::root("o").append("discounts"))
                .fetched(),
        );
    let spec = QuerySpec {
        from: FromClause::single(root),
        selections: vec![Selection::of(Expression::path(
            NavigablePath::root("o").append("id"),
        ))],
        ..QuerySpec::default()
    };
    let error = translate_fetches(
        &model,
        TranslatorConfig::default(),
        &select_statement(spec, Some("Order")),
    )
    .expect_err("two bags must fail");

    match &error {
        TranslationError::MultipleBagFetch { roles } => {
            assert!(roles.contains(&"Order.items".to_string()));
            assert!(roles.contains(&"Order.discounts".to_string()));
        }
        other => panic!("expected MultipleBagFetch, got {other:?}"),
    }
    let message = error.to_string();
    assert!(message.contains("Order.items"), "got: {message}");
    assert!(message.contains("Order.discounts"), "got: {message}");
}

#[test]
fn fetch_graph_overrides_declared_defaults() {
    let model = commerce_model();
    let graph = AppliedFetchGraph::new().join("customer").select("items");
    let translation = Translator::new(&model, TranslatorConfig::default())
        .with_fetch_graph(graph)
        .translate(&order_select())
        .expect("translates");

    let spec = first_spec(&translation);
    let customer = fetch(&spec.fetches, "Order.customer");
    assert_eq!(customer.timing, FetchTiming::Immediate);
    assert!(customer.joined);
    assert!(customer.table_group.is_some());

    let items = fetch(&spec.fetches, "Order.items");
    assert_eq!(items.timing, FetchTiming::Immediate);
    assert!(!items.joined);
    assert!(items.table_group.is_none());
}

#[test]
fn enabled_profile_promotes_fetch_to_join() {
    let model = MetamodelBuilder::new()
        .entity("Order", "orders")
        .identifier("id", JdbcType::BigInt)
        .to_one(
            "customer",
            "Customer",
            ForeignKeyDescriptor::scalar("customer_id", "id", JdbcType::BigInt),
        )
        .fetch_profile("order-with-customer", FetchStyle::Join)
        .done()
        .entity("Customer", "customers")
        .identifier("id", JdbcType::BigInt)
        .done()
        .build();

    let config = TranslatorConfig::default().with_fetch_profile("order-with-customer");
    let translation = translate_fetches(&model, config, &order_select()).expect("translates");

    let customer = fetch(&first_spec(&translation).fetches, "Order.customer");
    assert!(customer.joined);
    // Without the profile, the declared default defers.
    let translation =
        translate_fetches(&model, TranslatorConfig::default(), &order_select()).expect("translates");
    let customer = fetch(&first_spec(&translation).fetches, "Order.customer");
    assert!(!customer.joined);
}

/// Mutually referencing entities eagerly join-fetching each other.
fn mutual_model() -> Metamodel {
    MetamodelBuilder::new()
        .entity("Employee", "employees")
        .identifier("id", JdbcType::BigInt)
        .to_one(
            "manager",
            "Manager",
            ForeignKeyDescriptor::scalar("manager_id", "id", JdbcType::BigInt),
        )
        .fetch(FetchTiming::Immediate, FetchStyle::Join)
        .done()
        .entity("Manager", "managers")
        .identifier("id", JdbcType::BigInt)
        .to_one(
            "assistant",
            "Employee",
            ForeignKeyDescriptor::scalar("assistant_id", "id", JdbcType::BigInt),
        )
        .fetch(FetchTiming::Immediate, FetchStyle::Join)
        .done()
        .build()
}

fn employee_select() -> Statement {
    let spec = QuerySpec {
        from: FromClause::single(FromRoot::new("Employee", "e")),
        selections: vec![Selection::of(Expression::path(
            NavigablePath::root("e").append("id"),
        ))],
        ..QuerySpec::default()
    };
    select_statement(spec, Some("Employee"))
}

#[test]
fn circular_fetch_becomes_a_back_reference() {
    let model = mutual_model();
    let translation =
        translate_fetches(&model, TranslatorConfig::default(), &employee_select())
            .expect("translates");

    let spec = first_spec(&translation);
    let manager = fetch(&spec.fetches, "Employee.manager");
    assert!(manager.joined);
    let assistant = fetch(&manager.children, "Manager.assistant");
    assert!(assistant.joined);
    // Employee.manager again, one level down: a reference, not a re-fetch.
    let cycle = fetch(&assistant.children, "Employee.manager");
    assert!(!cycle.joined);
    assert_eq!(
        cycle.circular_reference,
        Some(NavigablePath::root("e").append("manager"))
    );
    assert!(cycle.children.is_empty());
}

#[test]
fn max_depth_demotes_joined_fetches() {
    let model = mutual_model();
    let config = TranslatorConfig::default().with_max_fetch_depth(Some(1));
    let translation =
        translate_fetches(&model, config, &employee_select()).expect("translates");

    let spec = first_spec(&translation);
    let manager = fetch(&spec.fetches, "Employee.manager");
    assert!(manager.joined);
    let assistant = fetch(&manager.children, "Manager.assistant");
    assert_eq!(assistant.timing, FetchTiming::Delayed);
    assert!(!assistant.joined);
    assert!(assistant.table_group.is_none());
}
