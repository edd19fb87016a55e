//! Shared mapping model and translation helpers.

use sqlift::config::TranslatorConfig;
use sqlift::domain::expr::ParameterValues;
use sqlift::domain::statement::{QueryPart, QuerySpec, Selection, Statement};
use sqlift::metamodel::builder::{basic_attribute, MetamodelBuilder};
use sqlift::metamodel::{
    CollectionClassification, ForeignKeyDescriptor, JdbcType, Metamodel,
};
use sqlift::relational::Translation;
use sqlift::translator::{TranslationError, Translator};

/// Orders, customers, line items and products. To-one fetch defaults are
/// deferred/select so fetch tests opt in explicitly.
pub fn commerce_model() -> Metamodel {
    MetamodelBuilder::new()
        .entity("Customer", "customers")
        .identifier("id", JdbcType::BigInt)
        .basic("name", "name", JdbcType::Varchar)
        .embedded(
            "address",
            vec![
                basic_attribute("street", "street", JdbcType::Varchar),
                basic_attribute("city", "city", JdbcType::Varchar),
            ],
        )
        .plural_entity(
            "orders",
            "Order",
            "orders",
            ForeignKeyDescriptor::scalar("customer_id", "id", JdbcType::BigInt),
            CollectionClassification::Bag,
        )
        .done()
        .entity("Order", "orders")
        .identifier("id", JdbcType::BigInt)
        .basic("status", "status", JdbcType::Varchar)
        .basic("total", "total", JdbcType::Double)
        .basic("placed_at", "placed_at", JdbcType::Timestamp)
        .basic("ship_date", "ship_date", JdbcType::Date)
        .basic("delivery_date", "delivery_date", JdbcType::Date)
        .to_one(
            "customer",
            "Customer",
            ForeignKeyDescriptor::scalar("customer_id", "id", JdbcType::BigInt),
        )
        .required()
        .plural_entity(
            "items",
            "LineItem",
            "order_items",
            ForeignKeyDescriptor::scalar("order_id", "id", JdbcType::BigInt),
            CollectionClassification::Bag,
        )
        .plural_basic(
            "discounts",
            "order_discounts",
            "discount_code",
            JdbcType::Varchar,
            ForeignKeyDescriptor::scalar("order_id", "id", JdbcType::BigInt),
            CollectionClassification::Bag,
        )
        .plural_basic(
            "tags",
            "order_tags",
            "tag",
            JdbcType::Varchar,
            ForeignKeyDescriptor::scalar("order_id", "id", JdbcType::BigInt),
            CollectionClassification::Set,
        )
        .done()
        .entity("LineItem", "order_items")
        .identifier("id", JdbcType::BigInt)
        .basic("quantity", "quantity", JdbcType::Integer)
        .basic("price", "price", JdbcType::Double)
        .to_one(
            "product",
            "Product",
            ForeignKeyDescriptor::scalar("product_id", "id", JdbcType::BigInt),
        )
        .done()
        .entity("Product", "products")
        .identifier("id", JdbcType::BigInt)
        .basic("name", "name", JdbcType::Varchar)
        .done()
        .build()
}

pub fn select_statement(spec: QuerySpec, result_entity: Option<&str>) -> Statement {
    Statement::Select {
        query: QueryPart::Spec(spec),
        result_entity: result_entity.map(str::to_string),
    }
}

pub fn try_translate(
    model: &Metamodel,
    statement: &Statement,
) -> Result<Translation, TranslationError> {
    let _ = env_logger::builder().is_test(true).try_init();
    Translator::new(model, TranslatorConfig::default()).translate(statement)
}

pub fn translate(model: &Metamodel, statement: &Statement) -> Translation {
    match try_translate(model, statement) {
        Ok(translation) => translation,
        Err(error) => panic!("translation failed: {error}"),
    }
}

pub fn translate_with_values(
    model: &Metamodel,
    statement: &Statement,
    values: ParameterValues,
) -> Result<Translation, TranslationError> {
    let _ = env_logger::builder().is_test(true).try_init();
    Translator::new(model, TranslatorConfig::default())
        .with_parameter_values(values)
        .translate(statement)
}

/// The first translated query spec of a select statement.
pub fn first_spec(translation: &Translation) -> &sqlift::relational::SqlQuerySpec {
    match &translation.statement {
        sqlift::relational::SqlStatement::Select { query } => {
            query.first_spec().expect("select carries a query spec")
        }
        other => panic!("expected a select statement, got {other:?}"),
    }
}

/// `select <expression> from Order o`, translated.
pub fn translate_order_selection(expression: sqlift::domain::expr::Expression) -> Translation {
    let model = commerce_model();
    let spec = QuerySpec {
        from: sqlift::domain::from::FromClause::single(sqlift::domain::from::FromRoot::new(
            "Order", "o",
        )),
        selections: vec![Selection::of(expression)],
        ..QuerySpec::default()
    };
    translate(&model, &select_statement(spec, None))
}
