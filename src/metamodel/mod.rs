//! The metadata/mapping model boundary.
//!
//! The translator reads this model to resolve entity and attribute names to
//! physical tables and columns; it never builds or mutates it. Building the
//! model from declarative mapping sources is a separate, build-phase concern
//! outside this crate.
//!
//! Lookup surface consumed by the translator:
//! - [`Metamodel::entity`] - entity name to mapping
//! - [`EntityMapping::find_sub_part`] - attribute lookup with optional
//!   type narrowing
//! - [`ForeignKeyDescriptor::generate_join_predicate`] - join predicate
//!   synthesis between two table groups

pub mod builder;
pub mod errors;

pub use builder::{EntityBuilder, MetamodelBuilder};
pub use errors::MetamodelError;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::relational::expr::{ColumnReference, SqlExpression, SqlPredicate};

/// JDBC-level type descriptor for one mapped column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JdbcType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Double,
    Decimal,
    Varchar,
    Char,
    Date,
    Time,
    Timestamp,
    Interval,
}

impl JdbcType {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            JdbcType::SmallInt
                | JdbcType::Integer
                | JdbcType::BigInt
                | JdbcType::Double
                | JdbcType::Decimal
        )
    }

    /// Date, time, or timestamp.
    pub fn is_temporal(&self) -> bool {
        matches!(self, JdbcType::Date | JdbcType::Time | JdbcType::Timestamp)
    }

    /// Date with no time-of-day component.
    pub fn is_date_only(&self) -> bool {
        matches!(self, JdbcType::Date)
    }
}

/// One physical column with its type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedColumn {
    pub column: String,
    pub jdbc: JdbcType,
}

/// Resolved physical type information: one or more JDBC type descriptors.
///
/// A parameter bound against a value mapping always expands to exactly
/// `columns.len()` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValueMapping {
    pub columns: Vec<MappedColumn>,
}

impl ValueMapping {
    pub fn scalar(column: impl Into<String>, jdbc: JdbcType) -> Self {
        ValueMapping {
            columns: vec![MappedColumn {
                column: column.into(),
                jdbc,
            }],
        }
    }

    pub fn selection_count(&self) -> usize {
        self.columns.len()
    }

    /// The single JDBC type of a scalar mapping, if this mapping is scalar.
    pub fn single_jdbc(&self) -> Option<JdbcType> {
        match self.columns.as_slice() {
            [one] => Some(one.jdbc),
            _ => None,
        }
    }
}

/// Key descriptor between a referring side and a target side.
///
/// Column lists are positionally aligned and always the same length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDescriptor {
    pub referring_columns: Vec<String>,
    pub target_columns: Vec<String>,
    pub jdbc_types: Vec<JdbcType>,
}

impl ForeignKeyDescriptor {
    pub fn scalar(
        referring: impl Into<String>,
        target: impl Into<String>,
        jdbc: JdbcType,
    ) -> Self {
        ForeignKeyDescriptor {
            referring_columns: vec![referring.into()],
            target_columns: vec![target.into()],
            jdbc_types: vec![jdbc],
        }
    }

    /// Synthesize the equi-join predicate between the referring table alias
    /// and the target table alias.
    pub fn generate_join_predicate(
        &self,
        referring_alias: &str,
        target_alias: &str,
    ) -> SqlPredicate {
        let mut parts = Vec::with_capacity(self.referring_columns.len());
        for ((referring, target), jdbc) in self
            .referring_columns
            .iter()
            .zip(&self.target_columns)
            .zip(&self.jdbc_types)
        {
            parts.push(SqlPredicate::equal(
                SqlExpression::Column(ColumnReference {
                    table_alias: referring_alias.to_string(),
                    column: referring.clone(),
                    jdbc: *jdbc,
                }),
                SqlExpression::Column(ColumnReference {
                    table_alias: target_alias.to_string(),
                    column: target.clone(),
                    jdbc: *jdbc,
                }),
            ));
        }
        SqlPredicate::conjunction(parts)
    }

    pub fn value_mapping(&self) -> ValueMapping {
        ValueMapping {
            columns: self
                .referring_columns
                .iter()
                .zip(&self.jdbc_types)
                .map(|(column, jdbc)| MappedColumn {
                    column: column.clone(),
                    jdbc: *jdbc,
                })
                .collect(),
        }
    }
}

/// When related data is loaded, and how, absent any override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchTiming {
    Immediate,
    Delayed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchStyle {
    Join,
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchDefaults {
    pub timing: FetchTiming,
    pub style: FetchStyle,
}

impl Default for FetchDefaults {
    fn default() -> Self {
        FetchDefaults {
            timing: FetchTiming::Delayed,
            style: FetchStyle::Select,
        }
    }
}

/// Collection classification; join-fetching two bags in one query is a
/// fatal row-multiplication ambiguity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionClassification {
    Bag,
    List,
    Set,
    Map,
}

/// Element side of a plural attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PluralElement {
    /// Elements are entities of the named type, living in that entity's
    /// own tables.
    EntityElement { entity: String },
    /// Elements are basic values in a dedicated collection table.
    BasicElement { column: String, jdbc: JdbcType },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeKind {
    /// One column on the owner's table group.
    Basic { column: String, jdbc: JdbcType },

    /// N columns on the owner's table group, no join.
    Embedded { attributes: Vec<Attribute> },

    /// Single-valued association to another entity.
    ToOne {
        entity: String,
        foreign_key: ForeignKeyDescriptor,
        /// Whether the association may be absent. An implicit join over a
        /// non-optional association from a row-guaranteed parent may use an
        /// inner join; everything else defaults to left.
        optional: bool,
        fetch: FetchDefaults,
        /// Per-profile fetch style overrides, keyed by profile name.
        fetch_profiles: HashMap<String, FetchStyle>,
    },

    /// Collection-valued attribute.
    Plural {
        element: PluralElement,
        /// Collection or element table joined against the owner.
        table: String,
        /// Key columns on `table` referencing the owner's identifier.
        foreign_key: ForeignKeyDescriptor,
        classification: CollectionClassification,
        /// List index column, when the collection is a list.
        index_column: Option<MappedColumn>,
        /// Map key column, when the collection is a map.
        key_column: Option<MappedColumn>,
        fetch: FetchDefaults,
        fetch_profiles: HashMap<String, FetchStyle>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeKind,
}

impl Attribute {
    /// Whether resolving this attribute requires a table-group join.
    pub fn is_joinable(&self) -> bool {
        matches!(
            self.kind,
            AttributeKind::ToOne { .. } | AttributeKind::Plural { .. }
        )
    }

    /// The value mapping of a non-joinable attribute (basic or embedded).
    pub fn scalar_value_mapping(&self) -> Option<ValueMapping> {
        match &self.kind {
            AttributeKind::Basic { column, jdbc } => {
                Some(ValueMapping::scalar(column.clone(), *jdbc))
            }
            AttributeKind::Embedded { attributes } => {
                let mut columns = Vec::new();
                for attribute in attributes {
                    columns.extend(attribute.scalar_value_mapping()?.columns);
                }
                Some(ValueMapping { columns })
            }
            _ => None,
        }
    }
}

/// A secondary table of an entity, sharing the primary table's row identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryTable {
    pub table: String,
    /// Columns of this attribute's owner found on the secondary table.
    pub columns: Vec<String>,
    pub join_key: ForeignKeyDescriptor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMapping {
    pub name: String,
    pub primary_table: String,
    pub secondary_tables: Vec<SecondaryTable>,
    /// Identifier columns on the primary table.
    pub identifier: ValueMapping,
    pub attributes: Vec<Attribute>,
    pub supertype: Option<String>,
    pub subtypes: Vec<String>,
}

impl EntityMapping {
    fn own_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// The table reference owning the given column: the primary table
    /// unless a secondary table declares it.
    pub fn owning_table(&self, column: &str) -> &str {
        for secondary in &self.secondary_tables {
            if secondary.columns.iter().any(|c| c == column) {
                return &secondary.table;
            }
        }
        &self.primary_table
    }
}

/// The read-only mapping model handle.
#[derive(Debug, Clone, Default)]
pub struct Metamodel {
    entities: HashMap<String, Arc<EntityMapping>>,
}

impl Metamodel {
    pub(crate) fn from_entities(entities: HashMap<String, Arc<EntityMapping>>) -> Self {
        Metamodel { entities }
    }

    pub fn entity(&self, name: &str) -> Result<&Arc<EntityMapping>, MetamodelError> {
        self.entities
            .get(name)
            .ok_or_else(|| MetamodelError::UnknownEntity {
                entity: name.to_string(),
            })
    }

    /// Look up a named sub-part of `entity`, optionally narrowed to a
    /// treat target. The narrowed type's attributes are consulted first;
    /// inherited attributes resolve through the supertype chain.
    pub fn find_sub_part(
        &self,
        entity: &str,
        name: &str,
        treat_target: Option<&str>,
    ) -> Option<&Attribute> {
        if let Some(target) = treat_target {
            if let Ok(narrowed) = self.entity(target) {
                if let Some(attribute) = narrowed.own_attribute(name) {
                    return Some(attribute);
                }
            }
        }
        let mut current = self.entity(entity).ok()?;
        loop {
            if let Some(attribute) = current.own_attribute(name) {
                return Some(attribute);
            }
            match &current.supertype {
                Some(supertype) => current = self.entity(supertype).ok()?,
                None => return None,
            }
        }
    }
}
