//! In-memory metamodel assembly.
//!
//! Embedding callers (and this crate's tests) build the mapping model with
//! [`MetamodelBuilder`]. Production deployments would populate the same
//! structures from their declarative mapping binder.

use std::collections::HashMap;
use std::sync::Arc;

use crate::metamodel::{
    Attribute, AttributeKind, CollectionClassification, EntityMapping, FetchDefaults, FetchStyle,
    FetchTiming, ForeignKeyDescriptor, JdbcType, MappedColumn, Metamodel, PluralElement,
    SecondaryTable, ValueMapping,
};

#[derive(Debug, Default)]
pub struct MetamodelBuilder {
    entities: HashMap<String, Arc<EntityMapping>>,
}

impl MetamodelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(self, name: impl Into<String>, table: impl Into<String>) -> EntityBuilder {
        EntityBuilder {
            model: self,
            mapping: EntityMapping {
                name: name.into(),
                primary_table: table.into(),
                secondary_tables: Vec::new(),
                identifier: ValueMapping::scalar("id", JdbcType::BigInt),
                attributes: Vec::new(),
                supertype: None,
                subtypes: Vec::new(),
            },
        }
    }

    pub fn build(self) -> Metamodel {
        Metamodel::from_entities(self.entities)
    }
}

/// Builder for one entity mapping; `done()` returns to the model builder.
#[derive(Debug)]
pub struct EntityBuilder {
    model: MetamodelBuilder,
    mapping: EntityMapping,
}

impl EntityBuilder {
    pub fn identifier(mut self, column: impl Into<String>, jdbc: JdbcType) -> Self {
        self.mapping.identifier = ValueMapping::scalar(column, jdbc);
        self
    }

    pub fn composite_identifier(mut self, columns: Vec<(&str, JdbcType)>) -> Self {
        self.mapping.identifier = ValueMapping {
            columns: columns
                .into_iter()
                .map(|(column, jdbc)| MappedColumn {
                    column: column.to_string(),
                    jdbc,
                })
                .collect(),
        };
        self
    }

    pub fn basic(mut self, name: impl Into<String>, column: impl Into<String>, jdbc: JdbcType) -> Self {
        self.mapping.attributes.push(Attribute {
            name: name.into(),
            kind: AttributeKind::Basic {
                column: column.into(),
                jdbc,
            },
        });
        self
    }

    pub fn embedded(mut self, name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        self.mapping.attributes.push(Attribute {
            name: name.into(),
            kind: AttributeKind::Embedded { attributes },
        });
        self
    }

    pub fn to_one(
        mut self,
        name: impl Into<String>,
        entity: impl Into<String>,
        foreign_key: ForeignKeyDescriptor,
    ) -> Self {
        self.mapping.attributes.push(Attribute {
            name: name.into(),
            kind: AttributeKind::ToOne {
                entity: entity.into(),
                foreign_key,
                optional: true,
                fetch: FetchDefaults::default(),
                fetch_profiles: HashMap::new(),
            },
        });
        self
    }

    /// Mark the most recently added to-one association as non-optional.
    pub fn required(mut self) -> Self {
        if let Some(attribute) = self.mapping.attributes.last_mut() {
            if let AttributeKind::ToOne { optional, .. } = &mut attribute.kind {
                *optional = false;
            }
        }
        self
    }

    /// Collection of entities, joined through the element entity's table.
    pub fn plural_entity(
        mut self,
        name: impl Into<String>,
        entity: impl Into<String>,
        table: impl Into<String>,
        foreign_key: ForeignKeyDescriptor,
        classification: CollectionClassification,
    ) -> Self {
        self.mapping.attributes.push(Attribute {
            name: name.into(),
            kind: AttributeKind::Plural {
                element: PluralElement::EntityElement {
                    entity: entity.into(),
                },
                table: table.into(),
                foreign_key,
                classification,
                index_column: None,
                key_column: None,
                fetch: FetchDefaults::default(),
                fetch_profiles: HashMap::new(),
            },
        });
        self
    }

    /// Collection of basic values in a dedicated table.
    pub fn plural_basic(
        mut self,
        name: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
        jdbc: JdbcType,
        foreign_key: ForeignKeyDescriptor,
        classification: CollectionClassification,
    ) -> Self {
        self.mapping.attributes.push(Attribute {
            name: name.into(),
            kind: AttributeKind::Plural {
                element: PluralElement::BasicElement {
                    column: column.into(),
                    jdbc,
                },
                table: table.into(),
                foreign_key,
                classification,
                index_column: None,
                key_column: None,
                fetch: FetchDefaults::default(),
                fetch_profiles: HashMap::new(),
            },
        });
        self
    }

    pub fn secondary_table(
        mut self,
        table: impl Into<String>,
        columns: Vec<&str>,
        join_key: ForeignKeyDescriptor,
    ) -> Self {
        self.mapping.secondary_tables.push(SecondaryTable {
            table: table.into(),
            columns: columns.into_iter().map(str::to_string).collect(),
            join_key,
        });
        self
    }

    pub fn supertype(mut self, name: impl Into<String>) -> Self {
        self.mapping.supertype = Some(name.into());
        self
    }

    pub fn subtype(mut self, name: impl Into<String>) -> Self {
        self.mapping.subtypes.push(name.into());
        self
    }

    /// Override the declared fetch defaults of the most recently added
    /// association or collection attribute.
    pub fn fetch(mut self, timing: FetchTiming, style: FetchStyle) -> Self {
        if let Some(attribute) = self.mapping.attributes.last_mut() {
            match &mut attribute.kind {
                AttributeKind::ToOne { fetch, .. } | AttributeKind::Plural { fetch, .. } => {
                    *fetch = FetchDefaults { timing, style };
                }
                _ => {}
            }
        }
        self
    }

    /// Register a fetch-profile override on the most recently added
    /// association or collection attribute.
    pub fn fetch_profile(mut self, profile: impl Into<String>, style: FetchStyle) -> Self {
        if let Some(attribute) = self.mapping.attributes.last_mut() {
            match &mut attribute.kind {
                AttributeKind::ToOne { fetch_profiles, .. }
                | AttributeKind::Plural { fetch_profiles, .. } => {
                    fetch_profiles.insert(profile.into(), style);
                }
                _ => {}
            }
        }
        self
    }

    pub fn done(mut self) -> MetamodelBuilder {
        let name = self.mapping.name.clone();
        self.model.entities.insert(name, Arc::new(self.mapping));
        self.model
    }
}

/// Shorthand for a basic attribute used inside embedded definitions.
pub fn basic_attribute(name: &str, column: &str, jdbc: JdbcType) -> Attribute {
    Attribute {
        name: name.to_string(),
        kind: AttributeKind::Basic {
            column: column.to_string(),
            jdbc,
        },
    }
}
