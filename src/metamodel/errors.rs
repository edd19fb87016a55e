//! Error types for metamodel lookups.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MetamodelError {
    #[error("Unknown entity `{entity}` (not registered in the metamodel)")]
    UnknownEntity { entity: String },

    #[error("Entity `{entity}` has no attribute `{attribute}`")]
    UnknownAttribute { entity: String, attribute: String },

    #[error("`{target}` is not a subtype of `{entity}` (invalid treat target)")]
    InvalidTreatTarget { entity: String, target: String },
}
