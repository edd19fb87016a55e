//! Error types for query translation.
//!
//! Every error here aborts the whole `translate()` call; there is no
//! partial or degraded translation. Messages carry the structural context
//! (full path text, operator, role names) the caller needs to present an
//! actionable report.

use thiserror::Error;

use crate::metamodel::MetamodelError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TranslationError {
    #[error("Could not resolve path `{path}`: `{segment}` does not exist on `{type_name}`")]
    UnresolvedPath {
        /// Full navigable path text.
        path: String,
        /// The offending segment.
        segment: String,
        /// The resolved type the segment was looked up on.
        type_name: String,
    },

    #[error("Illegal operands for `{operator}`: {detail}")]
    Semantic { operator: String, detail: String },

    #[error(
        "Cannot join-fetch more than one bag collection in a single query: [{}]",
        roles.join(", ")
    )]
    MultipleBagFetch { roles: Vec<String> },

    #[error("Not yet supported: {0}")]
    Unsupported(String),

    #[error("Internal translator error (please report): {0}")]
    Internal(String),

    #[error("Metamodel lookup failed: {source}")]
    Metamodel {
        #[from]
        source: MetamodelError,
    },
}

impl TranslationError {
    pub fn semantic(operator: impl Into<String>, detail: impl Into<String>) -> Self {
        TranslationError::Semantic {
            operator: operator.into(),
            detail: detail.into(),
        }
    }
}
