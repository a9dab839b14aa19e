//! Cross-cutting error types.
//!
//! Format and provider failures live in the crates that own those concerns
//! (`tds-file`, `tds-sync`). The variants here can be raised by any layer.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A keyed lookup for update or delete found nothing.
    #[error("{entity_type} not found: {key}")]
    NotFound { entity_type: String, key: String },

    /// An add was attempted for a key that already exists.
    #[error("duplicate {entity_type}: {key}")]
    DuplicateKey { entity_type: String, key: String },

    /// A column claims a remote field the connection has no metadata for.
    #[error("remote name is not in the metadata of the {scope}: {remote_name}")]
    MetadataNotFound { remote_name: String, scope: String },

    /// Data failed validation (unknown task kind, mismatched task payload, bad enum value).
    #[error("Validation error: {0}")]
    Validation(String),
}

impl CoreError {
    pub fn not_found(entity_type: &str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            key: key.into(),
        }
    }

    pub fn duplicate(entity_type: &str, key: impl Into<String>) -> Self {
        Self::DuplicateKey {
            entity_type: entity_type.to_string(),
            key: key.into(),
        }
    }
}
