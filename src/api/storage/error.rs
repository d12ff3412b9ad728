//! Storage error types for the catalog storage backends.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage operation errors.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageError {
    /// Entity not found
    #[error("Entity not found: {entity_type} with id {entity_id}")]
    NotFound {
        entity_type: String,
        entity_id: String,
    },
    /// Uniqueness constraint violated (name already taken, duplicate link)
    #[error("Conflict: {entity_type} '{name}' already exists")]
    Conflict { entity_type: String, name: String },
    /// Database connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
    /// General storage error
    #[error("Storage error: {0}")]
    Other(String),
}

impl StorageError {
    pub fn not_found(entity_type: &str, entity_id: impl ToString) -> Self {
        StorageError::NotFound {
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
        }
    }

    pub fn conflict(entity_type: &str, name: impl Into<String>) -> Self {
        StorageError::Conflict {
            entity_type: entity_type.to_string(),
            name: name.into(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::Conflict { .. })
    }
}
