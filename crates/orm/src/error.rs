//! Error types for the association layer
//!
//! Covers assignment type checks, missing required targets, configuration
//! problems and failures reported by the entity store collaborator.

use thiserror::Error;

/// Result type alias for model and association operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Error types for association operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Required target not found in the store
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Assigned record is not of the association's target kind
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Invalid association configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Failure reported by the entity store
    #[error("Store error: {0}")]
    Store(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Primary key is missing or invalid
    #[error("Primary key is missing or invalid")]
    MissingPrimaryKey,
}

impl ModelError {
    /// Whether this error means the target does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ModelError::NotFound(_))
    }
}

// serde_json::Error is not Clone, keep the message only
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}
