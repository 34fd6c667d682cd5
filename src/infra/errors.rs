// src/infra/errors.rs — Error types for promptspec

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpecError {
    // Caller errors (not retriable)
    #[error("Invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("{what} '{id}' not found")]
    NotFound { what: &'static str, id: String },

    // Engine contract
    #[error("Iteration engine produced no iterations")]
    EmptyResult,

    // Infra (retriable)
    #[error("Spec store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SpecError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        SpecError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Wrap a collaborator failure so callers can tell it apart from bad input.
    pub fn store(err: impl std::fmt::Display) -> Self {
        SpecError::StoreUnavailable(err.to_string())
    }

    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            SpecError::StoreUnavailable(_) | SpecError::Database(_)
        )
    }
}
