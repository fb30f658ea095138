//! Error types for the GymDesk system.
//!
//! Messages are user-facing: the HTTP layer returns them verbatim so the
//! client can show them in a notification.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GymError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Unit context missing or invalid")]
    TenantContext,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GymError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

pub type GymResult<T> = Result<T, GymError>;
