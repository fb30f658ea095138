//! Database-specific error types and conversions.

use gymdesk_core::error::GymError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Invalid stored value: {0}")]
    Corrupt(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("{entity} already exists")]
    AlreadyExists { entity: String },
}

impl DbError {
    /// Classify a failed statement. Unique index violations become
    /// [`DbError::AlreadyExists`].
    pub(crate) fn statement(entity: &str, err: impl std::fmt::Display) -> Self {
        let message = err.to_string();
        if message.contains("already contains") {
            DbError::AlreadyExists {
                entity: entity.into(),
            }
        } else {
            DbError::Query(message)
        }
    }

    pub(crate) fn not_found(entity: &str, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

impl From<DbError> for GymError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => GymError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => GymError::AlreadyExists { entity },
            other => GymError::Database(other.to_string()),
        }
    }
}
