//! Database-specific error types and conversions.

use rentora_core::error::RentoraError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },
}

impl DbError {
    /// Classify a SurrealDB error from a write: unique-index
    /// violations become `AlreadyExists` so callers can re-read after
    /// losing a creation race.
    pub fn from_write(entity: &str, err: surrealdb::Error) -> Self {
        let msg = err.to_string();
        if msg.contains("already contains") {
            DbError::AlreadyExists {
                entity: entity.into(),
            }
        } else {
            DbError::Surreal(err)
        }
    }
}

impl From<DbError> for RentoraError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => RentoraError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => RentoraError::AlreadyExists { entity },
            other => RentoraError::Database(other.to_string()),
        }
    }
}
