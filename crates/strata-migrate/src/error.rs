//! Error types for the migration system.

use std::path::PathBuf;

use strata_core::SchemaError;

/// Errors that can occur during migration operations.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// The schema matches the last migration and an empty migration was not
    /// requested.
    #[error("No changes to migrate")]
    NoChangesToDiff,

    /// The migration id is already recorded in the tracking table.
    #[error("Migration {id} has already been applied")]
    AlreadyApplied {
        /// The migration id.
        id: i64,
    },

    /// Database error during migration execution. The transaction was
    /// rolled back.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The declared schema is invalid.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// IO error (reading/writing migration files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to parse migration file.
    #[error("Failed to parse migration file '{path}': {message}")]
    ParseError {
        /// Path to the migration file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Migration file already exists.
    #[error("Migration file already exists: {0}")]
    MigrationExists(PathBuf),

    /// Migration not found.
    #[error("Migration not found: {0}")]
    MigrationNotFound(i64),

    /// Migration ids are not contiguous.
    #[error("Expected migration {expected}, found {found}; migration ids must be contiguous")]
    MigrationGap {
        /// The id that should come next.
        expected: i64,
        /// The id that was found instead.
        found: i64,
    },
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
