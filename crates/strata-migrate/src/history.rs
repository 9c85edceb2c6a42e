//! Migration history tracking.
//!
//! Applied migration ids are recorded in the `_migrations` table. The table
//! is created on demand, so a database that has never been migrated simply
//! has no applied migrations.

use sqlx::error::DatabaseError;
use sqlx::{Any, AnyPool, Executor};

use crate::error::Result;

/// SQL to create the tracking table.
pub const CREATE_MIGRATIONS_TABLE_SQL: &str =
    "CREATE TABLE IF NOT EXISTS _migrations (id_ BIGINT PRIMARY KEY)";

const INSERT_APPLIED_SQL: &str = "INSERT INTO _migrations (id_) VALUES ($1)";

/// Reads and writes the tracking table.
#[derive(Debug, Clone)]
pub struct MigrationHistory {
    pool: AnyPool,
}

impl MigrationHistory {
    /// Creates a new migration history manager.
    #[must_use]
    pub const fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// Ensures the tracking table exists.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Database`](crate::error::MigrateError::Database)
    /// if the table cannot be created.
    pub async fn ensure_table(&self) -> Result<()> {
        sqlx::query(CREATE_MIGRATIONS_TABLE_SQL)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Checks if a migration has been applied. A missing tracking table
    /// means nothing has been applied.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Database`](crate::error::MigrateError::Database)
    /// on any failure other than a missing tracking table.
    pub async fn is_applied(&self, id: i64) -> Result<bool> {
        let row: std::result::Result<Option<i64>, sqlx::Error> =
            sqlx::query_scalar("SELECT id_ FROM _migrations WHERE id_ = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await;
        match row {
            Ok(row) => Ok(row.is_some()),
            Err(e) if is_missing_table(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Gets all applied migration ids, in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Database`](crate::error::MigrateError::Database)
    /// on any failure other than a missing tracking table.
    pub async fn applied_ids(&self) -> Result<Vec<i64>> {
        let rows: std::result::Result<Vec<i64>, sqlx::Error> =
            sqlx::query_scalar("SELECT id_ FROM _migrations ORDER BY id_")
                .fetch_all(&self.pool)
                .await;
        match rows {
            Ok(ids) => Ok(ids),
            Err(e) if is_missing_table(&e) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Records a migration as applied, on the given connection or
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns the driver error, which is a unique violation when the id is
    /// already recorded.
    pub async fn record_applied<'e, E>(executor: E, id: i64) -> std::result::Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Any>,
    {
        sqlx::query(INSERT_APPLIED_SQL)
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }
}

/// Whether the error says the queried table does not exist.
pub(crate) fn is_missing_table(err: &sqlx::Error) -> bool {
    let Some(db) = err.as_database_error() else {
        return false;
    };
    // 42P01 is Postgres' undefined_table.
    db.code().as_deref() == Some("42P01") || db.message().contains("no such table")
}

/// Whether the error is a unique or primary key violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(DatabaseError::is_unique_violation)
}
