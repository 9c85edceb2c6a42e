//! Migration executor.
//!
//! This module applies stored migrations against a database. Every
//! migration runs in its own transaction together with the tracking row that
//! marks it applied, so it either lands completely or not at all.

use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use tracing::{debug, info};

use crate::error::{MigrateError, Result};
use crate::history::{self, MigrationHistory, CREATE_MIGRATIONS_TABLE_SQL};
use crate::migration::{Migration, MigrationStore};

/// Connects a pool for the executor.
///
/// The URL scheme picks the driver, e.g. `postgres://...` or
/// `sqlite::memory:`.
///
/// # Errors
///
/// Returns [`MigrateError::Database`] if the URL is invalid or the database
/// is unreachable.
pub async fn connect(url: &str, max_connections: u32) -> Result<AnyPool> {
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await?;
    Ok(pool)
}

/// Executes migrations against a database.
#[derive(Debug, Clone)]
pub struct MigrationExecutor {
    pool: AnyPool,
    history: MigrationHistory,
    dry_run: bool,
}

impl MigrationExecutor {
    /// Creates a new migration executor.
    #[must_use]
    pub fn new(pool: AnyPool) -> Self {
        let history = MigrationHistory::new(pool.clone());
        Self {
            pool,
            history,
            dry_run: false,
        }
    }

    /// Enables dry-run mode (SQL is printed but not executed).
    #[must_use]
    pub const fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Ensures the tracking table exists. Does nothing in dry-run mode.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Database`] if the table cannot be created.
    pub async fn init(&self) -> Result<()> {
        if !self.dry_run {
            self.history.ensure_table().await?;
        }
        Ok(())
    }

    /// Returns the migration history.
    #[must_use]
    pub const fn history(&self) -> &MigrationHistory {
        &self.history
    }

    /// Checks if a migration has been applied.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Database`] if the tracking table cannot be
    /// read.
    pub async fn is_applied(&self, id: i64) -> Result<bool> {
        self.history.is_applied(id).await
    }

    /// Applies a single migration.
    ///
    /// # Errors
    ///
    /// Fails with [`MigrateError::AlreadyApplied`] if the id is already
    /// recorded, either before the transaction starts or when inserting the
    /// tracking row hits a unique violation. Any other failure rolls the
    /// whole migration back and is returned as
    /// [`MigrateError::Database`]; the migration can be retried once the
    /// cause is fixed.
    ///
    /// Two concurrent applies of the same migration do not always end in
    /// [`MigrateError::AlreadyApplied`] for the loser. On Postgres the losing
    /// transaction usually blocks on the winner's DDL and then fails on its
    /// own DDL (a table that now exists, say) before it reaches the tracking
    /// row, which surfaces as a plain [`MigrateError::Database`]. Either way
    /// nothing of the losing transaction is kept.
    pub async fn apply(&self, migration: &Migration) -> Result<()> {
        let id = migration.id();
        info!(id, "Applying migration");

        if self.dry_run {
            println!("-- migration {id}");
            if !migration.ddl().is_empty() {
                println!("{}", migration.ddl());
            }
            return Ok(());
        }

        if self.history.is_applied(id).await? {
            return Err(MigrateError::AlreadyApplied { id });
        }

        // Dropping the transaction without commit rolls it back, on error and
        // on cancellation alike.
        let mut tx = self.pool.begin().await?;

        sqlx::query(CREATE_MIGRATIONS_TABLE_SQL)
            .execute(&mut *tx)
            .await?;

        if !migration.ddl().is_empty() {
            debug!(sql = %migration.ddl(), "Executing SQL");
            sqlx::raw_sql(migration.ddl()).execute(&mut *tx).await?;
        }

        match MigrationHistory::record_applied(&mut *tx, id).await {
            Ok(()) => {}
            Err(e) if history::is_unique_violation(&e) => {
                return Err(MigrateError::AlreadyApplied { id });
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;

        info!(id, "Migration applied successfully");

        Ok(())
    }

    /// Returns the stored migrations that have not been applied, in id
    /// order.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracking table or the migration folder cannot
    /// be read.
    pub async fn load_unapplied(&self, store: &MigrationStore) -> Result<Vec<Migration>> {
        let applied = self.history.applied_ids().await?;
        Ok(store
            .load_all()?
            .into_iter()
            .filter(|m| applied.binary_search(&m.id()).is_err())
            .collect())
    }

    /// Whether any stored migration is still unapplied.
    ///
    /// # Errors
    ///
    /// Same as [`MigrationExecutor::load_unapplied`].
    pub async fn must_apply(&self, store: &MigrationStore) -> Result<bool> {
        Ok(!self.load_unapplied(store).await?.is_empty())
    }

    /// Applies every unapplied migration in id order and returns the applied
    /// ids. Stops at the first failure; migrations applied before it stay
    /// applied.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`MigrationExecutor::load_unapplied`] or
    /// [`MigrationExecutor::apply`].
    pub async fn apply_pending(&self, store: &MigrationStore) -> Result<Vec<i64>> {
        let pending = self.load_unapplied(store).await?;
        if pending.is_empty() {
            info!("No migrations to apply");
        }

        let mut applied = Vec::with_capacity(pending.len());
        for migration in &pending {
            self.apply(migration).await?;
            applied.push(migration.id());
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use strata_core::Description;

    async fn create_test_pool() -> AnyPool {
        connect("sqlite::memory:", 1)
            .await
            .expect("Failed to create in-memory SQLite pool")
    }

    async fn table_exists(pool: &AnyPool, name: &str) -> bool {
        let row: Option<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name = $1")
                .bind(name)
                .fetch_optional(pool)
                .await
                .unwrap();
        row.is_some()
    }

    /// Writes a hand-made migration file and loads it back.
    fn raw_migration(store: &MigrationStore, id: i64, ddl: &str) -> Migration {
        fs::create_dir_all(store.folder()).unwrap();
        let content = serde_json::json!({
            "description": Description::default(),
            "ddl": ddl,
        });
        fs::write(
            store.folder().join(format!("{id}.json")),
            content.to_string(),
        )
        .unwrap();
        store.load(id).unwrap()
    }

    #[tokio::test]
    async fn test_apply_creates_tracking_table() {
        let pool = create_test_pool().await;
        let executor = MigrationExecutor::new(pool.clone());
        let dir = tempfile::tempdir().unwrap();
        let store = MigrationStore::new(dir.path());
        let migration = raw_migration(&store, 0, "CREATE TABLE users (id INTEGER PRIMARY KEY)");

        assert!(!table_exists(&pool, "_migrations").await);
        executor.apply(&migration).await.unwrap();

        assert!(table_exists(&pool, "users").await);
        assert!(table_exists(&pool, "_migrations").await);
        assert!(executor.is_applied(0).await.unwrap());
    }

    #[tokio::test]
    async fn test_reapply_is_rejected() {
        let pool = create_test_pool().await;
        let executor = MigrationExecutor::new(pool.clone());
        let dir = tempfile::tempdir().unwrap();
        let store = MigrationStore::new(dir.path());
        let migration = raw_migration(&store, 0, "CREATE TABLE counter (n INTEGER)");

        executor.apply(&migration).await.unwrap();
        let err = executor.apply(&migration).await.unwrap_err();
        assert!(matches!(err, MigrateError::AlreadyApplied { id: 0 }));

        // The DDL did not run a second time.
        assert!(table_exists(&pool, "counter").await);
        assert_eq!(executor.history().applied_ids().await.unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn test_failed_migration_rolls_back() {
        let pool = create_test_pool().await;
        let executor = MigrationExecutor::new(pool.clone());
        let dir = tempfile::tempdir().unwrap();
        let store = MigrationStore::new(dir.path());
        let migration = raw_migration(
            &store,
            0,
            "CREATE TABLE widgets (id INTEGER);\nCREATE TABLE widgets (id INTEGER);",
        );

        let err = executor.apply(&migration).await.unwrap_err();
        assert!(matches!(err, MigrateError::Database(_)));

        assert!(!table_exists(&pool, "widgets").await);
        assert!(!table_exists(&pool, "_migrations").await);
        assert!(!executor.is_applied(0).await.unwrap());

        // Retrying after a fix succeeds.
        let fixed = raw_migration(&store, 0, "CREATE TABLE widgets (id INTEGER);");
        executor.apply(&fixed).await.unwrap();
        assert!(executor.is_applied(0).await.unwrap());
    }

    #[tokio::test]
    async fn test_unique_violation_on_record_is_already_applied() {
        let pool = create_test_pool().await;
        let executor = MigrationExecutor::new(pool.clone());
        let dir = tempfile::tempdir().unwrap();
        let store = MigrationStore::new(dir.path());
        // The id gets recorded between the applied check and the tracking
        // insert, as when a concurrent apply commits in that window.
        let migration = raw_migration(
            &store,
            0,
            "CREATE TABLE gadgets (id INTEGER);\nINSERT INTO _migrations (id_) VALUES (0);",
        );

        let err = executor.apply(&migration).await.unwrap_err();
        assert!(matches!(err, MigrateError::AlreadyApplied { id: 0 }));

        // The whole transaction was rolled back.
        assert!(!table_exists(&pool, "gadgets").await);
        assert!(!table_exists(&pool, "_migrations").await);
        assert!(!executor.is_applied(0).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_migration_is_recorded() {
        let pool = create_test_pool().await;
        let executor = MigrationExecutor::new(pool);
        let dir = tempfile::tempdir().unwrap();
        let store = MigrationStore::new(dir.path());
        let migration = raw_migration(&store, 0, "");

        executor.apply(&migration).await.unwrap();
        assert!(executor.is_applied(0).await.unwrap());
    }

    #[tokio::test]
    async fn test_apply_pending() {
        let pool = create_test_pool().await;
        let executor = MigrationExecutor::new(pool.clone());
        let dir = tempfile::tempdir().unwrap();
        let store = MigrationStore::new(dir.path());

        raw_migration(&store, 0, "CREATE TABLE users (id INTEGER PRIMARY KEY)");
        raw_migration(&store, 1, "ALTER TABLE users ADD COLUMN nick TEXT");
        assert!(executor.must_apply(&store).await.unwrap());
        assert_eq!(executor.load_unapplied(&store).await.unwrap().len(), 2);

        assert_eq!(executor.apply_pending(&store).await.unwrap(), vec![0, 1]);
        assert!(!executor.must_apply(&store).await.unwrap());
        assert!(executor.apply_pending(&store).await.unwrap().is_empty());

        raw_migration(&store, 2, "ALTER TABLE users ADD COLUMN bio TEXT");
        let pending = executor.load_unapplied(&store).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id(), 2);
        assert_eq!(executor.apply_pending(&store).await.unwrap(), vec![2]);

        sqlx::query("INSERT INTO users (id, nick, bio) VALUES (1, 'a', 'b')")
            .execute(&pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_dry_run() {
        let pool = create_test_pool().await;
        let executor = MigrationExecutor::new(pool.clone()).dry_run(true);
        let dir = tempfile::tempdir().unwrap();
        let store = MigrationStore::new(dir.path());
        let migration = raw_migration(&store, 0, "CREATE TABLE ghosts (id INTEGER)");

        executor.init().await.unwrap();
        executor.apply(&migration).await.unwrap();

        assert!(!table_exists(&pool, "ghosts").await);
        assert!(!table_exists(&pool, "_migrations").await);
    }
}
