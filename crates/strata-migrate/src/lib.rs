//! Snapshot-diff schema migrations for Postgres.
//!
//! `strata-migrate` keeps a folder of migrations, each holding a full
//! [`Description`](strata_core::Description) of the schema plus the DDL that
//! reaches it from the previous one:
//!
//! - **Diff** - compares two descriptions and emits DDL in a fixed,
//!   dependency-safe order
//! - **Store** - creates and loads the `{id}.json` migration files
//! - **History** - the `_migrations` tracking table
//! - **Executor** - applies each migration and its tracking row in one
//!   transaction
//!
//! # Example
//!
//! ```rust,no_run
//! use strata_core::schema::{Field, Schema, TableDef};
//! use strata_migrate::prelude::*;
//!
//! # async fn run() -> Result<()> {
//! let schema = Schema::builder()
//!     .table(
//!         TableDef::builder("users")
//!             .field(Field::new("id", "BIGSERIAL").not_null())
//!             .field(Field::new("email", "TEXT").not_null())
//!             .primary_key(&["id"])
//!             .unique(&["email"])
//!             .build()?,
//!     )
//!     .build()?;
//!
//! let store = MigrationStore::new("migrations");
//! if store.must_create_migration(&schema.describe())? {
//!     store.create_migration(&schema.describe(), false)?;
//! }
//!
//! let pool = connect("postgres://localhost/app", 5).await?;
//! MigrationExecutor::new(pool).apply_pending(&store).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Create the tracking table
//! strata-migrate init
//!
//! # Apply pending migrations
//! strata-migrate migrate
//!
//! # Show migration status
//! strata-migrate show-migrations
//!
//! # Print the SQL of one migration
//! strata-migrate sql-migrate --id 3
//! ```

pub mod diff;
pub mod error;
pub mod executor;
pub mod history;
pub mod migration;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::diff::{diff, render_ddl};
    pub use crate::error::{MigrateError, Result};
    pub use crate::executor::{connect, MigrationExecutor};
    pub use crate::history::MigrationHistory;
    pub use crate::migration::{Migration, MigrationStore};
}
