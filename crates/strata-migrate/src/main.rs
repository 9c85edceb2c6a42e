//! strata-migrate CLI
//!
//! Command-line tool for applying and inspecting migrations. Creating
//! migrations needs the application's schema, so that is done from the
//! application with `MigrationStore::create_migration`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use strata_migrate::prelude::*;

/// Snapshot-diff schema migrations for Postgres.
#[derive(Parser)]
#[command(name = "strata-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL.
    #[arg(short, long, env = "DATABASE_URL")]
    database: Option<String>,

    /// Migrations directory.
    #[arg(
        short,
        long,
        env = "STRATA_MIGRATIONS_DIR",
        default_value = "migrations"
    )]
    migrations_dir: PathBuf,

    /// Maximum number of pooled connections.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the tracking table.
    Init,

    /// Apply pending migrations.
    Migrate {
        /// Show SQL without executing (dry run).
        #[arg(long)]
        dry_run: bool,
    },

    /// Show migration status.
    ShowMigrations,

    /// Show the SQL of one migration without executing it.
    SqlMigrate {
        /// Migration id.
        #[arg(long)]
        id: i64,
    },
}

impl Cli {
    async fn executor(&self) -> anyhow::Result<MigrationExecutor> {
        let url = self
            .database
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("--database or DATABASE_URL is required"))?;
        let pool = connect(url, self.max_connections).await?;
        Ok(MigrationExecutor::new(pool))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let store = MigrationStore::new(&cli.migrations_dir);

    match cli.command {
        Commands::Init => {
            info!("Initializing migrations system...");
            cli.executor().await?.init().await?;
            info!("Migrations table created successfully.");
        }

        Commands::Migrate { dry_run } => {
            let executor = cli.executor().await?.dry_run(dry_run);
            if dry_run {
                info!("Dry run mode - SQL will be printed but not executed.");
            }
            let applied = executor.apply_pending(&store).await?;
            info!(count = applied.len(), "Migrations applied");
        }

        Commands::ShowMigrations => {
            let executor = cli.executor().await?;
            let migrations = store.load_all()?;
            let applied = executor.history().applied_ids().await?;

            if migrations.is_empty() {
                info!(folder = %store.folder().display(), "No migrations found.");
            } else {
                println!("\nMigrations:");
                println!("{:-<60}", "");
                for migration in &migrations {
                    let mark = if applied.contains(&migration.id()) {
                        "X"
                    } else {
                        " "
                    };
                    println!(" [{mark}] {}", migration.path().display());
                }
                println!();
            }
        }

        Commands::SqlMigrate { id } => {
            let migration = store.load(id)?;
            if migration.ddl().is_empty() {
                info!(id, "Migration has no SQL.");
            } else {
                println!("{}", migration.ddl());
            }
        }
    }

    Ok(())
}
