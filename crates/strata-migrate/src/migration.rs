//! Migration records and the folder they are stored in.
//!
//! Each migration is one `{id}.json` file holding the schema snapshot it
//! migrates to and the DDL that gets there from the previous one:
//!
//! ```json
//! {
//!   "description": { "tables": [...], "indexes": [...] },
//!   "ddl": "CREATE TABLE users ();\nALTER TABLE users ADD COLUMN id BIGINT;"
//! }
//! ```
//!
//! Ids start at 0 and have no gaps. File names use the plain decimal id, so
//! `7.json` is migration 7 while `007.json` or `+7.json` are not migrations
//! at all.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strata_core::Description;
use tracing::{debug, info};

use crate::diff::{diff, render_ddl};
use crate::error::{MigrateError, Result};

/// A stored migration.
///
/// Migrations are only created by [`MigrationStore::create_migration`] and
/// are never modified afterwards. Two migrations are equal when their ids
/// are.
#[derive(Debug, Clone)]
pub struct Migration {
    id: i64,
    description: Description,
    ddl: String,
    path: PathBuf,
}

#[derive(Serialize)]
struct RecordRef<'a> {
    description: &'a Description,
    ddl: &'a str,
}

#[derive(Deserialize)]
struct Record {
    description: Description,
    ddl: String,
}

impl Migration {
    /// Reads a migration file. The id is taken from the file name.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::ParseError`] if the file name is not a
    /// migration id or the content is not a migration record, and
    /// [`MigrateError::Io`] if the file cannot be read.
    pub fn from_file(path: &Path) -> Result<Self> {
        let id = migration_id(path).ok_or_else(|| MigrateError::ParseError {
            path: path.to_path_buf(),
            message: String::from("file name is not a migration id"),
        })?;
        let content = fs::read_to_string(path)?;
        let record: Record =
            serde_json::from_str(&content).map_err(|e| MigrateError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        Ok(Self {
            id,
            description: record.description,
            ddl: record.ddl,
            path: path.to_path_buf(),
        })
    }

    /// The migration id.
    #[must_use]
    pub const fn id(&self) -> i64 {
        self.id
    }

    /// The schema this migration migrates to.
    #[must_use]
    pub fn description(&self) -> &Description {
        &self.description
    }

    /// The DDL batch. Empty for a forced empty migration.
    #[must_use]
    pub fn ddl(&self) -> &str {
        &self.ddl
    }

    /// Where the migration is stored.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PartialEq for Migration {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Migration {}

/// Returns the id encoded in a migration file name, if any.
///
/// Only the canonical spelling counts: ASCII digits without a sign or
/// leading zeros. Otherwise `1.json` and `01.json` would both load as
/// migration 1.
fn migration_id(path: &Path) -> Option<i64> {
    if path.extension()? != "json" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let canonical = !stem.is_empty()
        && stem.bytes().all(|b| b.is_ascii_digit())
        && (stem == "0" || !stem.starts_with('0'));
    if !canonical {
        return None;
    }
    stem.parse().ok()
}

/// A folder of migration files.
#[derive(Debug, Clone)]
pub struct MigrationStore {
    folder: PathBuf,
}

impl MigrationStore {
    /// Creates a store over `folder`. The folder is created on the first
    /// write.
    #[must_use]
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    /// The migrations folder.
    #[must_use]
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    fn path_for(&self, id: i64) -> PathBuf {
        self.folder.join(format!("{id}.json"))
    }

    /// Loads every migration, ordered by id.
    ///
    /// A missing folder has no migrations. Files that are not named after an
    /// id are ignored. Fails with [`MigrateError::MigrationGap`] if the ids
    /// are not `0, 1, 2, ...`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::MigrationGap`] on a gap,
    /// [`MigrateError::ParseError`] for a malformed migration file and
    /// [`MigrateError::Io`] if the folder cannot be read.
    pub fn load_all(&self) -> Result<Vec<Migration>> {
        let entries = match fs::read_dir(&self.folder) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let Some(id) = migration_id(&path) else {
                debug!(path = %path.display(), "Ignoring non-migration file");
                continue;
            };
            paths.push((id, path));
        }
        paths.sort_by_key(|(id, _)| *id);

        let mut migrations = Vec::with_capacity(paths.len());
        for (expected, (id, path)) in (0_i64..).zip(paths) {
            if id != expected {
                return Err(MigrateError::MigrationGap {
                    expected,
                    found: id,
                });
            }
            migrations.push(Migration::from_file(&path)?);
        }
        Ok(migrations)
    }

    /// Loads the migration with the highest id.
    ///
    /// # Errors
    ///
    /// Same as [`MigrationStore::load_all`].
    pub fn load_last(&self) -> Result<Option<Migration>> {
        Ok(self.load_all()?.pop())
    }

    /// Loads one migration.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::MigrationNotFound`] if there is no file for
    /// `id`, otherwise the errors of [`Migration::from_file`].
    pub fn load(&self, id: i64) -> Result<Migration> {
        let path = self.path_for(id);
        if !path.is_file() {
            return Err(MigrateError::MigrationNotFound(id));
        }
        Migration::from_file(&path)
    }

    /// Whether `current` differs from the last migration's snapshot, or no
    /// migration exists yet.
    ///
    /// # Errors
    ///
    /// Same as [`MigrationStore::load_all`].
    pub fn must_create_migration(&self, current: &Description) -> Result<bool> {
        Ok(self
            .load_last()?
            .is_none_or(|last| diff(Some(last.description()), current).is_some()))
    }

    /// Diffs `current` against the last migration and stores the result as
    /// the next migration.
    ///
    /// Without `allow_empty`, an unchanged schema is an error
    /// ([`MigrateError::NoChangesToDiff`]). With it, a migration with empty
    /// DDL is written, which is useful to start the history of an existing
    /// database.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::NoChangesToDiff`] as above,
    /// [`MigrateError::MigrationExists`] if the next id's file already exists,
    /// and the errors of [`MigrationStore::load_all`] or of writing the file.
    pub fn create_migration(&self, current: &Description, allow_empty: bool) -> Result<Migration> {
        let last = self.load_last()?;
        let statements = diff(last.as_ref().map(Migration::description), current);
        let ddl = match statements {
            Some(statements) => render_ddl(&statements),
            None if allow_empty => String::new(),
            None => return Err(MigrateError::NoChangesToDiff),
        };
        let id = last.map_or(0, |m| m.id() + 1);
        let path = self.path_for(id);

        fs::create_dir_all(&self.folder)?;
        let content = serde_json::to_string_pretty(&RecordRef {
            description: current,
            ddl: &ddl,
        })?;
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(MigrateError::MigrationExists(path));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(content.as_bytes())?;
        file.write_all(b"\n")?;

        info!(id, path = %path.display(), "Created migration");

        Ok(Migration {
            id,
            description: current.clone(),
            ddl,
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use strata_core::schema::{Field, Schema, TableDef};

    use super::*;

    fn schema(with_nick: bool) -> Description {
        let mut users = TableDef::builder("users")
            .field(Field::new("id", "BIGINT").not_null())
            .primary_key(&["id"]);
        if with_nick {
            users = users.field(Field::new("nick", "TEXT"));
        }
        Schema::builder()
            .table(users.build().unwrap())
            .build()
            .unwrap()
            .describe()
    }

    #[test]
    fn test_missing_folder_has_no_migrations() {
        let dir = tempfile::tempdir().unwrap();
        let store = MigrationStore::new(dir.path().join("missing"));
        assert!(store.load_all().unwrap().is_empty());
        assert!(store.load_last().unwrap().is_none());
        assert!(store.must_create_migration(&Description::default()).unwrap());
    }

    #[test]
    fn test_create_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = MigrationStore::new(dir.path());

        let created = store.create_migration(&schema(false), false).unwrap();
        assert_eq!(created.id(), 0);
        assert_eq!(created.path(), dir.path().join("0.json").as_path());
        assert!(created.ddl().starts_with("CREATE TABLE users ();\n"));
        assert!(created.ddl().ends_with(';'));

        let loaded = store.load(0).unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.description(), &schema(false));
        assert_eq!(loaded.ddl(), created.ddl());
    }

    #[test]
    fn test_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let store = MigrationStore::new(dir.path());
        store.create_migration(&schema(true), false).unwrap();

        assert!(!store.must_create_migration(&schema(true)).unwrap());
        assert!(matches!(
            store.create_migration(&schema(true), false),
            Err(MigrateError::NoChangesToDiff)
        ));

        let empty = store.create_migration(&schema(true), true).unwrap();
        assert_eq!(empty.id(), 1);
        assert_eq!(empty.ddl(), "");
    }

    #[test]
    fn test_second_migration_diffs_against_last() {
        let dir = tempfile::tempdir().unwrap();
        let store = MigrationStore::new(dir.path());
        store.create_migration(&schema(false), false).unwrap();

        assert!(store.must_create_migration(&schema(true)).unwrap());
        let second = store.create_migration(&schema(true), false).unwrap();
        assert_eq!(second.id(), 1);
        assert_eq!(second.ddl(), "ALTER TABLE users ADD COLUMN nick TEXT;");
    }

    #[test]
    fn test_gap_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = MigrationStore::new(dir.path());
        store.create_migration(&schema(false), false).unwrap();
        store.create_migration(&schema(true), false).unwrap();
        fs::remove_file(dir.path().join("0.json")).unwrap();

        assert!(matches!(
            store.load_all(),
            Err(MigrateError::MigrationGap {
                expected: 0,
                found: 1
            })
        ));
    }

    #[test]
    fn test_unrelated_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "notes").unwrap();
        fs::write(dir.path().join("draft.json"), "{}").unwrap();
        let store = MigrationStore::new(dir.path());
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_migration_ids_are_canonical() {
        assert_eq!(migration_id(Path::new("0.json")), Some(0));
        assert_eq!(migration_id(Path::new("12.json")), Some(12));
        assert_eq!(migration_id(Path::new("007.json")), None);
        assert_eq!(migration_id(Path::new("00.json")), None);
        assert_eq!(migration_id(Path::new("+1.json")), None);
        assert_eq!(migration_id(Path::new("-1.json")), None);
        assert_eq!(migration_id(Path::new(".json")), None);
        assert_eq!(migration_id(Path::new("1.txt")), None);
    }

    #[test]
    fn test_non_canonical_names_do_not_duplicate_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = MigrationStore::new(dir.path());
        store.create_migration(&schema(false), false).unwrap();
        store.create_migration(&schema(true), false).unwrap();
        fs::copy(dir.path().join("0.json"), dir.path().join("00.json")).unwrap();
        fs::copy(dir.path().join("1.json"), dir.path().join("+1.json")).unwrap();
        fs::copy(dir.path().join("1.json"), dir.path().join("01.json")).unwrap();

        let ids: Vec<i64> = store.load_all().unwrap().iter().map(Migration::id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("0.json"), "not json").unwrap();
        let store = MigrationStore::new(dir.path());

        let err = store.load(0).unwrap_err();
        assert!(matches!(err, MigrateError::ParseError { .. }));
        assert!(matches!(
            store.load(7),
            Err(MigrateError::MigrationNotFound(7))
        ));
    }
}
