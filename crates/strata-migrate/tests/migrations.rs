//! End-to-end tests for creating and reloading migrations.

use strata_core::schema::{Check, Exclude, Field, Index, IndexType, Schema, TableDef};
use strata_core::sql::{col, r, Comparable};
use strata_core::Description;
use strata_derive::Table;
use strata_migrate::prelude::*;

#[allow(dead_code)]
#[derive(Debug, Clone, Table)]
#[table(name = "authors")]
pub struct Author {
    #[column(primary_key, sql_type = "BIGSERIAL")]
    pub id: i64,
    #[column(unique)]
    pub handle: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Table)]
#[table(name = "books")]
pub struct Book {
    #[column(primary_key, sql_type = "BIGSERIAL")]
    pub id: i64,
    #[column(references = "authors(id)")]
    pub author_id: i64,
    pub title: String,
}

fn authors_only() -> Description {
    Schema::builder()
        .table_of::<AuthorTable>()
        .build()
        .unwrap()
        .describe()
}

fn authors_and_books() -> Description {
    Schema::builder()
        .table_of::<AuthorTable>()
        .table_of::<BookTable>()
        .index(Index::btree("books", &["author_id"]).unwrap())
        .build()
        .unwrap()
        .describe()
}

#[test]
fn test_three_sequential_migrations() {
    let dir = tempfile::tempdir().unwrap();
    let store = MigrationStore::new(dir.path().join("migrations"));

    let first = store.create_migration(&Description::default(), true).unwrap();
    assert_eq!(first.ddl(), "");
    store.create_migration(&authors_only(), false).unwrap();
    store.create_migration(&authors_and_books(), false).unwrap();

    let all = store.load_all().unwrap();
    let ids: Vec<i64> = all.iter().map(Migration::id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(store.load_last().unwrap().unwrap().id(), 2);

    assert_eq!(all[2].description(), &authors_and_books());
    assert!(!store.must_create_migration(&authors_and_books()).unwrap());
}

#[test]
fn test_initial_ddl_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = MigrationStore::new(dir.path());
    let migration = store.create_migration(&authors_and_books(), false).unwrap();

    let statements: Vec<&str> = migration.ddl().split(";\n").collect();
    assert_eq!(
        statements,
        vec![
            "CREATE TABLE authors ()",
            "CREATE TABLE books ()",
            "ALTER TABLE authors ADD COLUMN id BIGSERIAL",
            "ALTER TABLE authors ADD COLUMN handle TEXT",
            "ALTER TABLE books ADD COLUMN id BIGSERIAL",
            "ALTER TABLE books ADD COLUMN author_id BIGINT",
            "ALTER TABLE books ADD COLUMN title TEXT",
            "ALTER TABLE authors ALTER COLUMN id SET NOT NULL",
            "ALTER TABLE authors ALTER COLUMN handle SET NOT NULL",
            "ALTER TABLE books ALTER COLUMN id SET NOT NULL",
            "ALTER TABLE books ALTER COLUMN author_id SET NOT NULL",
            "ALTER TABLE books ALTER COLUMN title SET NOT NULL",
            "CREATE INDEX _btree_index_books__author_id ON books USING BTREE ( ( author_id ) )",
            "ALTER TABLE authors ADD CONSTRAINT authors_handle_key UNIQUE ( handle )",
            "ALTER TABLE authors ADD CONSTRAINT authors_pkey PRIMARY KEY ( id )",
            "ALTER TABLE books ADD CONSTRAINT books_pkey PRIMARY KEY ( id )",
            "ALTER TABLE books ADD CONSTRAINT books_author_id_fkey FOREIGN KEY ( author_id ) \
             REFERENCES authors ( id ) ON DELETE CASCADE ON UPDATE CASCADE;",
        ]
    );
}

#[test]
fn test_dropping_books_reverses_dependencies() {
    let statements = diff(Some(&authors_and_books()), &authors_only()).unwrap();
    assert_eq!(
        statements,
        vec![
            "ALTER TABLE books DROP CONSTRAINT books_author_id_fkey",
            "DROP INDEX _btree_index_books__author_id",
            "DROP TABLE books",
        ]
    );
}

#[test]
fn test_check_and_exclude_constraints() {
    let rooms = |with_constraints: bool| {
        let mut table = TableDef::builder("bookings")
            .field(Field::new("id", "BIGINT").not_null())
            .field(Field::new("room", "INTEGER").not_null())
            .field(Field::new("during", "TSRANGE").not_null())
            .primary_key(&["id"]);
        if with_constraints {
            table = table
                .constraint(Check::new("bookings_room_check", col("room").gt(r("0"))).unwrap())
                .constraint(
                    Exclude::builder("bookings_no_overlap")
                        .using(IndexType::Gist)
                        .element(r("room"), "=")
                        .element(r("during"), "&&")
                        .build()
                        .unwrap(),
                );
        }
        Schema::builder()
            .table(table.build().unwrap())
            .build()
            .unwrap()
            .describe()
    };

    let added = diff(Some(&rooms(false)), &rooms(true)).unwrap();
    assert_eq!(added.len(), 2);
    assert_eq!(
        added[0],
        "ALTER TABLE bookings ADD CONSTRAINT bookings_room_check CHECK ( room > 0 )"
    );
    assert!(added[1]
        .starts_with("ALTER TABLE bookings ADD CONSTRAINT bookings_no_overlap EXCLUDE USING GIST"));

    let dropped = diff(Some(&rooms(true)), &rooms(false)).unwrap();
    assert_eq!(
        dropped,
        vec![
            "ALTER TABLE bookings DROP CONSTRAINT bookings_room_check",
            "ALTER TABLE bookings DROP CONSTRAINT bookings_no_overlap",
        ]
    );
}

#[test]
fn test_description_survives_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = MigrationStore::new(dir.path());
    store.create_migration(&authors_and_books(), false).unwrap();

    let reloaded = MigrationStore::new(dir.path()).load(0).unwrap();
    assert_eq!(reloaded.description(), &authors_and_books());
    assert_eq!(diff(Some(reloaded.description()), &authors_and_books()), None);
}
