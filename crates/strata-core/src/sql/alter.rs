//! DDL fragment generators used by the migration diff.
//!
//! Every generator takes identifiers and pre-rendered fragments as raw SQL
//! and returns an unwrapped [`Block`] without parameters.

use super::block::{r, Block};

/// `CREATE TABLE table ()`
#[must_use]
pub fn add_table(table: &str) -> Block {
    Block::new([r("CREATE TABLE"), r(table), r("()")])
}

/// `DROP TABLE table`
#[must_use]
pub fn drop_table(table: &str) -> Block {
    Block::new([r("DROP TABLE"), r(table)])
}

/// `CREATE <index fragment>`
#[must_use]
pub fn add_index(raw_sql: &str) -> Block {
    Block::new([r("CREATE"), r(raw_sql)])
}

/// `DROP INDEX name`
#[must_use]
pub fn drop_index(name: &str) -> Block {
    Block::new([r("DROP INDEX"), r(name)])
}

fn alter_table(table: &str, action: Block) -> Block {
    Block::new([r("ALTER TABLE"), r(table), action])
}

fn alter_column(table: &str, field: &str, action: Block) -> Block {
    alter_table(table, Block::new([r("ALTER COLUMN"), r(field), action]))
}

/// `ALTER TABLE table ADD <constraint fragment>`
#[must_use]
pub fn add_constraint(table: &str, raw_sql: &str) -> Block {
    alter_table(table, Block::new([r("ADD"), r(raw_sql)]))
}

/// `ALTER TABLE table DROP CONSTRAINT name`
#[must_use]
pub fn drop_constraint(table: &str, name: &str) -> Block {
    alter_table(table, Block::new([r("DROP CONSTRAINT"), r(name)]))
}

/// `ALTER TABLE table ADD COLUMN field type`
#[must_use]
pub fn add_field(table: &str, field: &str, sql_type: &str) -> Block {
    alter_table(
        table,
        Block::new([r("ADD COLUMN"), r(field), r(sql_type)]),
    )
}

/// `ALTER TABLE table DROP COLUMN field`
#[must_use]
pub fn drop_field(table: &str, field: &str) -> Block {
    alter_table(table, Block::new([r("DROP COLUMN"), r(field)]))
}

/// `ALTER TABLE table ALTER COLUMN field TYPE type`
#[must_use]
pub fn set_field_type(table: &str, field: &str, sql_type: &str) -> Block {
    alter_column(table, field, Block::new([r("TYPE"), r(sql_type)]))
}

/// `ALTER TABLE table ALTER COLUMN field SET NOT NULL` or `DROP NOT NULL`.
#[must_use]
pub fn set_field_not_null(table: &str, field: &str, not_null: bool) -> Block {
    let action = if not_null { "SET NOT NULL" } else { "DROP NOT NULL" };
    alter_column(table, field, r(action))
}

/// `ALTER TABLE table ALTER COLUMN field SET DEFAULT literal`
#[must_use]
pub fn set_field_default(table: &str, field: &str, literal: &str) -> Block {
    alter_column(table, field, Block::new([r("SET DEFAULT"), r(literal)]))
}

/// `ALTER TABLE table ALTER COLUMN field DROP DEFAULT`
#[must_use]
pub fn drop_field_default(table: &str, field: &str) -> Block {
    alter_column(table, field, r("DROP DEFAULT"))
}
