//! Serializable snapshots of a schema.
//!
//! A [`Description`] is what gets persisted with every migration and what
//! the migration diff compares. Tables, fields and indexes keep declaration
//! order, so the same schema always produces the same snapshot.

use serde::{Deserialize, Serialize};

/// The full shape of a schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    /// Tables, in declaration order.
    pub tables: Vec<TableDescription>,
    /// Database-level indexes, in declaration order.
    pub indexes: Vec<IndexDescription>,
}

/// The shape of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescription {
    /// Table name.
    pub name: String,
    /// Fields, in declaration order.
    pub fields: Vec<FieldDescription>,
    /// Foreign keys.
    pub fk_constraints: Vec<ConstraintDescription>,
    /// Primary key. Every table has exactly one.
    pub pk_constraint: ConstraintDescription,
    /// Unique constraints.
    pub unique_constraints: Vec<ConstraintDescription>,
    /// Check constraints.
    pub check_constraints: Vec<ConstraintDescription>,
    /// Exclusion constraints.
    pub exclude_constraints: Vec<ConstraintDescription>,
}

/// The shape of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescription {
    /// Field name.
    pub name: String,
    /// Postgres type literal, e.g. `VARCHAR(32)`.
    #[serde(rename = "type")]
    pub type_: String,
    /// Whether the field is `NOT NULL`.
    pub not_null: bool,
    /// Default expression as a raw SQL literal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// A constraint, stored pre-rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintDescription {
    /// Constraint name.
    pub name: String,
    /// `CONSTRAINT name ...` fragment, as used after `ALTER TABLE t ADD`.
    pub raw_sql: String,
}

/// An index, stored pre-rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescription {
    /// Index name.
    pub name: String,
    /// `[UNIQUE] INDEX name ON ...` fragment, as used after `CREATE`.
    pub raw_sql: String,
}

impl Description {
    /// Returns the table with the given name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableDescription> {
        self.tables.iter().find(|t| t.name == name)
    }
}
