//! Column declarations.

use crate::describe::FieldDescription;
use crate::sql::ToSqlValue;

/// A declared column of a table.
///
/// Fields are nullable unless [`Field::not_null`] is called, matching
/// Postgres' own default.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Field {
    name: String,
    sql_type: String,
    not_null: bool,
    default: Option<String>,
}

impl Field {
    /// Creates a nullable field of the given Postgres type.
    pub fn new(name: &str, sql_type: &str) -> Self {
        Self {
            name: String::from(name),
            sql_type: String::from(sql_type),
            not_null: false,
            default: None,
        }
    }

    /// Marks the field `NOT NULL`.
    pub const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Sets the default to a raw SQL expression, such as `now()`.
    pub fn default(mut self, raw_sql: &str) -> Self {
        self.default = Some(String::from(raw_sql));
        self
    }

    /// Sets the default to a value, written as an inline literal.
    pub fn default_value(mut self, value: impl ToSqlValue) -> Self {
        self.default = Some(value.to_sql_value().to_sql_inline());
        self
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the Postgres type.
    #[must_use]
    pub fn sql_type(&self) -> &str {
        &self.sql_type
    }

    /// Whether the field is `NOT NULL`.
    #[must_use]
    pub const fn is_not_null(&self) -> bool {
        self.not_null
    }

    /// Returns the default expression, if any.
    #[must_use]
    pub fn default_sql(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Describes the field.
    #[must_use]
    pub fn describe(&self) -> FieldDescription {
        FieldDescription {
            name: self.name.clone(),
            type_: self.sql_type.clone(),
            not_null: self.not_null,
            default: self.default.clone(),
        }
    }
}
