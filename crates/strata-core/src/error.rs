//! Error types for SQL rendering and schema declaration.

/// Errors produced while rendering a [`Block`](crate::sql::Block).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SqlError {
    /// A block that must be fully literal produced bound parameters.
    #[error("expected raw SQL only, but the block produced {count} parameter(s)")]
    UnexpectedParameters {
        /// Number of parameters that were produced.
        count: usize,
    },
}

/// Errors raised while declaring tables, constraints and indexes.
///
/// These are all detected before any diff or database work happens, so a
/// malformed schema never reaches the database.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A foreign key has a different number of local and referenced fields.
    #[error("foreign key '{name}' has {fields} field(s) but {ref_fields} referenced field(s)")]
    ForeignKeyArity {
        /// Constraint name.
        name: String,
        /// Number of local fields.
        fields: usize,
        /// Number of referenced fields.
        ref_fields: usize,
    },

    /// A foreign key was declared without fields.
    #[error("foreign key '{0}' must specify at least one field and referenced field")]
    EmptyForeignKey(String),

    /// A primary key was declared without fields.
    #[error("primary key '{0}' must specify at least one field")]
    EmptyPrimaryKey(String),

    /// A unique constraint was declared without fields.
    #[error("unique constraint '{0}' must specify at least one field")]
    EmptyUnique(String),

    /// An exclusion constraint was declared without elements.
    #[error("exclusion constraint '{0}' must specify at least one element")]
    EmptyExclude(String),

    /// An index was declared without fields.
    #[error("index on '{0}' must specify at least one field")]
    EmptyIndex(String),

    /// The index type only supports a single column.
    #[error("{index_type} indexes only support one column")]
    IndexNotMultiColumn {
        /// Index type name.
        index_type: &'static str,
    },

    /// The index type does not support uniqueness.
    #[error("{index_type} indexes do not support uniqueness")]
    IndexNotUnique {
        /// Index type name.
        index_type: &'static str,
    },

    /// A constraint fragment contained bound parameters.
    #[error(
        "constraint '{name}' received {count} parameter(s), but ALTER TABLE does not accept \
         parameters; write them as raw SQL instead"
    )]
    ParametersInConstraint {
        /// Constraint name.
        name: String,
        /// Number of parameters.
        count: usize,
    },

    /// An index fragment contained bound parameters.
    #[error("index '{name}' received {count} parameter(s); index DDL must be raw SQL")]
    ParametersInIndex {
        /// Index name.
        name: String,
        /// Number of parameters.
        count: usize,
    },

    /// A table was declared without a primary key.
    #[error("table '{0}' has no primary key")]
    MissingPrimaryKey(String),

    /// Two fields of a table share a name.
    #[error("table '{table}' declares field '{field}' more than once")]
    DuplicateField {
        /// Table name.
        table: String,
        /// Field name.
        field: String,
    },

    /// Two constraints of a table share a name.
    #[error("table '{table}' declares constraint '{constraint}' more than once")]
    DuplicateConstraint {
        /// Table name.
        table: String,
        /// Constraint name.
        constraint: String,
    },

    /// Two tables share a name.
    #[error("table '{0}' is registered more than once")]
    DuplicateTable(String),

    /// Two indexes resolve to the same name.
    #[error("index '{0}' is declared more than once")]
    DuplicateIndex(String),

    /// A constraint or index refers to a field that is not declared.
    #[error("'{owner}' refers to unknown field '{table}.{field}'")]
    UnknownField {
        /// The constraint or index that holds the reference.
        owner: String,
        /// Table name.
        table: String,
        /// Field name.
        field: String,
    },

    /// A foreign key or index refers to a table that is not registered.
    #[error("'{owner}' refers to unknown table '{table}'")]
    UnknownTable {
        /// The constraint or index that holds the reference.
        owner: String,
        /// Table name.
        table: String,
    },
}

/// Result type for schema declarations.
pub type Result<T> = std::result::Result<T, SchemaError>;
