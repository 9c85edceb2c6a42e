//! Column references.

/// Creates an unqualified column reference.
#[must_use]
pub fn col(name: &str) -> Column {
    Column {
        table: None,
        name: String::from(name),
    }
}

/// A column reference, rendered as raw SQL.
///
/// Columns are usually obtained from a table definition generated by
/// `#[derive(Table)]`, which qualifies them with the table name.
#[derive(Debug, Clone)]
pub struct Column {
    /// Optional table qualifier.
    pub table: Option<String>,
    /// Column name.
    pub name: String,
}

impl Column {
    /// Creates a qualified column reference.
    #[must_use]
    pub fn qualified(table: &str, name: &str) -> Self {
        Self {
            table: Some(String::from(table)),
            name: String::from(name),
        }
    }

    /// Returns the SQL representation.
    #[must_use]
    pub fn to_sql(&self) -> String {
        self.table
            .as_ref()
            .map_or_else(|| self.name.clone(), |t| format!("{t}.{}", self.name))
    }
}
