//! Index declarations.

use std::fmt;

use crate::describe::IndexDescription;
use crate::error::{Result, SchemaError};
use crate::sql::{join, r, Block};

/// Index access methods supported by Postgres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IndexType {
    /// B-tree, the default. Multi-column and unique.
    #[default]
    Btree,
    /// Hash. Single column only.
    Hash,
    /// `GiST`. Multi-column.
    Gist,
    /// `SP-GiST`. Single column only.
    SpGist,
    /// GIN. Multi-column.
    Gin,
    /// BRIN. Multi-column.
    Brin,
}

impl IndexType {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Btree => "BTREE",
            Self::Hash => "HASH",
            Self::Gist => "GIST",
            Self::SpGist => "SPGIST",
            Self::Gin => "GIN",
            Self::Brin => "BRIN",
        }
    }

    /// Whether the index type supports more than one column.
    #[must_use]
    pub const fn supports_multi_column(self) -> bool {
        matches!(self, Self::Btree | Self::Gist | Self::Gin | Self::Brin)
    }

    /// Whether the index type supports `UNIQUE`.
    #[must_use]
    pub const fn supports_unique(self) -> bool {
        matches!(self, Self::Btree)
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A database-level index on one table.
///
/// ```rust
/// use strata_core::schema::{Index, IndexType};
///
/// let index = Index::new("users", &["email"], IndexType::Btree, true).unwrap();
/// assert_eq!(index.name(), "_btree_index_users__email");
/// assert_eq!(
///     index.raw_sql(),
///     "UNIQUE INDEX _btree_index_users__email ON users USING BTREE ( ( email ) )"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    table: String,
    fields: Vec<String>,
    kind: IndexType,
    unique: bool,
    name: String,
    raw_sql: String,
}

impl Index {
    /// Declares an index on named fields, validating it against the index
    /// type. The name is derived from the type, the table and the fields.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::EmptyIndex`] without fields,
    /// [`SchemaError::IndexNotMultiColumn`] for several fields on a
    /// single-column type and [`SchemaError::IndexNotUnique`] when the type
    /// cannot be unique.
    pub fn new(table: &str, fields: &[&str], index_type: IndexType, unique: bool) -> Result<Self> {
        if fields.is_empty() {
            return Err(SchemaError::EmptyIndex(String::from(table)));
        }
        if fields.len() > 1 && !index_type.supports_multi_column() {
            return Err(SchemaError::IndexNotMultiColumn {
                index_type: index_type.as_sql(),
            });
        }

        let name = format!(
            "_{}_index_{}__{}",
            index_type.as_sql(),
            table,
            fields.join("_")
        )
        .to_lowercase();
        let elements = fields.iter().map(|f| r(*f)).collect();

        let mut index = Self::assemble(table, name, elements, index_type, unique)?;
        index.fields = fields.iter().map(|f| String::from(*f)).collect();
        Ok(index)
    }

    /// Declares a non-unique B-tree index.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::EmptyIndex`] without fields.
    pub fn btree(table: &str, fields: &[&str]) -> Result<Self> {
        Self::new(table, fields, IndexType::Btree, false)
    }

    /// Declares an index on an expression, such as `lower(email)`.
    ///
    /// An expression does not yield a readable name, so the caller picks
    /// one. The expression must be raw SQL.
    ///
    /// ```rust
    /// use strata_core::schema::{Index, IndexType};
    /// use strata_core::sql::r;
    ///
    /// let lower = r("lower(email)");
    /// let index = Index::expression("users", "email_lower", &lower, IndexType::Btree, true)
    ///     .unwrap();
    /// assert_eq!(
    ///     index.raw_sql(),
    ///     "UNIQUE INDEX email_lower ON users USING BTREE ( ( lower(email) ) )"
    /// );
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::EmptyIndex`] for an empty expression,
    /// [`SchemaError::IndexNotUnique`] when the type cannot be unique and
    /// [`SchemaError::ParametersInIndex`] if the expression holds bound
    /// parameters.
    pub fn expression(
        table: &str,
        name: &str,
        expr: &Block,
        index_type: IndexType,
        unique: bool,
    ) -> Result<Self> {
        if expr.is_empty() {
            return Err(SchemaError::EmptyIndex(String::from(table)));
        }
        Self::assemble(table, String::from(name), vec![expr.clone()], index_type, unique)
    }

    fn assemble(
        table: &str,
        name: String,
        elements: Vec<Block>,
        index_type: IndexType,
        unique: bool,
    ) -> Result<Self> {
        if unique && !index_type.supports_unique() {
            return Err(SchemaError::IndexNotUnique {
                index_type: index_type.as_sql(),
            });
        }

        let mut sql = r(if unique { "UNIQUE INDEX" } else { "INDEX" });
        sql.push(r(name.as_str()));
        sql.push(r("ON"));
        sql.push(r(table));
        sql.push(r("USING"));
        sql.push(r(index_type.as_sql()));
        sql.push(join(&r(","), elements.into_iter().map(Block::wrap)).wrap());
        let raw_sql = sql
            .render_no_params()
            .map_err(|_| SchemaError::ParametersInIndex {
                name: name.clone(),
                count: sql.param_count(),
            })?;

        Ok(Self {
            table: String::from(table),
            fields: Vec::new(),
            kind: index_type,
            unique,
            name,
            raw_sql,
        })
    }

    /// Returns the index name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the indexed table.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the indexed fields. Empty for an expression index.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns the index type.
    #[must_use]
    pub const fn index_type(&self) -> IndexType {
        self.kind
    }

    /// Whether the index is unique.
    #[must_use]
    pub const fn is_unique(&self) -> bool {
        self.unique
    }

    /// Returns the index DDL without the leading `CREATE`.
    #[must_use]
    pub fn raw_sql(&self) -> &str {
        &self.raw_sql
    }

    /// Describes the index.
    #[must_use]
    pub fn describe(&self) -> IndexDescription {
        IndexDescription {
            name: self.name.clone(),
            raw_sql: self.raw_sql.clone(),
        }
    }
}
