//! The schema registry.

use std::collections::HashSet;

use indexmap::IndexMap;

use super::constraint::Constraint;
use super::index::Index;
use super::table::{Table, TableDef};
use crate::describe::Description;
use crate::error::{Result, SchemaError};

/// Every table and index the application declares.
///
/// Built once by [`Schema::builder`] and immutable afterwards; the migration
/// tooling only ever reads its [`Description`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    tables: IndexMap<String, TableDef>,
    indexes: Vec<Index>,
}

impl Schema {
    /// Starts building a schema.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Returns the table with the given name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(name)
    }

    /// Returns the tables in registration order.
    pub fn tables(&self) -> impl Iterator<Item = &TableDef> {
        self.tables.values()
    }

    /// Returns the indexes in registration order.
    #[must_use]
    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    /// Snapshots the schema.
    #[must_use]
    pub fn describe(&self) -> Description {
        Description {
            tables: self.tables.values().map(TableDef::describe).collect(),
            indexes: self.indexes.iter().map(Index::describe).collect(),
        }
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct SchemaBuilder {
    tables: Vec<Result<TableDef>>,
    indexes: Vec<Result<Index>>,
}

impl SchemaBuilder {
    /// Registers a table definition.
    pub fn table(mut self, table: TableDef) -> Self {
        self.tables.push(Ok(table));
        self
    }

    /// Registers a struct-declared table.
    pub fn table_of<T: Table>(mut self) -> Self {
        self.tables.push(T::definition());
        self
    }

    /// Registers an index.
    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(Ok(index));
        self
    }

    /// Registers an index, deferring any construction error to
    /// [`build`](Self::build).
    pub fn try_index(mut self, index: Result<Index>) -> Self {
        self.indexes.push(index);
        self
    }

    /// Validates cross-table references and builds the schema.
    ///
    /// # Errors
    ///
    /// Returns the first deferred construction error, or a
    /// [`SchemaError`] for duplicate tables or indexes and for foreign keys
    /// and indexes that refer to unknown tables or fields.
    pub fn build(self) -> Result<Schema> {
        let mut tables = IndexMap::with_capacity(self.tables.len());
        for table in self.tables {
            let table = table?;
            if tables.contains_key(table.name()) {
                return Err(SchemaError::DuplicateTable(String::from(table.name())));
            }
            tables.insert(String::from(table.name()), table);
        }

        for table in tables.values() {
            for constraint in table.constraints() {
                let Constraint::ForeignKey(fk) = constraint else {
                    continue;
                };
                let target = tables.get(fk.ref_table()).ok_or_else(|| SchemaError::UnknownTable {
                    owner: String::from(constraint.name()),
                    table: String::from(fk.ref_table()),
                })?;
                let missing = fk
                    .ref_fields()
                    .iter()
                    .find(|f| target.field(f.as_str()).is_none());
                if let Some(missing) = missing {
                    return Err(SchemaError::UnknownField {
                        owner: String::from(constraint.name()),
                        table: String::from(fk.ref_table()),
                        field: missing.clone(),
                    });
                }
            }
        }

        let indexes = self.indexes.into_iter().collect::<Result<Vec<_>>>()?;
        let mut names = HashSet::new();
        for index in &indexes {
            if !names.insert(index.name()) {
                return Err(SchemaError::DuplicateIndex(String::from(index.name())));
            }
            let table = tables.get(index.table()).ok_or_else(|| SchemaError::UnknownTable {
                owner: String::from(index.name()),
                table: String::from(index.table()),
            })?;
            let missing = index
                .fields()
                .iter()
                .find(|f| table.field(f.as_str()).is_none());
            if let Some(missing) = missing {
                return Err(SchemaError::UnknownField {
                    owner: String::from(index.name()),
                    table: String::from(index.table()),
                    field: missing.clone(),
                });
            }
        }

        Ok(Schema { tables, indexes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, IndexType};

    fn users() -> TableDef {
        TableDef::builder("users")
            .field(Field::new("id", "INTEGER").not_null())
            .field(Field::new("email", "TEXT").not_null())
            .primary_key(&["id"])
            .build()
            .unwrap()
    }

    fn posts() -> TableDef {
        TableDef::builder("posts")
            .field(Field::new("id", "INTEGER").not_null())
            .field(Field::new("author_id", "INTEGER").not_null())
            .primary_key(&["id"])
            .references("author_id", "users", "id")
            .build()
            .unwrap()
    }

    #[test]
    fn test_describe_keeps_registration_order() {
        let schema = Schema::builder()
            .table(users())
            .table(posts())
            .index(Index::btree("posts", &["author_id"]).unwrap())
            .build()
            .unwrap();

        let desc = schema.describe();
        let names: Vec<_> = desc.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["users", "posts"]);
        assert_eq!(desc.indexes[0].name, "_btree_index_posts__author_id");
        assert!(schema.table("posts").is_some());
        assert_eq!(schema.tables().count(), 2);
        assert_eq!(schema.indexes().len(), 1);
    }

    #[test]
    fn test_describe_is_deterministic() {
        let build = || Schema::builder().table(users()).table(posts()).build().unwrap();
        assert_eq!(build().describe(), build().describe());
    }

    #[test]
    fn test_duplicate_table() {
        let err = Schema::builder().table(users()).table(users()).build().unwrap_err();
        assert_eq!(err, SchemaError::DuplicateTable(String::from("users")));
    }

    #[test]
    fn test_foreign_key_to_unknown_table() {
        let err = Schema::builder().table(posts()).build().unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownTable {
                owner: String::from("posts_author_id_fkey"),
                table: String::from("users"),
            }
        );
    }

    #[test]
    fn test_foreign_key_to_unknown_field() {
        let comments = TableDef::builder("comments")
            .field(Field::new("id", "INTEGER").not_null())
            .field(Field::new("user_email", "TEXT"))
            .primary_key(&["id"])
            .references("user_email", "users", "mail")
            .build()
            .unwrap();
        let err = Schema::builder()
            .table(users())
            .table(comments)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownField {
                owner: String::from("comments_user_email_fkey"),
                table: String::from("users"),
                field: String::from("mail"),
            }
        );
    }

    #[test]
    fn test_index_validation() {
        let err = Schema::builder()
            .table(users())
            .index(Index::btree("users", &["nick"]).unwrap())
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownField { .. }));

        let err = Schema::builder()
            .table(users())
            .index(Index::btree("users", &["email"]).unwrap())
            .index(Index::btree("users", &["email"]).unwrap())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateIndex(String::from("_btree_index_users__email"))
        );

        let err = Schema::builder()
            .table(users())
            .try_index(Index::new("users", &["id", "email"], IndexType::Hash, false))
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::IndexNotMultiColumn { index_type: "HASH" });
    }

    #[test]
    fn test_expression_index_needs_known_table() {
        let lower = crate::sql::r("lower(email)");
        let schema = Schema::builder()
            .table(users())
            .try_index(Index::expression("users", "email_lower", &lower, IndexType::Btree, true))
            .build()
            .unwrap();
        assert_eq!(schema.describe().indexes[0].name, "email_lower");

        let err = Schema::builder()
            .table(users())
            .try_index(Index::expression("people", "email_lower", &lower, IndexType::Btree, true))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownTable {
                owner: String::from("email_lower"),
                table: String::from("people"),
            }
        );
    }
}
