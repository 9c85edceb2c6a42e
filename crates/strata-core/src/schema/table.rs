//! Table declarations.

use std::collections::HashSet;

use indexmap::IndexMap;

use super::constraint::{Constraint, ForeignKey, PrimaryKey, Unique};
use super::field::Field;
use crate::describe::TableDescription;
use crate::error::{Result, SchemaError};
use crate::sql::Column;

/// Trait for struct-declared tables.
///
/// Implemented by the `{Struct}Table` type that `#[derive(Table)]`
/// generates. Registering the table with a
/// [`SchemaBuilder`](super::SchemaBuilder) is an explicit call to
/// [`table_of`](super::SchemaBuilder::table_of).
pub trait Table {
    /// The row type (the annotated struct).
    type Row;

    /// The SQL table name.
    const NAME: &'static str;

    /// Builds the table definition.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] if the declaration is malformed.
    fn definition() -> Result<TableDef>;
}

/// A validated table definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    name: String,
    fields: IndexMap<String, Field>,
    constraints: Vec<Constraint>,
    primary_key: usize,
}

impl TableDef {
    /// Starts declaring a table.
    ///
    /// ```rust
    /// use strata_core::schema::{Field, TableDef};
    ///
    /// let users = TableDef::builder("users")
    ///     .field(Field::new("id", "SERIAL").not_null())
    ///     .field(Field::new("email", "TEXT").not_null())
    ///     .primary_key(&["id"])
    ///     .unique(&["email"])
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(users.primary_key().name(), "users_pkey");
    /// ```
    pub fn builder(name: &str) -> TableBuilder {
        TableBuilder {
            name: String::from(name),
            fields: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    /// Returns the field with the given name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Returns a qualified column reference for a declared field.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Column> {
        self.fields
            .get(name)
            .map(|f| Column::qualified(&self.name, f.name()))
    }

    /// Returns all constraints in declaration order.
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Returns the primary key constraint.
    #[must_use]
    pub fn primary_key(&self) -> &Constraint {
        &self.constraints[self.primary_key]
    }

    /// Returns the foreign keys.
    pub fn foreign_keys(&self) -> impl Iterator<Item = &ForeignKey> {
        self.constraints.iter().filter_map(|c| match c {
            Constraint::ForeignKey(fk) => Some(fk),
            _ => None,
        })
    }

    /// Describes the table.
    #[must_use]
    pub fn describe(&self) -> TableDescription {
        let mut desc = TableDescription {
            name: self.name.clone(),
            fields: self.fields.values().map(Field::describe).collect(),
            fk_constraints: Vec::new(),
            pk_constraint: self.primary_key().describe(),
            unique_constraints: Vec::new(),
            check_constraints: Vec::new(),
            exclude_constraints: Vec::new(),
        };
        for constraint in &self.constraints {
            let list = match constraint {
                Constraint::PrimaryKey(_) => continue,
                Constraint::ForeignKey(_) => &mut desc.fk_constraints,
                Constraint::Unique(_) => &mut desc.unique_constraints,
                Constraint::Check(_) => &mut desc.check_constraints,
                Constraint::Exclude(_) => &mut desc.exclude_constraints,
            };
            list.push(constraint.describe());
        }
        desc
    }
}

/// Builder for [`TableDef`].
///
/// Convenience methods that construct constraints record any construction
/// error, which is returned from [`build`](Self::build).
#[derive(Debug, Clone)]
#[must_use]
pub struct TableBuilder {
    name: String,
    fields: Vec<Field>,
    constraints: Vec<Result<Constraint>>,
}

impl TableBuilder {
    /// Adds a field.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a primary key named `{table}_pkey`.
    pub fn primary_key(mut self, fields: &[&str]) -> Self {
        let name = format!("{}_pkey", self.name);
        self.constraints
            .push(PrimaryKey::new(&name, fields).map(Constraint::from));
        self
    }

    /// Adds a unique constraint named `{table}_{fields}_key`.
    pub fn unique(mut self, fields: &[&str]) -> Self {
        let name = format!("{}_{}_key", self.name, fields.join("_"));
        self.constraints
            .push(Unique::new(&name, fields).map(Constraint::from));
        self
    }

    /// Adds a single-column foreign key named `{table}_{field}_fkey`, with
    /// the default `CASCADE` actions.
    pub fn references(mut self, field: &str, ref_table: &str, ref_field: &str) -> Self {
        let name = format!("{}_{field}_fkey", self.name);
        self.constraints.push(
            ForeignKey::builder(&name)
                .fields(&[field])
                .references(ref_table, &[ref_field])
                .build()
                .map(Constraint::from),
        );
        self
    }

    /// Adds an explicitly declared constraint.
    pub fn constraint(mut self, constraint: impl Into<Constraint>) -> Self {
        self.constraints.push(Ok(constraint.into()));
        self
    }

    /// Validates the table.
    ///
    /// # Errors
    ///
    /// Fails if a constraint could not be constructed, a field or constraint
    /// name repeats, a constraint names an undeclared field, or there is not
    /// exactly one primary key.
    pub fn build(self) -> Result<TableDef> {
        let mut fields = IndexMap::with_capacity(self.fields.len());
        for field in self.fields {
            if fields.contains_key(field.name()) {
                return Err(SchemaError::DuplicateField {
                    table: self.name,
                    field: String::from(field.name()),
                });
            }
            fields.insert(String::from(field.name()), field);
        }

        let constraints = self.constraints.into_iter().collect::<Result<Vec<_>>>()?;

        let mut seen = HashSet::new();
        let mut primary_key = None;
        for (i, constraint) in constraints.iter().enumerate() {
            if !seen.insert(constraint.name()) {
                return Err(SchemaError::DuplicateConstraint {
                    table: self.name,
                    constraint: String::from(constraint.name()),
                });
            }
            if let Some(missing) = constraint.fields().iter().find(|f| !fields.contains_key(*f)) {
                return Err(SchemaError::UnknownField {
                    owner: String::from(constraint.name()),
                    table: self.name,
                    field: missing.clone(),
                });
            }
            if matches!(constraint, Constraint::PrimaryKey(_)) {
                if primary_key.is_some() {
                    return Err(SchemaError::DuplicateConstraint {
                        table: self.name,
                        constraint: String::from("PRIMARY KEY"),
                    });
                }
                primary_key = Some(i);
            }
        }
        let Some(primary_key) = primary_key else {
            return Err(SchemaError::MissingPrimaryKey(self.name));
        };

        Ok(TableDef {
            name: self.name,
            fields,
            constraints,
            primary_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Check;
    use crate::sql::{col, r, Comparable};

    fn users() -> TableBuilder {
        TableDef::builder("users")
            .field(Field::new("id", "INTEGER").not_null())
            .field(Field::new("email", "TEXT").not_null())
            .field(Field::new("age", "SMALLINT"))
    }

    #[test]
    fn test_describe_groups_constraints() {
        let table = users()
            .field(Field::new("team_id", "INTEGER"))
            .primary_key(&["id"])
            .unique(&["email"])
            .references("team_id", "teams", "id")
            .constraint(Check::new("users_age_check", col("age").gteq(r("0"))).unwrap())
            .build()
            .unwrap();

        assert_eq!(table.foreign_keys().count(), 1);
        let desc = table.describe();
        assert_eq!(desc.name, "users");
        let names: Vec<_> = desc.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["id", "email", "age", "team_id"]);
        assert_eq!(desc.pk_constraint.name, "users_pkey");
        assert_eq!(desc.unique_constraints[0].name, "users_email_key");
        assert_eq!(desc.fk_constraints[0].name, "users_team_id_fkey");
        assert_eq!(
            desc.fk_constraints[0].raw_sql,
            "CONSTRAINT users_team_id_fkey FOREIGN KEY ( team_id ) REFERENCES teams ( id ) \
             ON DELETE CASCADE ON UPDATE CASCADE"
        );
        assert_eq!(
            desc.check_constraints[0].raw_sql,
            "CONSTRAINT users_age_check CHECK ( age >= 0 )"
        );
        assert!(desc.exclude_constraints.is_empty());
    }

    #[test]
    fn test_missing_primary_key() {
        let err = users().build().unwrap_err();
        assert_eq!(err, SchemaError::MissingPrimaryKey(String::from("users")));
    }

    #[test]
    fn test_two_primary_keys() {
        let err = users()
            .primary_key(&["id"])
            .constraint(PrimaryKey::new("other_pkey", &["email"]).unwrap())
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateConstraint { .. }));
    }

    #[test]
    fn test_duplicate_field() {
        let err = users()
            .field(Field::new("email", "TEXT"))
            .primary_key(&["id"])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateField {
                table: String::from("users"),
                field: String::from("email"),
            }
        );
    }

    #[test]
    fn test_duplicate_constraint_name() {
        let err = users()
            .primary_key(&["id"])
            .unique(&["email"])
            .unique(&["email"])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateConstraint {
                table: String::from("users"),
                constraint: String::from("users_email_key"),
            }
        );
    }

    #[test]
    fn test_unknown_field_in_constraint() {
        let err = users().primary_key(&["uid"]).build().unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownField {
                owner: String::from("users_pkey"),
                table: String::from("users"),
                field: String::from("uid"),
            }
        );
    }

    #[test]
    fn test_construction_error_surfaces_from_build() {
        let err = users().primary_key(&[]).build().unwrap_err();
        assert_eq!(err, SchemaError::EmptyPrimaryKey(String::from("users_pkey")));
    }

    #[test]
    fn test_column_accessor() {
        let table = users().primary_key(&["id"]).build().unwrap();
        let column = table.column("email").unwrap();
        assert_eq!(column.to_sql(), "users.email");
        assert!(table.column("missing").is_none());
        assert_eq!(table.primary_key().raw_sql(), "CONSTRAINT users_pkey PRIMARY KEY ( id )");
    }
}
