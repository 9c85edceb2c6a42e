//! Schema diff.
//!
//! Compares two [`Description`] snapshots and produces the DDL statements
//! that turn the first into the second. Everything is matched by name, so a
//! renamed table, field or constraint shows up as a drop followed by an add.
//!
//! Statements are emitted in one fixed order regardless of where in the
//! schema the change was found:
//!
//! 1. `CREATE TABLE`
//! 2. drop foreign keys, then indexes, then tables
//! 3. `ADD COLUMN`
//! 4. drop primary keys, unique, check and exclusion constraints
//! 5. `DROP COLUMN`
//! 6. `ALTER COLUMN ... TYPE`
//! 7. `SET` / `DROP NOT NULL`, then `SET` / `DROP DEFAULT`
//! 8. `CREATE INDEX`
//! 9. add unique, check, primary key, foreign key and exclusion constraints
//!
//! A type change is emitted without a `USING` clause, so it only succeeds
//! where Postgres can cast the stored values implicitly.

use indexmap::IndexMap;
use strata_core::describe::{
    ConstraintDescription, Description, FieldDescription, IndexDescription, TableDescription,
};
use strata_core::sql::{alter, Block};

/// Returns the statements needed to go from `last` to `current`.
///
/// `last` is `None` when no migration exists yet. Returns `None` when the two
/// snapshots need no DDL at all.
#[must_use]
pub fn diff(last: Option<&Description>, current: &Description) -> Option<Vec<String>> {
    let empty = Description::default();
    let last = last.unwrap_or(&empty);

    let mut changes = Changes::default();

    let last_tables: IndexMap<&str, &TableDescription> =
        last.tables.iter().map(|t| (t.name.as_str(), t)).collect();
    let current_tables: IndexMap<&str, &TableDescription> =
        current.tables.iter().map(|t| (t.name.as_str(), t)).collect();

    for (name, table) in &current_tables {
        let previous = last_tables.get(name).copied();
        if previous.is_none() {
            changes.add_tables.push(alter::add_table(name));
        }
        changes.table(previous, table);
    }

    for (name, table) in &last_tables {
        if current_tables.contains_key(name) {
            continue;
        }
        for fk in &table.fk_constraints {
            changes.drop_fks.push(alter::drop_constraint(name, &fk.name));
        }
        changes.drop_tables.push(alter::drop_table(name));
    }

    let indexes = named_set_diff(&last.indexes, &current.indexes);
    for index in indexes.dropped {
        changes.drop_indexes.push(alter::drop_index(&index.name));
    }
    for index in indexes.added {
        changes.add_indexes.push(alter::add_index(&index.raw_sql));
    }

    let statements = changes.into_statements();
    if statements.is_empty() {
        None
    } else {
        Some(statements)
    }
}

/// Joins statements into the DDL text stored with a migration.
///
/// Each statement is terminated with `;`, one per line. No statements give an
/// empty string.
#[must_use]
pub fn render_ddl(statements: &[String]) -> String {
    if statements.is_empty() {
        return String::new();
    }
    let mut ddl = statements.join(";\n");
    ddl.push(';');
    ddl
}

/// The previous state of a field property.
///
/// A field that did not exist in the last snapshot is `Absent`, which is not
/// the same as having existed with a null default or as a nullable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prior<T> {
    Absent,
    Present(T),
}

/// Something matched by name between two snapshots.
trait Named {
    fn name(&self) -> &str;
    fn raw_sql(&self) -> &str;
}

impl Named for ConstraintDescription {
    fn name(&self) -> &str {
        &self.name
    }

    fn raw_sql(&self) -> &str {
        &self.raw_sql
    }
}

impl Named for IndexDescription {
    fn name(&self) -> &str {
        &self.name
    }

    fn raw_sql(&self) -> &str {
        &self.raw_sql
    }
}

#[derive(Debug)]
struct SetDiff<'a, T> {
    /// New or changed items, in `current` order.
    added: Vec<&'a T>,
    /// Removed or changed items, in `last` order.
    dropped: Vec<&'a T>,
}

/// Name-keyed diff of two lists. An item whose DDL changed is both dropped
/// and added.
fn named_set_diff<'a, T: Named>(last: &'a [T], current: &'a [T]) -> SetDiff<'a, T> {
    let last_map: IndexMap<&str, &T> = last.iter().map(|item| (item.name(), item)).collect();
    let current_map: IndexMap<&str, &T> =
        current.iter().map(|item| (item.name(), item)).collect();

    let added = current_map
        .iter()
        .filter(|(name, item)| {
            last_map
                .get(*name)
                .is_none_or(|old| old.raw_sql() != item.raw_sql())
        })
        .map(|(_, item)| *item)
        .collect();
    let dropped = last_map
        .iter()
        .filter(|(name, item)| {
            current_map
                .get(*name)
                .is_none_or(|new| new.raw_sql() != item.raw_sql())
        })
        .map(|(_, item)| *item)
        .collect();

    SetDiff { added, dropped }
}

/// Statements grouped by the position they take in the output.
#[derive(Debug, Default)]
struct Changes {
    add_tables: Vec<Block>,
    drop_fks: Vec<Block>,
    drop_indexes: Vec<Block>,
    drop_tables: Vec<Block>,
    add_fields: Vec<Block>,
    drop_pks: Vec<Block>,
    drop_uniques: Vec<Block>,
    drop_checks: Vec<Block>,
    drop_excludes: Vec<Block>,
    drop_fields: Vec<Block>,
    field_types: Vec<Block>,
    not_null: Vec<Block>,
    defaults: Vec<Block>,
    add_indexes: Vec<Block>,
    add_uniques: Vec<Block>,
    add_checks: Vec<Block>,
    add_pks: Vec<Block>,
    add_fks: Vec<Block>,
    add_excludes: Vec<Block>,
}

impl Changes {
    fn table(&mut self, last: Option<&TableDescription>, current: &TableDescription) {
        let table = current.name.as_str();

        let last_fields: IndexMap<&str, &FieldDescription> = last.map_or_else(IndexMap::new, |t| {
            t.fields.iter().map(|f| (f.name.as_str(), f)).collect()
        });
        let current_fields: IndexMap<&str, &FieldDescription> = current
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f))
            .collect();

        for (name, field) in &current_fields {
            let previous = last_fields
                .get(name)
                .map_or(Prior::Absent, |f| Prior::Present(*f));
            match previous {
                Prior::Absent => self
                    .add_fields
                    .push(alter::add_field(table, name, &field.type_)),
                Prior::Present(previous) if previous.type_ != field.type_ => self
                    .field_types
                    .push(alter::set_field_type(table, name, &field.type_)),
                Prior::Present(_) => {}
            }
            self.field_not_null(table, field, previous.map(|f| f.not_null));
            self.field_default(table, field, previous.map(|f| f.default.as_deref()));
        }
        for name in last_fields.keys() {
            if !current_fields.contains_key(name) {
                self.drop_fields.push(alter::drop_field(table, name));
            }
        }

        Self::constraints(
            table,
            constraints_of(last, |t| std::slice::from_ref(&t.pk_constraint)),
            std::slice::from_ref(&current.pk_constraint),
            &mut self.drop_pks,
            &mut self.add_pks,
        );
        Self::constraints(
            table,
            constraints_of(last, |t| &t.unique_constraints),
            &current.unique_constraints,
            &mut self.drop_uniques,
            &mut self.add_uniques,
        );
        Self::constraints(
            table,
            constraints_of(last, |t| &t.check_constraints),
            &current.check_constraints,
            &mut self.drop_checks,
            &mut self.add_checks,
        );
        Self::constraints(
            table,
            constraints_of(last, |t| &t.fk_constraints),
            &current.fk_constraints,
            &mut self.drop_fks,
            &mut self.add_fks,
        );
        Self::constraints(
            table,
            constraints_of(last, |t| &t.exclude_constraints),
            &current.exclude_constraints,
            &mut self.drop_excludes,
            &mut self.add_excludes,
        );
    }

    /// A new field only gets `SET NOT NULL`; an existing one gets whichever
    /// statement matches the change. A new `NOT NULL` field without a default
    /// fails on a populated table.
    fn field_not_null(&mut self, table: &str, field: &FieldDescription, previous: Prior<bool>) {
        let changed = match previous {
            Prior::Absent => field.not_null,
            Prior::Present(previous) => previous != field.not_null,
        };
        if changed {
            self.not_null
                .push(alter::set_field_not_null(table, &field.name, field.not_null));
        }
    }

    fn field_default(
        &mut self,
        table: &str,
        field: &FieldDescription,
        previous: Prior<Option<&str>>,
    ) {
        let current = field.default.as_deref();
        let changed = match previous {
            Prior::Absent => current.is_some(),
            Prior::Present(previous) => previous != current,
        };
        if !changed {
            return;
        }
        self.defaults.push(current.map_or_else(
            || alter::drop_field_default(table, &field.name),
            |literal| alter::set_field_default(table, &field.name, literal),
        ));
    }

    fn constraints(
        table: &str,
        last: &[ConstraintDescription],
        current: &[ConstraintDescription],
        drops: &mut Vec<Block>,
        adds: &mut Vec<Block>,
    ) {
        let set = named_set_diff(last, current);
        for constraint in set.dropped {
            drops.push(alter::drop_constraint(table, &constraint.name));
        }
        for constraint in set.added {
            adds.push(alter::add_constraint(table, &constraint.raw_sql));
        }
    }

    fn into_statements(self) -> Vec<String> {
        [
            self.add_tables,
            self.drop_fks,
            self.drop_indexes,
            self.drop_tables,
            self.add_fields,
            self.drop_pks,
            self.drop_uniques,
            self.drop_checks,
            self.drop_excludes,
            self.drop_fields,
            self.field_types,
            self.not_null,
            self.defaults,
            self.add_indexes,
            self.add_uniques,
            self.add_checks,
            self.add_pks,
            self.add_fks,
            self.add_excludes,
        ]
        .into_iter()
        .flatten()
        .map(|block| {
            let (sql, params) = block.render();
            debug_assert!(params.is_empty(), "DDL statement with parameters: {sql}");
            sql
        })
        .collect()
    }
}

/// The constraints of one kind on the last version of a table, if it existed.
fn constraints_of<'a>(
    table: Option<&'a TableDescription>,
    pick: impl FnOnce(&'a TableDescription) -> &'a [ConstraintDescription],
) -> &'a [ConstraintDescription] {
    table.map_or(&[], pick)
}

impl<T> Prior<T> {
    fn map<U>(self, f: impl FnOnce(T) -> U) -> Prior<U> {
        match self {
            Self::Absent => Prior::Absent,
            Self::Present(value) => Prior::Present(f(value)),
        }
    }
}
