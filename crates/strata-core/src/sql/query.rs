//! Statement generators.
//!
//! These builders only compose [`Block`]s; executing them is up to the
//! caller. Table names are raw SQL, every other value passed where a
//! [`Piece`] is expected follows the usual classification (columns and
//! blocks are embedded, scalars become parameters).
//!
//! ```rust
//! use strata_core::sql::query::Select;
//! use strata_core::sql::{col, Comparable};
//!
//! let (sql, params) = Select::from_table("users")
//!     .fields([col("id"), col("email")])
//!     .where_clause(col("active").eq(true))
//!     .order_by(col("id"))
//!     .limit(10)
//!     .build()
//!     .render();
//! assert_eq!(
//!     sql,
//!     "SELECT id , email FROM users WHERE ( active = $1 ) ORDER BY id ASC LIMIT 10"
//! );
//! assert_eq!(params.len(), 1);
//! ```

use std::marker::PhantomData;

use super::block::{join, r, Block, Piece};
use super::column::Column;

fn comma_list<I>(values: I) -> Block
where
    I: IntoIterator,
    I::Item: Into<Piece>,
{
    join(&r(","), values)
}

/// A SELECT statement.
#[derive(Debug, Clone)]
#[must_use]
pub struct Select {
    from: String,
    fields: Option<Block>,
    count: bool,
    where_clause: Option<Block>,
    order_by: Option<(Block, bool)>,
    limit: Option<u64>,
}

impl Select {
    /// Starts a `SELECT * FROM table`.
    pub fn from_table(table: &str) -> Self {
        Self {
            from: String::from(table),
            fields: None,
            count: false,
            where_clause: None,
            order_by: None,
            limit: None,
        }
    }

    /// Selects the given fields instead of `*`.
    pub fn fields<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Piece>,
    {
        self.fields = Some(comma_list(fields));
        self
    }

    /// Selects `COUNT(1)` instead of rows.
    pub const fn count(mut self) -> Self {
        self.count = true;
        self
    }

    /// Sets the WHERE condition.
    pub fn where_clause(mut self, condition: Block) -> Self {
        self.where_clause = Some(condition);
        self
    }

    /// Orders ascending by an expression.
    pub fn order_by(mut self, expr: impl Into<Piece>) -> Self {
        self.order_by = Some((Block::new([expr]), false));
        self
    }

    /// Orders descending by an expression.
    pub fn order_by_desc(mut self, expr: impl Into<Piece>) -> Self {
        self.order_by = Some((Block::new([expr]), true));
        self
    }

    /// Limits the number of rows.
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Builds the statement.
    #[must_use]
    pub fn build(self) -> Block {
        let mut sql = r("SELECT");
        if self.count {
            sql.push(r("COUNT(1)"));
        } else if let Some(fields) = self.fields {
            sql.push(fields);
        } else {
            sql.push(r("*"));
        }
        sql.push(r("FROM"));
        sql.push(r(self.from));

        if let Some(condition) = self.where_clause {
            sql.push(r("WHERE"));
            sql.push(condition.wrap());
        }
        if let Some((expr, desc)) = self.order_by {
            sql.push(r("ORDER BY"));
            sql.push(expr);
            sql.push(r(if desc { "DESC" } else { "ASC" }));
        }
        if let Some(limit) = self.limit {
            sql.push(r("LIMIT"));
            sql.push(r(limit.to_string()));
        }
        sql
    }
}

/// An INSERT statement.
#[derive(Debug, Clone)]
#[must_use]
pub struct Insert {
    into: String,
    fields: Vec<Piece>,
    values: Vec<Piece>,
    returning: Option<Block>,
}

impl Insert {
    /// Starts an `INSERT INTO table`.
    pub fn into_table(table: &str) -> Self {
        Self {
            into: String::from(table),
            fields: Vec::new(),
            values: Vec::new(),
            returning: None,
        }
    }

    /// Adds a field and the value to insert into it.
    ///
    /// The target is always written unqualified, as Postgres requires.
    pub fn value(mut self, field: &Column, value: impl Into<Piece>) -> Self {
        self.fields.push(Piece::from(r(field.name.as_str())));
        self.values.push(value.into());
        self
    }

    /// Adds a `RETURNING` list.
    pub fn returning<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Piece>,
    {
        self.returning = Some(comma_list(fields));
        self
    }

    /// Builds the statement. Without values it inserts `DEFAULT VALUES`.
    #[must_use]
    pub fn build(self) -> Block {
        let mut sql = Block::new([r("INSERT INTO"), r(self.into)]);
        if self.values.is_empty() {
            sql.push(r("DEFAULT VALUES"));
        } else {
            sql.push(comma_list(self.fields).wrap());
            sql.push(r("VALUES"));
            sql.push(comma_list(self.values).wrap());
        }
        if let Some(returning) = self.returning {
            sql.push(r("RETURNING"));
            sql.push(returning);
        }
        sql
    }
}

/// Marker: no SET assignment yet.
#[derive(Debug, Clone)]
pub struct NoSet;
/// Marker: at least one SET assignment.
#[derive(Debug, Clone)]
pub struct HasSet;

/// An UPDATE statement. `build()` is only available once something is set.
#[derive(Debug, Clone)]
#[must_use]
pub struct Update<Set = NoSet> {
    table: String,
    assignments: Vec<Block>,
    where_clause: Option<Block>,
    returning: Option<Block>,
    _state: PhantomData<Set>,
}

impl Update<NoSet> {
    /// Starts an `UPDATE table`.
    pub fn table(table: &str) -> Self {
        Self {
            table: String::from(table),
            assignments: Vec::new(),
            where_clause: None,
            returning: None,
            _state: PhantomData,
        }
    }
}

impl<Set> Update<Set> {
    /// Adds a `field = value` assignment. The target is written unqualified.
    pub fn set(mut self, field: &Column, value: impl Into<Piece>) -> Update<HasSet> {
        self.assignments.push(Block::new([
            Piece::from(r(field.name.as_str())),
            Piece::from(r("=")),
            value.into(),
        ]));
        Update {
            table: self.table,
            assignments: self.assignments,
            where_clause: self.where_clause,
            returning: self.returning,
            _state: PhantomData,
        }
    }

    /// Sets the WHERE condition.
    pub fn where_clause(mut self, condition: Block) -> Self {
        self.where_clause = Some(condition);
        self
    }

    /// Adds a `RETURNING` list.
    pub fn returning<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Piece>,
    {
        self.returning = Some(comma_list(fields));
        self
    }
}

impl Update<HasSet> {
    /// Builds the statement.
    #[must_use]
    pub fn build(self) -> Block {
        let mut sql = Block::new([r("UPDATE"), r(self.table), r("SET")]);
        sql.push(comma_list(self.assignments));
        if let Some(condition) = self.where_clause {
            sql.push(r("WHERE"));
            sql.push(condition.wrap());
        }
        if let Some(returning) = self.returning {
            sql.push(r("RETURNING"));
            sql.push(returning);
        }
        sql
    }
}

/// A DELETE statement.
#[derive(Debug, Clone)]
#[must_use]
pub struct Delete {
    from: String,
    where_clause: Option<Block>,
    returning: Option<Block>,
}

impl Delete {
    /// Starts a `DELETE FROM table`.
    pub fn from_table(table: &str) -> Self {
        Self {
            from: String::from(table),
            where_clause: None,
            returning: None,
        }
    }

    /// Sets the WHERE condition.
    pub fn where_clause(mut self, condition: Block) -> Self {
        self.where_clause = Some(condition);
        self
    }

    /// Adds a `RETURNING` list.
    pub fn returning<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Piece>,
    {
        self.returning = Some(comma_list(fields));
        self
    }

    /// Builds the statement.
    #[must_use]
    pub fn build(self) -> Block {
        let mut sql = Block::new([r("DELETE FROM"), r(self.from)]);
        if let Some(condition) = self.where_clause {
            sql.push(r("WHERE"));
            sql.push(condition.wrap());
        }
        if let Some(returning) = self.returning {
            sql.push(r("RETURNING"));
            sql.push(returning);
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::comp::and_;
    use crate::sql::{col, Comparable, SqlValue};

    #[test]
    fn test_select_all() {
        let (sql, params) = Select::from_table("users").build().render();
        assert_eq!(sql, "SELECT * FROM users");
        assert!(params.is_empty());
    }

    #[test]
    fn test_select_count_with_where() {
        let (sql, params) = Select::from_table("users")
            .count()
            .where_clause(and_([col("age").gteq(18), col("banned").is_false()]))
            .build()
            .render();
        assert_eq!(
            sql,
            "SELECT COUNT(1) FROM users WHERE ( ( age >= $1 ) AND ( ( banned ) IS FALSE ) )"
        );
        assert_eq!(params, vec![SqlValue::Int(18)]);
    }

    #[test]
    fn test_select_order_desc() {
        let (sql, _) = Select::from_table("posts")
            .fields([col("id")])
            .order_by_desc(col("created_at"))
            .build()
            .render();
        assert_eq!(sql, "SELECT id FROM posts ORDER BY created_at DESC");
    }

    #[test]
    fn test_insert() {
        let (sql, params) = Insert::into_table("users")
            .value(&Column::qualified("users", "name"), "alice")
            .value(&col("age"), 30)
            .returning([col("id")])
            .build()
            .render();
        assert_eq!(
            sql,
            "INSERT INTO users ( name , age ) VALUES ( $1 , $2 ) RETURNING id"
        );
        assert_eq!(
            params,
            vec![SqlValue::Text(String::from("alice")), SqlValue::Int(30)]
        );
    }

    #[test]
    fn test_insert_default_values() {
        let (sql, _) = Insert::into_table("counters").build().render();
        assert_eq!(sql, "INSERT INTO counters DEFAULT VALUES");
    }

    #[test]
    fn test_update() {
        let (sql, params) = Update::table("users")
            .set(&col("name"), "bob")
            .set(&Column::qualified("users", "age"), 31)
            .where_clause(col("id").eq(7))
            .build()
            .render();
        assert_eq!(
            sql,
            "UPDATE users SET name = $1 , age = $2 WHERE ( id = $3 )"
        );
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_delete() {
        let (sql, params) = Delete::from_table("sessions")
            .where_clause(col("expired").is_true())
            .returning([col("id"), col("user_id")])
            .build()
            .render();
        assert_eq!(
            sql,
            "DELETE FROM sessions WHERE ( ( expired ) IS TRUE ) RETURNING id , user_id"
        );
        assert!(params.is_empty());
    }
}
