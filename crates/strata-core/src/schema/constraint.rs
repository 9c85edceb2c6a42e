//! Table constraints.
//!
//! Every constraint is rendered once, when it is declared. `ALTER TABLE ...
//! ADD CONSTRAINT` cannot take bound parameters, so a fragment that would
//! need one is rejected right away with
//! [`SchemaError::ParametersInConstraint`].

use std::fmt;

use super::index::IndexType;
use crate::describe::ConstraintDescription;
use crate::error::{Result, SchemaError};
use crate::sql::{join, r, Block, Piece};

fn field_list(fields: &[&str]) -> Block {
    join(&r(","), fields.iter().map(|f| r(*f))).wrap()
}

fn owned(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| String::from(*f)).collect()
}

fn render(name: &str, sql: &Block) -> Result<String> {
    sql.render_no_params()
        .map_err(|_| SchemaError::ParametersInConstraint {
            name: String::from(name),
            count: sql.param_count(),
        })
}

/// `PRIMARY KEY` constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKey {
    name: String,
    fields: Vec<String>,
    raw_sql: String,
}

impl PrimaryKey {
    /// Declares a primary key over the given fields.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::EmptyPrimaryKey`] without fields.
    pub fn new(name: &str, fields: &[&str]) -> Result<Self> {
        if fields.is_empty() {
            return Err(SchemaError::EmptyPrimaryKey(String::from(name)));
        }
        let sql = Block::new([r("CONSTRAINT"), r(name), r("PRIMARY KEY"), field_list(fields)]);
        Ok(Self {
            name: String::from(name),
            fields: owned(fields),
            raw_sql: render(name, &sql)?,
        })
    }
}

/// `UNIQUE` constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unique {
    name: String,
    fields: Vec<String>,
    raw_sql: String,
}

impl Unique {
    /// Declares a unique constraint over the given fields.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::EmptyUnique`] without fields.
    pub fn new(name: &str, fields: &[&str]) -> Result<Self> {
        if fields.is_empty() {
            return Err(SchemaError::EmptyUnique(String::from(name)));
        }
        let sql = Block::new([r("CONSTRAINT"), r(name), r("UNIQUE"), field_list(fields)]);
        Ok(Self {
            name: String::from(name),
            fields: owned(fields),
            raw_sql: render(name, &sql)?,
        })
    }
}

/// `CHECK` constraint.
///
/// ```rust
/// use strata_core::schema::Check;
/// use strata_core::sql::{col, r, Comparable};
///
/// let check = Check::new("age_check", col("age").gteq(r("0"))).unwrap();
/// assert_eq!(check.raw_sql(), "CONSTRAINT age_check CHECK ( age >= 0 )");
///
/// // A bound value cannot be part of DDL.
/// assert!(Check::new("age_check", col("age").gteq(0)).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    name: String,
    raw_sql: String,
}

impl Check {
    /// Declares a check constraint. The expression must be raw SQL only.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::ParametersInConstraint`] if the expression
    /// holds bound parameters.
    pub fn new(name: &str, check: impl Into<Piece>) -> Result<Self> {
        let sql = Block::new([
            Piece::from(r("CONSTRAINT")),
            Piece::from(r(name)),
            Piece::from(r("CHECK")),
            Piece::from(Block::new([check]).wrap()),
        ]);
        Ok(Self {
            name: String::from(name),
            raw_sql: render(name, &sql)?,
        })
    }

    /// Returns the raw constraint fragment.
    #[must_use]
    pub fn raw_sql(&self) -> &str {
        &self.raw_sql
    }
}

/// Referential action of a foreign key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Action {
    /// `CASCADE`
    #[default]
    Cascade,
    /// `RESTRICT`
    Restrict,
    /// `NO ACTION`
    NoAction,
    /// `SET NULL`
    SetNull,
    /// `SET DEFAULT`
    SetDefault,
}

impl Action {
    /// Returns the SQL keyword(s).
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::Restrict => "RESTRICT",
            Self::NoAction => "NO ACTION",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// `FOREIGN KEY` constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    name: String,
    fields: Vec<String>,
    ref_table: String,
    ref_fields: Vec<String>,
    raw_sql: String,
}

impl ForeignKey {
    /// Starts declaring a foreign key.
    ///
    /// ```rust
    /// use strata_core::schema::{Action, ForeignKey};
    ///
    /// let fk = ForeignKey::builder("posts_author_fkey")
    ///     .fields(&["author_id"])
    ///     .references("users", &["id"])
    ///     .on_delete(Action::SetNull)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(
    ///     fk.raw_sql(),
    ///     "CONSTRAINT posts_author_fkey FOREIGN KEY ( author_id ) REFERENCES users ( id ) \
    ///      ON DELETE SET NULL ON UPDATE CASCADE"
    /// );
    /// ```
    pub fn builder(name: &str) -> ForeignKeyBuilder {
        ForeignKeyBuilder {
            name: String::from(name),
            fields: Vec::new(),
            ref_table: String::new(),
            ref_fields: Vec::new(),
            match_full: false,
            on_delete: Action::default(),
            on_update: Action::default(),
        }
    }

    /// Returns the referenced table.
    #[must_use]
    pub fn ref_table(&self) -> &str {
        &self.ref_table
    }

    /// Returns the referenced fields.
    #[must_use]
    pub fn ref_fields(&self) -> &[String] {
        &self.ref_fields
    }

    /// Returns the raw constraint fragment.
    #[must_use]
    pub fn raw_sql(&self) -> &str {
        &self.raw_sql
    }
}

/// Builder for [`ForeignKey`].
#[derive(Debug, Clone)]
#[must_use]
pub struct ForeignKeyBuilder {
    name: String,
    fields: Vec<String>,
    ref_table: String,
    ref_fields: Vec<String>,
    match_full: bool,
    on_delete: Action,
    on_update: Action,
}

impl ForeignKeyBuilder {
    /// Sets the local fields.
    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = owned(fields);
        self
    }

    /// Sets the referenced table and fields.
    pub fn references(mut self, table: &str, fields: &[&str]) -> Self {
        self.ref_table = String::from(table);
        self.ref_fields = owned(fields);
        self
    }

    /// Adds `MATCH FULL`.
    pub const fn match_full(mut self) -> Self {
        self.match_full = true;
        self
    }

    /// Sets the `ON DELETE` action. Defaults to `CASCADE`.
    pub const fn on_delete(mut self, action: Action) -> Self {
        self.on_delete = action;
        self
    }

    /// Sets the `ON UPDATE` action. Defaults to `CASCADE`.
    pub const fn on_update(mut self, action: Action) -> Self {
        self.on_update = action;
        self
    }

    /// Validates and renders the foreign key.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::ForeignKeyArity`] when the local and referenced
    /// field counts differ and [`SchemaError::EmptyForeignKey`] when both are
    /// empty.
    pub fn build(self) -> Result<ForeignKey> {
        if self.fields.len() != self.ref_fields.len() {
            return Err(SchemaError::ForeignKeyArity {
                name: self.name,
                fields: self.fields.len(),
                ref_fields: self.ref_fields.len(),
            });
        }
        if self.fields.is_empty() {
            return Err(SchemaError::EmptyForeignKey(self.name));
        }

        let mut sql = Block::new([r("CONSTRAINT"), r(self.name.as_str()), r("FOREIGN KEY")]);
        sql.push(join(&r(","), self.fields.iter().map(|f| r(f.as_str()))).wrap());
        sql.push(r("REFERENCES"));
        sql.push(r(self.ref_table.as_str()));
        sql.push(join(&r(","), self.ref_fields.iter().map(|f| r(f.as_str()))).wrap());
        if self.match_full {
            sql.push(r("MATCH FULL"));
        }
        sql.push(r(format!("ON DELETE {}", self.on_delete)));
        sql.push(r(format!("ON UPDATE {}", self.on_update)));
        let raw_sql = render(&self.name, &sql)?;

        Ok(ForeignKey {
            name: self.name,
            fields: self.fields,
            ref_table: self.ref_table,
            ref_fields: self.ref_fields,
            raw_sql,
        })
    }
}

/// `EXCLUDE` constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclude {
    name: String,
    raw_sql: String,
}

impl Exclude {
    /// Starts declaring an exclusion constraint.
    ///
    /// ```rust
    /// use strata_core::schema::Exclude;
    /// use strata_core::sql::col;
    ///
    /// let exclude = Exclude::builder("no_overlap")
    ///     .element(col("room"), "=")
    ///     .element(col("during"), "&&")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(
    ///     exclude.raw_sql(),
    ///     "CONSTRAINT no_overlap EXCLUDE USING GIST ( ( room WITH = ) , ( during WITH && ) )"
    /// );
    /// ```
    pub fn builder(name: &str) -> ExcludeBuilder {
        ExcludeBuilder {
            name: String::from(name),
            using: IndexType::Gist,
            elements: Vec::new(),
            where_clause: None,
        }
    }

    /// Returns the raw constraint fragment.
    #[must_use]
    pub fn raw_sql(&self) -> &str {
        &self.raw_sql
    }
}

/// Builder for [`Exclude`].
#[derive(Debug, Clone)]
#[must_use]
pub struct ExcludeBuilder {
    name: String,
    using: IndexType,
    elements: Vec<(Block, String)>,
    where_clause: Option<Block>,
}

impl ExcludeBuilder {
    /// Sets the index method. Defaults to `GiST`.
    pub const fn using(mut self, index_type: IndexType) -> Self {
        self.using = index_type;
        self
    }

    /// Adds an `element WITH operator` pair.
    pub fn element(mut self, element: impl Into<Piece>, operator: &str) -> Self {
        self.elements
            .push((Block::new([element]), String::from(operator)));
        self
    }

    /// Restricts the constraint to rows matching a predicate.
    pub fn where_clause(mut self, predicate: Block) -> Self {
        self.where_clause = Some(predicate);
        self
    }

    /// Validates and renders the exclusion constraint.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::EmptyExclude`] without elements and
    /// [`SchemaError::ParametersInConstraint`] if an element or the predicate
    /// holds bound parameters.
    pub fn build(self) -> Result<Exclude> {
        if self.elements.is_empty() {
            return Err(SchemaError::EmptyExclude(self.name));
        }

        let elements = self
            .elements
            .into_iter()
            .map(|(element, op)| Block::wrapped([element, r("WITH"), r(op)]));
        let mut sql = Block::new([
            r("CONSTRAINT"),
            r(self.name.as_str()),
            r("EXCLUDE USING"),
            r(self.using.as_sql()),
        ]);
        sql.push(join(&r(","), elements).wrap());
        if let Some(predicate) = self.where_clause {
            sql.push(r("WHERE"));
            sql.push(predicate.wrap());
        }

        Ok(Exclude {
            raw_sql: render(&self.name, &sql)?,
            name: self.name,
        })
    }
}

/// Any table constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Primary key.
    PrimaryKey(PrimaryKey),
    /// Unique constraint.
    Unique(Unique),
    /// Check constraint.
    Check(Check),
    /// Foreign key.
    ForeignKey(ForeignKey),
    /// Exclusion constraint.
    Exclude(Exclude),
}

impl Constraint {
    /// Returns the constraint name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::PrimaryKey(c) => &c.name,
            Self::Unique(c) => &c.name,
            Self::Check(c) => &c.name,
            Self::ForeignKey(c) => &c.name,
            Self::Exclude(c) => &c.name,
        }
    }

    /// Returns the rendered constraint fragment.
    #[must_use]
    pub fn raw_sql(&self) -> &str {
        match self {
            Self::PrimaryKey(c) => &c.raw_sql,
            Self::Unique(c) => &c.raw_sql,
            Self::Check(c) => &c.raw_sql,
            Self::ForeignKey(c) => &c.raw_sql,
            Self::Exclude(c) => &c.raw_sql,
        }
    }

    /// Returns the local fields the constraint names explicitly.
    ///
    /// Check and exclusion constraints take arbitrary expressions and report
    /// no fields.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        match self {
            Self::PrimaryKey(c) => &c.fields,
            Self::Unique(c) => &c.fields,
            Self::ForeignKey(c) => &c.fields,
            Self::Check(_) | Self::Exclude(_) => &[],
        }
    }

    /// Describes the constraint.
    #[must_use]
    pub fn describe(&self) -> ConstraintDescription {
        ConstraintDescription {
            name: String::from(self.name()),
            raw_sql: String::from(self.raw_sql()),
        }
    }
}

impl From<PrimaryKey> for Constraint {
    fn from(c: PrimaryKey) -> Self {
        Self::PrimaryKey(c)
    }
}

impl From<Unique> for Constraint {
    fn from(c: Unique) -> Self {
        Self::Unique(c)
    }
}

impl From<Check> for Constraint {
    fn from(c: Check) -> Self {
        Self::Check(c)
    }
}

impl From<ForeignKey> for Constraint {
    fn from(c: ForeignKey) -> Self {
        Self::ForeignKey(c)
    }
}

impl From<Exclude> for Constraint {
    fn from(c: Exclude) -> Self {
        Self::Exclude(c)
    }
}
