//! # strata-core
//!
//! Schema declarations and a composable SQL expression tree for Postgres.
//!
//! This crate provides:
//! - [`sql::Block`], a flat list of raw SQL and bound parameters that renders
//!   to `$n`-numbered query text
//! - Comparison helpers that always parenthesize, so nested conditions
//!   compose without precedence surprises
//! - Table, constraint and index declarations that are validated when they
//!   are built
//! - [`describe::Description`], the serializable snapshot the migration
//!   tooling diffs
//!
//! ## Building expressions
//!
//! ```rust
//! use strata_core::sql::comp::and_;
//! use strata_core::sql::{col, Comparable, SqlValue};
//!
//! let (sql, params) = and_([col("col").eq(5), col("other").eq(6)]).render();
//! assert_eq!(sql, "( ( col = $1 ) AND ( other = $2 ) )");
//! assert_eq!(params, vec![SqlValue::Int(5), SqlValue::Int(6)]);
//! ```
//!
//! ## SQL Injection Prevention
//!
//! Anything that is not explicitly marked raw with [`sql::r`] becomes a
//! parameter:
//!
//! ```rust
//! use strata_core::sql::{col, Comparable, SqlValue};
//!
//! let user_input = "'; DROP TABLE users; --";
//! let (sql, params) = col("name").eq(user_input).render();
//! assert_eq!(sql, "( name = $1 )");
//! assert_eq!(params, vec![SqlValue::Text(String::from(user_input))]);
//! ```
//!
//! ## Declaring a schema
//!
//! ```rust
//! use strata_core::schema::{Field, Index, Schema, TableDef};
//!
//! let users = TableDef::builder("users")
//!     .field(Field::new("id", "SERIAL").not_null())
//!     .field(Field::new("email", "TEXT").not_null())
//!     .primary_key(&["id"])
//!     .build()?;
//! let schema = Schema::builder()
//!     .table(users)
//!     .index(Index::btree("users", &["email"])?)
//!     .build()?;
//! assert_eq!(schema.describe().tables.len(), 1);
//! # Ok::<(), strata_core::error::SchemaError>(())
//! ```

pub mod describe;
pub mod error;
pub mod schema;
pub mod sql;

pub use describe::Description;
pub use error::{SchemaError, SqlError};
pub use schema::{Schema, Table, TableDef};
pub use sql::{col, Block, Column, Comparable};
