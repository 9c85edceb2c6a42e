//! Schema declarations: fields, constraints, indexes, tables and the
//! registry that holds them.
//!
//! Declarations are validated when they are built, so a malformed schema is
//! rejected before anything is diffed or sent to a database.

mod constraint;
mod field;
mod index;
mod registry;
mod table;

pub use constraint::{
    Action, Check, Constraint, Exclude, ExcludeBuilder, ForeignKey, ForeignKeyBuilder, PrimaryKey,
    Unique,
};
pub use field::Field;
pub use index::{Index, IndexType};
pub use registry::{Schema, SchemaBuilder};
pub use table::{Table, TableBuilder, TableDef};
