//! SQL expression tree and renderer.
//!
//! Everything that produces SQL in strata goes through a [`Block`]: the
//! migration diff, constraint and index declarations, and the statement
//! builders in [`query`].

pub mod alter;
mod block;
mod column;
pub mod comp;
mod comparable;
pub mod query;
mod render;
mod value;

pub use block::{join, p, r, Atom, Block, Piece};
pub use column::{col, Column};
pub use comparable::Comparable;
pub use render::Renderer;
pub use value::{SqlValue, ToSqlValue};
