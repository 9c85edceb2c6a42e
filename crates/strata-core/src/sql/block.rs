//! Composable SQL fragments.
//!
//! A [`Block`] is a flat list of [`Atom`]s (raw SQL text or bound
//! parameters) plus a flag saying whether it is parenthesized when rendered
//! or embedded in another block. Nested blocks are flattened when they are
//! added, so the same sub-expression renders identically wherever it is
//! reused.
//!
//! ```rust
//! use strata_core::sql::{r, Block, Piece};
//!
//! let block = Block::new([
//!     Piece::from(r("SELECT * FROM users WHERE id =")),
//!     Piece::from(5),
//!     Piece::from(r("AND name =")),
//!     Piece::from("alice"),
//! ]);
//! let (sql, params) = block.render();
//! assert_eq!(sql, "SELECT * FROM users WHERE id = $1 AND name = $2");
//! assert_eq!(params.len(), 2);
//! ```

use super::column::Column;
use super::render::Renderer;
use super::value::{SqlValue, ToSqlValue};
use crate::error::SqlError;

/// The smallest unit of a block.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    /// Verbatim SQL text.
    Raw(String),
    /// A value bound to a positional placeholder.
    Param(SqlValue),
}

impl Atom {
    /// Creates a raw atom.
    #[must_use]
    pub fn raw(text: impl Into<String>) -> Self {
        Self::Raw(text.into())
    }
}

/// Anything that can be appended to a block.
///
/// Scalars become parameters, blocks and columns are flattened into their
/// atoms. Raw SQL has to be spelled out with [`r`].
#[derive(Debug, Clone)]
pub enum Piece {
    /// A single atom.
    Atom(Atom),
    /// A nested block.
    Block(Block),
}

impl From<Atom> for Piece {
    fn from(atom: Atom) -> Self {
        Self::Atom(atom)
    }
}

impl From<Block> for Piece {
    fn from(block: Block) -> Self {
        Self::Block(block)
    }
}

impl From<&Block> for Piece {
    fn from(block: &Block) -> Self {
        Self::Block(block.clone())
    }
}

impl From<Column> for Piece {
    fn from(column: Column) -> Self {
        Self::Block(r(column.to_sql()))
    }
}

impl From<&Column> for Piece {
    fn from(column: &Column) -> Self {
        Self::Block(r(column.to_sql()))
    }
}

macro_rules! impl_param_piece {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Piece {
                fn from(value: $ty) -> Self {
                    Self::Atom(Atom::Param(value.to_sql_value()))
                }
            }
        )+
    };
}

impl_param_piece!(
    SqlValue, bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, String, &str, Vec<u8>, &[u8],
);

impl<T: ToSqlValue> From<Option<T>> for Piece {
    fn from(value: Option<T>) -> Self {
        Self::Atom(Atom::Param(value.to_sql_value()))
    }
}

/// A list of raw SQL and parameter atoms.
#[derive(Debug, Clone, Default)]
pub struct Block {
    atoms: Vec<Atom>,
    wrap: bool,
}

impl Block {
    /// Creates a block from pieces.
    ///
    /// If exactly one block is passed its atoms are taken over as-is and its
    /// wrap flag is kept, otherwise every piece is appended in order.
    pub fn new<I>(pieces: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Piece>,
    {
        Self::build(pieces.into_iter().map(Into::into).collect(), false)
    }

    /// Like [`Block::new`], but the result is wrapped in `( )`.
    pub fn wrapped<I>(pieces: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Piece>,
    {
        Self::build(pieces.into_iter().map(Into::into).collect(), true)
    }

    fn build(mut pieces: Vec<Piece>, wrap: bool) -> Self {
        if pieces.len() == 1 && matches!(pieces[0], Piece::Block(_)) {
            if let Some(Piece::Block(inner)) = pieces.pop() {
                return Self {
                    atoms: inner.atoms,
                    wrap: inner.wrap || wrap,
                };
            }
        }

        let mut block = Self {
            atoms: Vec::with_capacity(pieces.len()),
            wrap,
        };
        for piece in pieces {
            block.push(piece);
        }
        block
    }

    /// Appends a piece. A wrapped block is appended with its parentheses.
    pub fn push(&mut self, piece: impl Into<Piece>) {
        match piece.into() {
            Piece::Atom(atom) => self.atoms.push(atom),
            Piece::Block(block) => self.atoms.extend(block.into_atoms()),
        }
    }

    /// Returns the same block, marked to be wrapped in `( )`.
    #[must_use]
    pub fn wrap(mut self) -> Self {
        self.wrap = true;
        self
    }

    /// Whether this block is parenthesized.
    #[must_use]
    pub const fn is_wrapped(&self) -> bool {
        self.wrap
    }

    /// Returns the inner atoms, without the wrapping parentheses.
    #[must_use]
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// Whether the block holds no atoms.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Number of parameter atoms.
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.atoms
            .iter()
            .filter(|atom| matches!(atom, Atom::Param(_)))
            .count()
    }

    /// Consumes the block and returns its atoms, wrap pair included.
    #[must_use]
    pub fn into_atoms(self) -> Vec<Atom> {
        if !self.wrap {
            return self.atoms;
        }
        let mut atoms = Vec::with_capacity(self.atoms.len() + 2);
        atoms.push(Atom::raw("("));
        atoms.extend(self.atoms);
        atoms.push(Atom::raw(")"));
        atoms
    }

    /// Renders the block to SQL text and its ordered parameters.
    #[must_use]
    pub fn render(&self) -> (String, Vec<SqlValue>) {
        Renderer::new().render(self)
    }

    /// Renders a block that must not contain parameters.
    ///
    /// DDL such as `ALTER TABLE ... ADD CONSTRAINT` cannot take bound
    /// parameters, so a parameter here is an error rather than something to
    /// drop silently.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::UnexpectedParameters`] if the block holds any
    /// parameter atom.
    pub fn render_no_params(&self) -> Result<String, SqlError> {
        let (sql, params) = self.render();
        if params.is_empty() {
            Ok(sql)
        } else {
            Err(SqlError::UnexpectedParameters {
                count: params.len(),
            })
        }
    }
}

/// Treats the text as raw SQL.
///
/// Never pass user input to `r()`: it is inserted verbatim. Values belong in
/// parameters, which is what every non-block piece becomes.
#[must_use]
pub fn r(text: impl Into<String>) -> Block {
    Block {
        atoms: vec![Atom::raw(text)],
        wrap: false,
    }
}

/// Explicitly boxes a value as a parameter.
#[must_use]
pub fn p(value: impl ToSqlValue) -> Atom {
    Atom::Param(value.to_sql_value())
}

/// SQL counterpart of `joiner.join(values)`.
#[must_use]
pub fn join<I>(joiner: &Block, values: I) -> Block
where
    I: IntoIterator,
    I::Item: Into<Piece>,
{
    let mut block = Block::default();
    for (i, value) in values.into_iter().enumerate() {
        if i > 0 {
            block.push(joiner);
        }
        block.push(value);
    }
    block
}

/// Builds a [`Block`] from a list of pieces.
///
/// ```rust
/// use strata_core::sql;
/// use strata_core::sql::r;
///
/// let (sql, params) = sql![r("SELECT"), 1, r(","), "two"].render();
/// assert_eq!(sql, "SELECT $1 , $2");
/// assert_eq!(params.len(), 2);
/// ```
#[macro_export]
macro_rules! sql {
    () => {
        $crate::sql::Block::default()
    };
    ($($piece:expr),+ $(,)?) => {
        $crate::sql::Block::new([$($crate::sql::Piece::from($piece)),+])
    };
}

/// Builds a wrapped [`Block`] from a list of pieces.
#[macro_export]
macro_rules! wrap {
    ($($piece:expr),+ $(,)?) => {
        $crate::sql::Block::wrapped([$($crate::sql::Piece::from($piece)),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars_become_params() {
        let block = Block::new([Piece::from(r("SELECT")), Piece::from("Hello"), Piece::from(17)]);
        let (sql, params) = block.render();
        assert_eq!(sql, "SELECT $1 $2");
        assert_eq!(
            params,
            vec![SqlValue::Text(String::from("Hello")), SqlValue::Int(17)]
        );
    }

    #[test]
    fn test_single_block_is_absorbed() {
        let inner = Block::wrapped([r("a")]);
        let outer = Block::new([inner.clone()]);
        assert!(outer.is_wrapped());
        assert_eq!(outer.atoms(), inner.atoms());

        let forced = Block::wrapped([r("b")]);
        assert_eq!(forced.render().0, "( b )");
    }

    #[test]
    fn test_nested_wrapped_block_keeps_parens() {
        let inner = Block::wrapped([Piece::from(r("x =")), Piece::from(1)]);
        let outer = Block::new([Piece::from(r("WHERE")), Piece::from(inner)]);
        assert!(!outer.is_wrapped());
        assert_eq!(outer.render().0, "WHERE ( x = $1 )");
    }

    #[test]
    fn test_flattening_is_eager() {
        let cond = Block::wrapped([Piece::from(r("id =")), Piece::from(3)]);
        let a = Block::new([Piece::from(r("WHERE")), Piece::from(&cond)]);
        let b = Block::new([Piece::from(r("AND")), Piece::from(&cond)]);
        assert_eq!(a.atoms().len(), 5);
        assert_eq!(a.render().0, "WHERE ( id = $1 )");
        assert_eq!(b.render().0, "AND ( id = $1 )");
    }

    #[test]
    fn test_push_appends_pieces() {
        let mut block = r("SELECT");
        block.push(r("*"));
        block.push(sql![r("FROM"), r("users")]);
        block.push(Block::wrapped([r("x")]));
        assert_eq!(block.render().0, "SELECT * FROM users ( x )");
    }

    #[test]
    fn test_render_no_params() {
        assert_eq!(r("DROP TABLE users").render_no_params().unwrap(), "DROP TABLE users");
        let err = sql![r("x ="), 5].render_no_params().unwrap_err();
        assert_eq!(err, SqlError::UnexpectedParameters { count: 1 });
    }

    #[test]
    fn test_join() {
        let joined = join(&r(","), [r("a"), r("b"), r("c")]);
        assert_eq!(joined.render().0, "a , b , c");
        assert!(join(&r(","), Vec::<Block>::new()).is_empty());
    }

    #[test]
    fn test_option_params() {
        let (sql, params) = sql![r("x ="), None::<i32>].render();
        assert_eq!(sql, "x = $1");
        assert_eq!(params, vec![SqlValue::Null]);
    }

    #[test]
    fn test_param_count() {
        let block = sql![r("a"), 1, r("b"), 2];
        assert_eq!(block.param_count(), 2);
        assert_eq!(sql![].param_count(), 0);
    }
}
