//! Free-standing boolean and comparison generators.
//!
//! These mirror the [`Comparable`](super::Comparable) methods for cases where
//! the left side is a plain value, and add the n-ary connectives.

use super::block::{join, r, Block, Piece};
use super::comparable::{binary, postfix};

/// `( a AND b AND ... )`
#[must_use]
pub fn and_<I>(values: I) -> Block
where
    I: IntoIterator,
    I::Item: Into<Piece>,
{
    join(&r("AND"), values).wrap()
}

/// `( a OR b OR ... )`
#[must_use]
pub fn or_<I>(values: I) -> Block
where
    I: IntoIterator,
    I::Item: Into<Piece>,
{
    join(&r("OR"), values).wrap()
}

/// `( NOT value )`
#[must_use]
pub fn not_(value: impl Into<Piece>) -> Block {
    Block::wrapped([Piece::from(r("NOT")), value.into()])
}

/// `( left = right )`
#[must_use]
pub fn eq(left: impl Into<Piece>, right: impl Into<Piece>) -> Block {
    binary(Block::new([left]), "=", right.into())
}

/// `( left != right )`
#[must_use]
pub fn neq(left: impl Into<Piece>, right: impl Into<Piece>) -> Block {
    binary(Block::new([left]), "!=", right.into())
}

/// `( left < right )`
#[must_use]
pub fn lt(left: impl Into<Piece>, right: impl Into<Piece>) -> Block {
    binary(Block::new([left]), "<", right.into())
}

/// `( left > right )`
#[must_use]
pub fn gt(left: impl Into<Piece>, right: impl Into<Piece>) -> Block {
    binary(Block::new([left]), ">", right.into())
}

/// `( left <= right )`
#[must_use]
pub fn lteq(left: impl Into<Piece>, right: impl Into<Piece>) -> Block {
    binary(Block::new([left]), "<=", right.into())
}

/// `( left >= right )`
#[must_use]
pub fn gteq(left: impl Into<Piece>, right: impl Into<Piece>) -> Block {
    binary(Block::new([left]), ">=", right.into())
}

fn range(
    value: impl Into<Piece>,
    op: &str,
    low: impl Into<Piece>,
    high: impl Into<Piece>,
) -> Block {
    Block::wrapped([
        value.into(),
        Piece::from(r(op)),
        low.into(),
        Piece::from(r("AND")),
        high.into(),
    ])
}

/// `( value BETWEEN low AND high )`
#[must_use]
pub fn between(value: impl Into<Piece>, low: impl Into<Piece>, high: impl Into<Piece>) -> Block {
    range(value, "BETWEEN", low, high)
}

/// `( value NOT BETWEEN low AND high )`
#[must_use]
pub fn not_between(
    value: impl Into<Piece>,
    low: impl Into<Piece>,
    high: impl Into<Piece>,
) -> Block {
    range(value, "NOT BETWEEN", low, high)
}

/// `( value BETWEEN SYMMETRIC first AND second )`
#[must_use]
pub fn between_symmetric(
    value: impl Into<Piece>,
    first: impl Into<Piece>,
    second: impl Into<Piece>,
) -> Block {
    range(value, "BETWEEN SYMMETRIC", first, second)
}

/// `( value IS DISTINCT FROM other )`
#[must_use]
pub fn is_distinct(value: impl Into<Piece>, other: impl Into<Piece>) -> Block {
    binary(Block::new([value]), "IS DISTINCT FROM", other.into())
}

/// `( value IS NOT DISTINCT FROM other )`
#[must_use]
pub fn is_not_distinct(value: impl Into<Piece>, other: impl Into<Piece>) -> Block {
    binary(Block::new([value]), "IS NOT DISTINCT FROM", other.into())
}

/// `( ( value ) IS NULL )`
#[must_use]
pub fn is_null(value: impl Into<Piece>) -> Block {
    postfix(Block::new([value]), "IS NULL")
}

/// `( ( value ) IS NOT NULL )`
#[must_use]
pub fn is_not_null(value: impl Into<Piece>) -> Block {
    postfix(Block::new([value]), "IS NOT NULL")
}
