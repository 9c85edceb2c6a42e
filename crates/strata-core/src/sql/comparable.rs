//! Comparison and predicate methods shared by blocks and columns.

use super::block::{r, Block, Piece};
use super::column::Column;

/// Something that can appear on the left side of a comparison.
///
/// Every method returns a new wrapped [`Block`], so results can be combined
/// with [`and_`](super::comp::and_) and friends without worrying about
/// operator precedence.
///
/// ```rust
/// use strata_core::sql::{col, Comparable};
///
/// let (sql, params) = col("age").gteq(18).render();
/// assert_eq!(sql, "( age >= $1 )");
/// assert_eq!(params.len(), 1);
/// ```
pub trait Comparable {
    /// Returns the expression as a block.
    fn to_block(&self) -> Block;

    /// `( self = other )`
    fn eq(&self, other: impl Into<Piece>) -> Block {
        binary(self.to_block(), "=", other.into())
    }

    /// `( self != other )`
    fn neq(&self, other: impl Into<Piece>) -> Block {
        binary(self.to_block(), "!=", other.into())
    }

    /// `( self < other )`
    fn lt(&self, other: impl Into<Piece>) -> Block {
        binary(self.to_block(), "<", other.into())
    }

    /// `( self > other )`
    fn gt(&self, other: impl Into<Piece>) -> Block {
        binary(self.to_block(), ">", other.into())
    }

    /// `( self <= other )`
    fn lteq(&self, other: impl Into<Piece>) -> Block {
        binary(self.to_block(), "<=", other.into())
    }

    /// `( self >= other )`
    fn gteq(&self, other: impl Into<Piece>) -> Block {
        binary(self.to_block(), ">=", other.into())
    }

    /// `( ( self ) IS NULL )`
    fn is_null(&self) -> Block {
        postfix(self.to_block(), "IS NULL")
    }

    /// `( ( self ) IS NOT NULL )`
    fn is_not_null(&self) -> Block {
        postfix(self.to_block(), "IS NOT NULL")
    }

    /// `( ( self ) IS TRUE )`
    fn is_true(&self) -> Block {
        postfix(self.to_block(), "IS TRUE")
    }

    /// `( ( self ) IS FALSE )`
    fn is_false(&self) -> Block {
        postfix(self.to_block(), "IS FALSE")
    }

    /// `( NOT ( self ) )`
    fn not_(&self) -> Block {
        Block::wrapped([r("NOT"), Block::wrapped([self.to_block()])])
    }

    /// `( self :: sql_type )`
    fn cast(&self, sql_type: &str) -> Block {
        Block::wrapped([self.to_block(), r("::"), r(sql_type)])
    }
}

pub(super) fn binary(left: Block, op: &str, right: Piece) -> Block {
    Block::wrapped([Piece::from(left), Piece::from(r(op)), right])
}

pub(super) fn postfix(operand: Block, op: &str) -> Block {
    Block::wrapped([Block::wrapped([operand]), r(op)])
}

impl Comparable for Block {
    fn to_block(&self) -> Block {
        self.clone()
    }
}

impl Comparable for Column {
    fn to_block(&self) -> Block {
        r(self.to_sql())
    }
}
