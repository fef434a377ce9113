//! The cell contract every lattice element implements.
//!
//! A cell does not store a value; it stores *everything currently known
//! about* a value. Knowledge only ever grows: merging two cells moves the
//! receiver to the least upper bound of both information states, or fails
//! with a contradiction when no consistent combination exists.
//!
//! For any two same-kind cells `a` and `b`, exactly one of the following
//! holds:
//!
//! - `a.is_equal(&b)`: same information;
//! - `a` strictly entails `b`: `a` knows everything `b` knows, and more;
//! - `b` strictly entails `a`;
//! - `a.is_contradictory(&b)`: no consistent combination exists;
//! - (composite and partial-order kinds only) incomparable but mergeable:
//!   each side carries information the other lacks, and `merge` must
//!   combine both rather than pick a winner.
//!
//! Merging is in place: the receiver is taken by `&mut`, the argument is
//! read-only. A merge that returns the contradiction outcome leaves the
//! receiver unchanged; every implementation checks compatibility before
//! writing.

use crate::error::CellResult;

/// Operations shared by every concrete lattice cell.
pub trait Cell: Clone + std::fmt::Debug {
    /// Combine `other`'s information into `self`.
    ///
    /// Returns the contradiction outcome when the two information states
    /// are incompatible; the receiver is not modified in that case.
    fn merge(&mut self, other: &Self) -> CellResult<()>;

    /// Whether both cells carry exactly the same information.
    fn is_equal(&self, other: &Self) -> bool;

    /// Whether `other` carries at least as much information as `self`
    /// (`other` is as specific as `self`, or more so).
    fn is_entailed_by(&self, other: &Self) -> bool;

    /// Whether `self` carries at least as much information as `other`.
    ///
    /// The inverse of [`Cell::is_entailed_by`].
    fn entails(&self, other: &Self) -> bool {
        other.is_entailed_by(self)
    }

    /// Whether no consistent merge of the two cells exists.
    fn is_contradictory(&self, other: &Self) -> bool;

    /// A fresh, maximally uncertain cell of the same kind and domain.
    ///
    /// Used when a field must be created on demand from a sibling's shape:
    /// the stem shares the original's domain but asserts nothing.
    fn stem(&self) -> Self;

    /// Content hash, consistent with [`Cell::is_equal`]:
    /// `a.is_equal(&b)` implies `a.content_hash() == b.content_hash()`.
    fn content_hash(&self) -> u64;
}
