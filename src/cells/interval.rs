//! Closed-interval lattice with interval arithmetic.
//!
//! An `IntervalCell` holds inclusive `[low, high]` bounds over f64. Merging
//! narrows: the merged cell is the intersection of the operands, and an
//! empty intersection is a contradiction. The unconstrained interval
//! `(-inf, +inf)` is the bottom element.
//!
//! Arithmetic follows the usual interval-algebra template: evaluate the
//! operation at the four corner pairs and keep the widest bounds. `at_most`
//! and `at_least` narrow one side in place, which is how arity constraints
//! ("at least two", "exactly one") are expressed upstream.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Mul, Sub};

use rustc_hash::FxHasher;

use crate::cell::Cell;
use crate::error::{CellError, CellResult};
use crate::input::CellInput;

/// Cell over the interval-intersection lattice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalCell {
    low: f64,
    high: f64,
}

impl IntervalCell {
    /// Interval restricted to `[low, high]`.
    ///
    /// Fails when `high < low`.
    pub fn new(low: f64, high: f64) -> CellResult<Self> {
        if high < low {
            return Err(CellError::construction(
                "IntervalCell",
                format!("high {high} below low {low}"),
            ));
        }
        Ok(IntervalCell { low, high })
    }

    /// Degenerate interval `[x, x]`.
    #[inline]
    pub fn point(x: f64) -> Self {
        IntervalCell { low: x, high: x }
    }

    /// The unconstrained interval `(-inf, +inf)`.
    #[inline]
    pub fn unconstrained() -> Self {
        IntervalCell {
            low: f64::NEG_INFINITY,
            high: f64::INFINITY,
        }
    }

    /// The non-negative interval `[0, +inf)`, the stem for count-like cells.
    #[inline]
    pub fn non_negative() -> Self {
        IntervalCell {
            low: 0.0,
            high: f64::INFINITY,
        }
    }

    /// Lower bound.
    #[inline]
    pub fn low(&self) -> f64 {
        self.low
    }

    /// Upper bound.
    #[inline]
    pub fn high(&self) -> f64 {
        self.high
    }

    /// `(low, high)` tuple.
    #[inline]
    pub fn bounds(&self) -> (f64, f64) {
        (self.low, self.high)
    }

    /// The single value when the interval is a point.
    pub fn as_point(&self) -> Option<f64> {
        if self.low == self.high {
            Some(self.low)
        } else {
            None
        }
    }

    /// Whether `x` lies within the (inclusive) bounds.
    pub fn contains(&self, x: f64) -> bool {
        self.low <= x && x <= self.high
    }

    /// Number of integer-spaced values in the interval, boundaries inclusive.
    pub fn size(&self) -> f64 {
        (self.high - self.low) + 1.0
    }

    /// Build an interval from a primitive input shape.
    ///
    /// Accepts a number (point interval), a `(low, high)` pair, a numeric
    /// slice (one element makes a point, two are taken as given bounds,
    /// more are folded to their min/max), or an existing interval cell.
    pub fn coerce(input: &CellInput) -> CellResult<Self> {
        match input {
            CellInput::Number(n) => Ok(IntervalCell::point(*n)),
            CellInput::Pair(low, high) => IntervalCell::new(*low, *high),
            CellInput::Numbers(values) => match values.as_slice() {
                [] => Err(CellError::construction("IntervalCell", "empty numeric list")),
                [x] => Ok(IntervalCell::point(*x)),
                [low, high] => IntervalCell::new(*low, *high),
                many => {
                    let low = many.iter().copied().fold(f64::INFINITY, f64::min);
                    let high = many.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    IntervalCell::new(low, high)
                }
            },
            CellInput::Cell(cell) => cell
                .as_interval()
                .copied()
                .ok_or_else(|| CellError::construction("IntervalCell", cell.kind().to_string())),
            other => Err(CellError::construction("IntervalCell", other.shape())),
        }
    }

    /// Narrow the upper bound to at most `bound`, in place.
    pub fn at_most(&mut self, bound: f64) -> CellResult<()> {
        let cap = IntervalCell::new(self.low, bound)?;
        self.merge(&cap)
    }

    /// Narrow the lower bound to at least `bound`, in place.
    pub fn at_least(&mut self, bound: f64) -> CellResult<()> {
        let floor = IntervalCell::new(bound, self.high)?;
        self.merge(&floor)
    }

    /// Apply a binary function over the four corner pairs and keep the
    /// widest resulting bounds.
    pub fn map<F>(self, other: IntervalCell, f: F) -> IntervalCell
    where
        F: Fn(f64, f64) -> f64,
    {
        let corners = [
            f(self.low, other.low),
            f(self.low, other.high),
            f(self.high, other.low),
            f(self.high, other.high),
        ];
        IntervalCell {
            low: corners.iter().copied().fold(f64::INFINITY, f64::min),
            high: corners.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }

    /// Interval division.
    ///
    /// A divisor touching zero at one end yields a half-open result; the
    /// degenerate divisor `[0, 0]` has no meaningful quotient and fails.
    pub fn checked_div(self, other: IntervalCell) -> CellResult<IntervalCell> {
        Ok(self * other.reciprocal()?)
    }

    fn reciprocal(self) -> CellResult<IntervalCell> {
        if self.low == 0.0 && self.high == 0.0 {
            return Err(CellError::construction(
                "IntervalCell",
                "cannot divide by [0, 0]",
            ));
        }
        if self.high == 0.0 {
            return Ok(IntervalCell {
                low: f64::NEG_INFINITY,
                high: 1.0 / self.low,
            });
        }
        if self.low == 0.0 {
            return Ok(IntervalCell {
                low: 1.0 / self.high,
                high: f64::INFINITY,
            });
        }
        let (a, b) = (1.0 / self.low, 1.0 / self.high);
        Ok(IntervalCell {
            low: a.min(b),
            high: a.max(b),
        })
    }

    /// Absolute value; for a spread, the magnitudes of the two bounds.
    pub fn abs(self) -> IntervalCell {
        let (a, b) = (self.low.abs(), self.high.abs());
        IntervalCell {
            low: a.min(b),
            high: a.max(b),
        }
    }
}

impl Default for IntervalCell {
    fn default() -> Self {
        IntervalCell::unconstrained()
    }
}

impl Cell for IntervalCell {
    fn merge(&mut self, other: &Self) -> CellResult<()> {
        if self.is_equal(other) || other.is_entailed_by(self) {
            return Ok(());
        }
        if self.is_entailed_by(other) {
            self.low = other.low;
            self.high = other.high;
            return Ok(());
        }
        if self.is_contradictory(other) {
            return Err(CellError::contradiction(format!(
                "cannot merge [{:.2}, {:.2}] with [{:.2}, {:.2}]",
                self.low, self.high, other.low, other.high
            )));
        }
        // information in both: intersect
        self.low = self.low.max(other.low);
        self.high = self.high.min(other.high);
        Ok(())
    }

    fn is_equal(&self, other: &Self) -> bool {
        self.low == other.low && self.high == other.high
    }

    fn is_entailed_by(&self, other: &Self) -> bool {
        other.low >= self.low && other.high <= self.high
    }

    fn is_contradictory(&self, other: &Self) -> bool {
        self.low.max(other.low) > self.high.min(other.high)
    }

    fn stem(&self) -> Self {
        IntervalCell::non_negative()
    }

    fn content_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.low.to_bits().hash(&mut hasher);
        self.high.to_bits().hash(&mut hasher);
        hasher.finish()
    }
}

// ============================================================================
// Interval arithmetic
// ============================================================================

impl Add for IntervalCell {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        IntervalCell {
            low: self.low + rhs.low,
            high: self.high + rhs.high,
        }
    }
}

impl Add<f64> for IntervalCell {
    type Output = Self;

    fn add(self, rhs: f64) -> Self::Output {
        self + IntervalCell::point(rhs)
    }
}

impl Sub for IntervalCell {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        IntervalCell {
            low: self.low - rhs.high,
            high: self.high - rhs.low,
        }
    }
}

impl Sub<f64> for IntervalCell {
    type Output = Self;

    fn sub(self, rhs: f64) -> Self::Output {
        self - IntervalCell::point(rhs)
    }
}

impl Mul for IntervalCell {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.map(rhs, |a, b| a * b)
    }
}

impl Mul<f64> for IntervalCell {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        self * IntervalCell::point(rhs)
    }
}

impl fmt::Display for IntervalCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.low == self.high {
            write!(f, "{:.2}", self.low)
        } else {
            write!(f, "[{:.2}, {:.2}]", self.low, self.high)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-10;

    fn assert_approx(a: f64, b: f64, msg: &str) {
        assert!((a - b).abs() < EPSILON, "{}: {} != {}", msg, a, b);
    }

    fn iv(low: f64, high: f64) -> IntervalCell {
        IntervalCell::new(low, high).unwrap()
    }

    #[test]
    fn construction() {
        let cell = iv(2.0, 8.0);
        assert_eq!(cell.bounds(), (2.0, 8.0));
        assert!(IntervalCell::new(8.0, 2.0).is_err());
        assert_eq!(IntervalCell::default(), IntervalCell::unconstrained());
        assert_eq!(cell.stem(), IntervalCell::non_negative());
    }

    #[test]
    fn coercion_shapes() {
        assert_eq!(
            IntervalCell::coerce(&CellInput::from(4)).unwrap(),
            IntervalCell::point(4.0)
        );
        assert_eq!(
            IntervalCell::coerce(&(2.0, 8.0).into()).unwrap(),
            iv(2.0, 8.0)
        );
        assert_eq!(
            IntervalCell::coerce(&CellInput::Numbers(vec![7.0])).unwrap(),
            IntervalCell::point(7.0)
        );
        // longer lists fold to min/max
        assert_eq!(
            IntervalCell::coerce(&CellInput::Numbers(vec![3.0, 9.0, 1.0, 4.0])).unwrap(),
            iv(1.0, 9.0)
        );
        assert!(IntervalCell::coerce(&CellInput::Numbers(vec![])).is_err());
        assert!(IntervalCell::coerce(&CellInput::from("four")).is_err());
    }

    #[test]
    fn merge_narrows_to_intersection() {
        let mut cell = iv(0.0, 10.0);
        cell.merge(&iv(5.0, 20.0)).unwrap();
        assert_eq!(cell, iv(5.0, 10.0));
    }

    #[test]
    fn merge_adopts_tighter_operand() {
        let mut cell = iv(0.0, 10.0);
        cell.merge(&iv(2.0, 3.0)).unwrap();
        assert_eq!(cell, iv(2.0, 3.0));

        // a wider operand adds nothing
        let mut cell = iv(2.0, 3.0);
        cell.merge(&iv(0.0, 10.0)).unwrap();
        assert_eq!(cell, iv(2.0, 3.0));
    }

    #[test]
    fn disjoint_merge_is_contradiction() {
        let mut cell = iv(0.0, 2.0);
        let err = cell.merge(&iv(5.0, 8.0)).unwrap_err();
        assert!(err.is_contradiction());
        assert!(err.to_string().contains("cannot merge"));
        // the receiver is untouched by a failed merge
        assert_eq!(cell, iv(0.0, 2.0));
    }

    #[test]
    fn entailment_direction() {
        let wide = iv(0.0, 10.0);
        let narrow = iv(3.0, 4.0);
        assert!(wide.is_entailed_by(&narrow));
        assert!(!narrow.is_entailed_by(&wide));
        assert!(narrow.entails(&wide));
        assert!(wide.is_entailed_by(&wide));
        assert!(!wide.is_contradictory(&narrow));
    }

    #[test]
    fn one_sided_narrowing() {
        let mut cell = IntervalCell::non_negative();
        cell.at_least(2.0).unwrap();
        assert_eq!(cell, iv(2.0, f64::INFINITY));
        cell.at_most(5.0).unwrap();
        assert_eq!(cell, iv(2.0, 5.0));
        // a cap below the current lower bound cannot be expressed
        assert!(cell.at_most(1.0).is_err());
    }

    #[test]
    fn arithmetic() {
        assert_eq!(iv(1.0, 2.0) + iv(10.0, 20.0), iv(11.0, 22.0));
        assert_eq!(iv(10.0, 20.0) - iv(1.0, 2.0), iv(8.0, 19.0));
        // corner rule picks up sign flips
        assert_eq!(iv(-2.0, 3.0) * iv(4.0, 5.0), iv(-10.0, 15.0));
        assert_eq!(IntervalCell::point(6.0) + 1.0, IntervalCell::point(7.0));
        assert_eq!(iv(1.0, 2.0) * 3.0, iv(3.0, 6.0));
    }

    #[test]
    fn division_edges() {
        let point = IntervalCell::point(10.0)
            .checked_div(IntervalCell::point(4.0))
            .unwrap();
        assert_approx(point.low(), 2.5, "point quotient");
        assert_approx(point.high(), 2.5, "point quotient");

        let quotient = iv(1.0, 2.0).checked_div(iv(2.0, 4.0)).unwrap();
        assert_approx(quotient.low(), 0.25, "interval quotient low");
        assert_approx(quotient.high(), 1.0, "interval quotient high");

        // zero-touching divisors open one side
        let from_zero = iv(1.0, 2.0).checked_div(iv(0.0, 4.0)).unwrap();
        assert_approx(from_zero.low(), 0.25, "zero-low quotient low");
        assert_eq!(from_zero.high(), f64::INFINITY);

        let to_zero = iv(1.0, 2.0).checked_div(iv(-4.0, 0.0)).unwrap();
        assert_eq!(to_zero.low(), f64::NEG_INFINITY);

        assert!(iv(1.0, 2.0).checked_div(IntervalCell::point(0.0)).is_err());
    }

    #[test]
    fn absolute_difference_is_symmetric() {
        let x = iv(1.0, 20.0);
        let y = iv(19.0, 100.0);
        assert_eq!((x - y).abs(), (y - x).abs());

        let x = IntervalCell::point(19.0);
        let y = IntervalCell::point(20.0);
        assert_eq!((x - y).abs(), (y - x).abs());
        assert_eq!((x - y).abs(), IntervalCell::point(1.0));
    }

    #[test]
    fn size_counts_inclusive_bounds() {
        assert_approx(iv(2.0, 5.0).size(), 4.0, "span size");
        assert_approx(IntervalCell::point(3.0).size(), 1.0, "point size");
        assert_eq!(IntervalCell::non_negative().size(), f64::INFINITY);
    }

    #[test]
    fn display_formats() {
        assert_eq!(IntervalCell::point(4.0).to_string(), "4.00");
        assert_eq!(iv(2.0, 8.0).to_string(), "[2.00, 8.00]");
    }

    #[test]
    fn hash_follows_equality() {
        assert_eq!(iv(2.0, 8.0).content_hash(), iv(2.0, 8.0).content_hash());
        assert_ne!(iv(2.0, 8.0).content_hash(), iv(2.0, 9.0).content_hash());
        // bounds feed the hash in order, so equal-sum intervals differ
        assert_ne!(iv(0.0, 3.0).content_hash(), iv(1.0, 2.0).content_hash());
    }

    #[test]
    fn point_accessors() {
        assert_eq!(IntervalCell::point(7.0).as_point(), Some(7.0));
        assert_eq!(iv(1.0, 7.0).as_point(), None);
        assert!(iv(1.0, 7.0).contains(7.0));
        assert!(!iv(1.0, 7.0).contains(7.5));
    }
}
