//! Three-valued boolean lattice.
//!
//! `Unknown` is the bottom element: it asserts nothing and merges with
//! anything. `True` and `False` are the two maximal elements and are
//! mutually contradictory. There is no "both" element; conflicting
//! assertions are a contradiction, not a new state.

use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::cell::Cell;
use crate::error::{CellError, CellResult};
use crate::input::CellInput;

/// A truth value with an explicit "nothing asserted yet" state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Truth {
    /// Asserted true.
    True,
    /// Asserted false.
    False,
    /// No assertion either way; the merge identity.
    Unknown,
}

impl fmt::Display for Truth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Truth::True => write!(f, "true"),
            Truth::False => write!(f, "false"),
            Truth::Unknown => write!(f, "unknown"),
        }
    }
}

impl From<bool> for Truth {
    fn from(value: bool) -> Self {
        if value {
            Truth::True
        } else {
            Truth::False
        }
    }
}

/// Cell over the three-valued boolean lattice.
#[derive(Debug, Clone, Copy)]
pub struct BoolCell {
    value: Truth,
}

impl BoolCell {
    /// Cell asserting the given truth value.
    pub fn new(value: Truth) -> Self {
        BoolCell { value }
    }

    /// Cell asserting nothing.
    pub fn unknown() -> Self {
        BoolCell {
            value: Truth::Unknown,
        }
    }

    /// Current truth value.
    pub fn value(&self) -> Truth {
        self.value
    }

    /// Whether a definite value has been asserted.
    pub fn is_defined(&self) -> bool {
        self.value != Truth::Unknown
    }

    /// Build a cell from a primitive input shape.
    ///
    /// Accepts booleans, the numbers `1` (true), `0` and `-1` (false), the
    /// token `"unknown"` (case-insensitive), and existing boolean cells.
    pub fn coerce(input: &CellInput) -> CellResult<Self> {
        match input {
            CellInput::Bool(b) => Ok(BoolCell::new(Truth::from(*b))),
            CellInput::Number(n) if *n == 1.0 => Ok(BoolCell::new(Truth::True)),
            CellInput::Number(n) if *n == 0.0 || *n == -1.0 => Ok(BoolCell::new(Truth::False)),
            CellInput::Token(t) if t.eq_ignore_ascii_case("unknown") => Ok(BoolCell::unknown()),
            CellInput::Cell(cell) => cell
                .as_bool()
                .copied()
                .ok_or_else(|| CellError::construction("BoolCell", cell.kind().to_string())),
            other => Err(CellError::construction("BoolCell", other.shape())),
        }
    }
}

impl Default for BoolCell {
    fn default() -> Self {
        BoolCell::unknown()
    }
}

impl From<bool> for BoolCell {
    fn from(value: bool) -> Self {
        BoolCell::new(Truth::from(value))
    }
}

impl Cell for BoolCell {
    fn merge(&mut self, other: &Self) -> CellResult<()> {
        if self.is_equal(other) || other.value == Truth::Unknown {
            return Ok(());
        }
        if self.value == Truth::Unknown {
            self.value = other.value;
            return Ok(());
        }
        Err(CellError::contradiction(format!(
            "cannot merge {} with {}",
            self.value, other.value
        )))
    }

    fn is_equal(&self, other: &Self) -> bool {
        self.value == other.value
    }

    fn is_entailed_by(&self, other: &Self) -> bool {
        self.value == Truth::Unknown || self.value == other.value
    }

    fn is_contradictory(&self, other: &Self) -> bool {
        self.is_defined() && other.is_defined() && self.value != other.value
    }

    fn stem(&self) -> Self {
        BoolCell::unknown()
    }

    fn content_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.value.hash(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for BoolCell {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl fmt::Display for BoolCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_is_merge_identity() {
        let mut cell = BoolCell::new(Truth::True);
        cell.merge(&BoolCell::unknown()).unwrap();
        assert_eq!(cell.value(), Truth::True);

        let mut cell = BoolCell::unknown();
        cell.merge(&BoolCell::new(Truth::False)).unwrap();
        assert_eq!(cell.value(), Truth::False);
    }

    #[test]
    fn defined_values_contradict() {
        let yes = BoolCell::new(Truth::True);
        let no = BoolCell::new(Truth::False);
        assert!(yes.is_contradictory(&no));
        assert!(no.is_contradictory(&yes));

        let mut cell = yes;
        let err = cell.merge(&no).unwrap_err();
        assert!(err.is_contradiction());
        // the receiver is untouched by a failed merge
        assert_eq!(cell.value(), Truth::True);
    }

    #[test]
    fn entailment_direction() {
        let yes = BoolCell::new(Truth::True);
        let no = BoolCell::new(Truth::False);
        let unknown = BoolCell::unknown();

        assert!(unknown.is_entailed_by(&yes));
        assert!(unknown.is_entailed_by(&no));
        assert!(unknown.is_entailed_by(&unknown));
        assert!(!yes.is_entailed_by(&unknown));
        assert!(yes.entails(&unknown));
        assert!(!unknown.entails(&yes));
        assert!(yes.is_entailed_by(&yes));
    }

    #[test]
    fn coercion_shapes() {
        assert_eq!(
            BoolCell::coerce(&CellInput::from(1)).unwrap().value(),
            Truth::True
        );
        assert_eq!(
            BoolCell::coerce(&CellInput::from(0)).unwrap().value(),
            Truth::False
        );
        assert_eq!(
            BoolCell::coerce(&CellInput::from(-1)).unwrap().value(),
            Truth::False
        );
        assert_eq!(
            BoolCell::coerce(&CellInput::from(true)).unwrap().value(),
            Truth::True
        );
        assert_eq!(
            BoolCell::coerce(&CellInput::from("Unknown")).unwrap().value(),
            Truth::Unknown
        );
        assert!(BoolCell::coerce(&CellInput::from("maybe")).is_err());
    }

    #[test]
    fn hash_follows_equality() {
        let a = BoolCell::new(Truth::True);
        let b = BoolCell::from(true);
        assert_eq!(a, b);
        assert_eq!(a.content_hash(), b.content_hash());
        assert_ne!(
            a.content_hash(),
            BoolCell::new(Truth::False).content_hash()
        );
    }
}
