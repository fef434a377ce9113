//! Prefix lattice over ordered token lists.
//!
//! A `PrefixCell` accumulates an ordered list of tokens. A shorter list is
//! entailed by any list it is a prefix of, so merging extends the receiver
//! with the longer continuation. Lists where neither is a prefix of the
//! other contradict. The empty list asserts nothing.

use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::cell::Cell;
use crate::error::{CellError, CellResult};
use crate::input::CellInput;

/// Cell over the list-prefix lattice.
#[derive(Debug, Clone, Default)]
pub struct PrefixCell {
    value: Vec<String>,
}

impl PrefixCell {
    /// Cell holding the given token sequence.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PrefixCell {
            value: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Cell holding the empty sequence.
    pub fn empty() -> Self {
        PrefixCell { value: Vec::new() }
    }

    /// The accumulated tokens.
    pub fn values(&self) -> &[String] {
        &self.value
    }

    /// Number of accumulated tokens.
    pub fn size(&self) -> usize {
        self.value.len()
    }

    /// Whether nothing has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Append a token to the sequence.
    pub fn push(&mut self, token: impl Into<String>) {
        self.value.push(token.into());
    }

    /// Build a cell from a token, a token list, or an existing prefix cell.
    pub fn coerce(input: &CellInput) -> CellResult<Self> {
        match input {
            CellInput::Token(token) => Ok(PrefixCell::new([token.clone()])),
            CellInput::Tokens(tokens) => Ok(PrefixCell::new(tokens.clone())),
            CellInput::Cell(cell) => cell
                .as_prefix()
                .cloned()
                .ok_or_else(|| CellError::construction("PrefixCell", cell.kind().to_string())),
            other => Err(CellError::construction("PrefixCell", other.shape())),
        }
    }

    fn is_prefix_of(&self, other: &Self) -> bool {
        other.value.len() >= self.value.len() && other.value[..self.value.len()] == self.value[..]
    }
}

impl Cell for PrefixCell {
    fn merge(&mut self, other: &Self) -> CellResult<()> {
        if self.is_equal(other) || other.is_entailed_by(self) {
            return Ok(());
        }
        if self.is_entailed_by(other) {
            self.value = other.value.clone();
            return Ok(());
        }
        // neither is a prefix of the other
        Err(CellError::contradiction(format!(
            "cannot merge list '{}' with '{}'",
            self, other
        )))
    }

    fn is_equal(&self, other: &Self) -> bool {
        self.value == other.value
    }

    fn is_entailed_by(&self, other: &Self) -> bool {
        self.is_prefix_of(other)
    }

    fn is_contradictory(&self, other: &Self) -> bool {
        !self.is_prefix_of(other) && !other.is_prefix_of(self)
    }

    fn stem(&self) -> Self {
        PrefixCell::empty()
    }

    fn content_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.value.hash(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for PrefixCell {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl fmt::Display for PrefixCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.value.join(", "))
    }
}
