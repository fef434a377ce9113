//! String lattice ordered by subsequence containment.
//!
//! Values are stored lowercased and trimmed. A string is entailed by any
//! string that contains its characters in order (not necessarily adjacent),
//! so `"word"` is entailed by `"words"` and `"wrd"` by `"word"`. Strings
//! where neither direction holds contradict. The empty cell asserts nothing
//! and is compatible with everything.

use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::cell::Cell;
use crate::error::{CellError, CellResult};
use crate::input::CellInput;

/// Whether the characters of `needle` appear in order within `haystack`.
pub fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut chars = needle.chars().peekable();
    for c in haystack.chars() {
        match chars.peek() {
            Some(&next) if next == c => {
                chars.next();
            }
            Some(_) => {}
            None => return true,
        }
    }
    chars.peek().is_none()
}

/// Cell over the subsequence-containment lattice.
#[derive(Debug, Clone, Default)]
pub struct StringCell {
    value: Option<String>,
}

impl StringCell {
    /// Cell holding the normalized form of `value`; a blank string makes an
    /// empty cell.
    pub fn new(value: &str) -> Self {
        let normalized = value.trim().to_lowercase();
        StringCell {
            value: (!normalized.is_empty()).then_some(normalized),
        }
    }

    /// Cell asserting nothing.
    pub fn empty() -> Self {
        StringCell { value: None }
    }

    /// The held string, if any.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Whether nothing has been asserted.
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Build a cell from a string token or an existing string cell.
    pub fn coerce(input: &CellInput) -> CellResult<Self> {
        match input {
            CellInput::Token(token) => Ok(StringCell::new(token)),
            CellInput::Cell(cell) => cell
                .as_string()
                .cloned()
                .ok_or_else(|| CellError::construction("StringCell", cell.kind().to_string())),
            other => Err(CellError::construction("StringCell", other.shape())),
        }
    }
}

impl From<&str> for StringCell {
    fn from(value: &str) -> Self {
        StringCell::new(value)
    }
}

impl Cell for StringCell {
    fn merge(&mut self, other: &Self) -> CellResult<()> {
        if other.is_entailed_by(self) {
            return Ok(());
        }
        if self.is_entailed_by(other) {
            self.value = other.value.clone();
            return Ok(());
        }
        // neither direction holds, so the strings contradict
        Err(CellError::contradiction(format!(
            "cannot merge string '{}' with '{}'",
            self, other
        )))
    }

    fn is_equal(&self, other: &Self) -> bool {
        self.value == other.value
    }

    fn is_entailed_by(&self, other: &Self) -> bool {
        match (&self.value, &other.value) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(own), Some(theirs)) => is_subsequence(own, theirs),
        }
    }

    fn is_contradictory(&self, other: &Self) -> bool {
        match (&self.value, &other.value) {
            (Some(own), Some(theirs)) => {
                !is_subsequence(own, theirs) && !is_subsequence(theirs, own)
            }
            // an empty side never contradicts
            _ => false,
        }
    }

    fn stem(&self) -> Self {
        StringCell::empty()
    }

    fn content_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.value.hash(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for StringCell {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl fmt::Display for StringCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value.as_deref().unwrap_or(""))
    }
}
