//! Loosely typed input accepted by cell coercion.
//!
//! Callers rarely hold a ready-made cell when asserting a constraint; they
//! hold a number, a string token, or a small collection. [`CellInput`] is
//! the closed set of primitive shapes every `coerce` constructor accepts,
//! with `From` conversions so call sites can pass plain Rust values:
//!
//! ```
//! use beliefs::{CellInput, IntervalCell};
//!
//! let exact = IntervalCell::coerce(&CellInput::from(4))?;
//! let range = IntervalCell::coerce(&(2.0, 8.0).into())?;
//! # Ok::<(), beliefs::CellError>(())
//! ```
//!
//! Which shapes a given kind accepts is that kind's business: an interval
//! reads numbers and numeric slices, a set cell reads member tokens, a
//! taxonomy cell reads a category token. Anything else is a construction
//! error.

use crate::cells::CellValue;

/// A primitive shape convertible into a cell of some kind.
#[derive(Debug, Clone, PartialEq)]
pub enum CellInput {
    /// A single number: a point interval, or a truth value (`1`, `0`, `-1`).
    Number(f64),
    /// An explicit `(low, high)` pair.
    Pair(f64, f64),
    /// A numeric collection; one element is a point, two are bounds, more
    /// are reduced to their min/max.
    Numbers(Vec<f64>),
    /// A boolean truth value.
    Bool(bool),
    /// A string: a string value, a set member, a taxonomy category, or a
    /// symbol of a linear order.
    Token(String),
    /// Several string tokens: set members, linear-order symbols, or a
    /// prefix list.
    Tokens(Vec<String>),
    /// An already constructed cell, passed through after a kind/domain
    /// check.
    Cell(CellValue),
}

impl CellInput {
    /// Short shape name used in construction-error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            CellInput::Number(_) => "number",
            CellInput::Pair(..) => "pair",
            CellInput::Numbers(_) => "numbers",
            CellInput::Bool(_) => "bool",
            CellInput::Token(_) => "token",
            CellInput::Tokens(_) => "tokens",
            CellInput::Cell(_) => "cell",
        }
    }
}

impl From<f64> for CellInput {
    fn from(value: f64) -> Self {
        CellInput::Number(value)
    }
}

impl From<i64> for CellInput {
    fn from(value: i64) -> Self {
        CellInput::Number(value as f64)
    }
}

impl From<i32> for CellInput {
    fn from(value: i32) -> Self {
        CellInput::Number(value as f64)
    }
}

impl From<usize> for CellInput {
    fn from(value: usize) -> Self {
        CellInput::Number(value as f64)
    }
}

impl From<(f64, f64)> for CellInput {
    fn from((low, high): (f64, f64)) -> Self {
        CellInput::Pair(low, high)
    }
}

impl From<&[f64]> for CellInput {
    fn from(values: &[f64]) -> Self {
        CellInput::Numbers(values.to_vec())
    }
}

impl From<bool> for CellInput {
    fn from(value: bool) -> Self {
        CellInput::Bool(value)
    }
}

impl From<&str> for CellInput {
    fn from(value: &str) -> Self {
        CellInput::Token(value.to_owned())
    }
}

impl From<String> for CellInput {
    fn from(value: String) -> Self {
        CellInput::Token(value)
    }
}

impl From<Vec<String>> for CellInput {
    fn from(values: Vec<String>) -> Self {
        CellInput::Tokens(values)
    }
}

impl From<Vec<&str>> for CellInput {
    fn from(values: Vec<&str>) -> Self {
        CellInput::Tokens(values.into_iter().map(str::to_owned).collect())
    }
}

impl From<CellValue> for CellInput {
    fn from(value: CellValue) -> Self {
        CellInput::Cell(value)
    }
}
