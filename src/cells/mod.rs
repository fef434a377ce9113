//! The concrete cell kinds and their runtime dispatch.
//!
//! Each submodule implements one lattice over the shared [`Cell`] contract.
//! [`CellValue`] is the kind-erased wrapper that lets heterogeneous cells
//! live side by side inside a [`DictCell`] and flow through keypath-driven
//! merges: same-kind operations dispatch to the inner cell, cross-kind
//! merges fail structurally, and cross-kind comparisons are simply false.

pub mod boolean;
pub mod dict;
pub mod interval;
pub mod linear;
pub mod prefix;
pub mod sets;
pub mod strings;

pub use boolean::{BoolCell, Truth};
pub use dict::DictCell;
pub use interval::IntervalCell;
pub use linear::LinearOrderedCell;
pub use prefix::PrefixCell;
pub use sets::{set_domain, SetDomain, SetIntersectionCell, SetUnionCell};
pub use strings::{is_subsequence, StringCell};

use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use serde_json::{json, Value};

use crate::cell::Cell;
use crate::error::{CellError, CellResult};
use crate::input::CellInput;
use crate::taxonomy::PartialOrderedCell;

/// A cell of any kind.
///
/// Comparisons across kinds are always false and merges across kinds are
/// structural errors; within a kind, every operation forwards to the
/// wrapped cell.
#[derive(Debug, Clone)]
pub enum CellValue {
    Bool(BoolCell),
    Interval(IntervalCell),
    Text(StringCell),
    Linear(LinearOrderedCell),
    Prefix(PrefixCell),
    SetIntersection(SetIntersectionCell),
    SetUnion(SetUnionCell),
    PartialOrder(PartialOrderedCell),
    Dict(DictCell),
}

impl CellValue {
    /// Name of the wrapped kind, as used in error reports.
    pub fn kind(&self) -> &'static str {
        match self {
            CellValue::Bool(_) => "BoolCell",
            CellValue::Interval(_) => "IntervalCell",
            CellValue::Text(_) => "StringCell",
            CellValue::Linear(_) => "LinearOrderedCell",
            CellValue::Prefix(_) => "PrefixCell",
            CellValue::SetIntersection(_) => "SetIntersectionCell",
            CellValue::SetUnion(_) => "SetUnionCell",
            CellValue::PartialOrder(_) => "PartialOrderedCell",
            CellValue::Dict(_) => "DictCell",
        }
    }

    pub fn as_bool(&self) -> Option<&BoolCell> {
        match self {
            CellValue::Bool(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn as_interval(&self) -> Option<&IntervalCell> {
        match self {
            CellValue::Interval(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&StringCell> {
        match self {
            CellValue::Text(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn as_linear(&self) -> Option<&LinearOrderedCell> {
        match self {
            CellValue::Linear(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn as_prefix(&self) -> Option<&PrefixCell> {
        match self {
            CellValue::Prefix(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn as_set_intersection(&self) -> Option<&SetIntersectionCell> {
        match self {
            CellValue::SetIntersection(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn as_set_union(&self) -> Option<&SetUnionCell> {
        match self {
            CellValue::SetUnion(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn as_partial_order(&self) -> Option<&PartialOrderedCell> {
        match self {
            CellValue::PartialOrder(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&DictCell> {
        match self {
            CellValue::Dict(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut DictCell> {
        match self {
            CellValue::Dict(cell) => Some(cell),
            _ => None,
        }
    }

    /// Build a cell of this cell's kind (and domain, for finite-domain
    /// kinds) from an input value.
    ///
    /// This is how a keypath merge turns raw input into something the cell
    /// already at that path can absorb. Structures only accept structures.
    pub fn coerce_like(&self, input: &CellInput) -> CellResult<CellValue> {
        match self {
            CellValue::Bool(_) => BoolCell::coerce(input).map(CellValue::from),
            CellValue::Interval(_) => IntervalCell::coerce(input).map(CellValue::from),
            CellValue::Text(_) => StringCell::coerce(input).map(CellValue::from),
            CellValue::Linear(cell) => cell.coerce(input).map(CellValue::from),
            CellValue::Prefix(_) => PrefixCell::coerce(input).map(CellValue::from),
            CellValue::SetIntersection(cell) => cell.coerce(input).map(CellValue::from),
            CellValue::SetUnion(cell) => cell.coerce(input).map(CellValue::from),
            CellValue::PartialOrder(cell) => cell.coerce(input).map(CellValue::from),
            CellValue::Dict(_) => match input {
                CellInput::Cell(CellValue::Dict(dict)) => Ok(CellValue::Dict(dict.clone())),
                CellInput::Cell(other) => {
                    Err(CellError::construction("DictCell", other.kind().to_string()))
                }
                other => Err(CellError::construction("DictCell", other.shape())),
            },
        }
    }

    /// JSON rendering of the current information state.
    ///
    /// Unbounded interval endpoints serialize as `null`.
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Bool(cell) => match cell.value() {
                Truth::True => json!(true),
                Truth::False => json!(false),
                Truth::Unknown => Value::Null,
            },
            CellValue::Interval(cell) => match cell.as_point() {
                Some(point) => json!(point),
                None => json!([cell.low(), cell.high()]),
            },
            CellValue::Text(cell) => match cell.value() {
                Some(value) => json!(value),
                None => Value::Null,
            },
            CellValue::Linear(cell) => json!([cell.low(), cell.high()]),
            CellValue::Prefix(cell) => json!(cell.values()),
            CellValue::SetIntersection(cell) => json!(cell.members()),
            CellValue::SetUnion(cell) => json!(cell.members()),
            CellValue::PartialOrder(cell) => json!({
                "upper": cell.upper(),
                "lower": cell.lower(),
            }),
            CellValue::Dict(cell) => cell.to_json(),
        }
    }
}

impl Cell for CellValue {
    fn merge(&mut self, other: &Self) -> CellResult<()> {
        match (self, other) {
            (CellValue::Bool(a), CellValue::Bool(b)) => a.merge(b),
            (CellValue::Interval(a), CellValue::Interval(b)) => a.merge(b),
            (CellValue::Text(a), CellValue::Text(b)) => a.merge(b),
            (CellValue::Linear(a), CellValue::Linear(b)) => a.merge(b),
            (CellValue::Prefix(a), CellValue::Prefix(b)) => a.merge(b),
            (CellValue::SetIntersection(a), CellValue::SetIntersection(b)) => a.merge(b),
            (CellValue::SetUnion(a), CellValue::SetUnion(b)) => a.merge(b),
            (CellValue::PartialOrder(a), CellValue::PartialOrder(b)) => a.merge(b),
            (CellValue::Dict(a), CellValue::Dict(b)) => a.merge(b),
            (a, b) => Err(CellError::KindMismatch {
                expected: a.kind(),
                found: b.kind(),
            }),
        }
    }

    fn is_equal(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Bool(a), CellValue::Bool(b)) => a.is_equal(b),
            (CellValue::Interval(a), CellValue::Interval(b)) => a.is_equal(b),
            (CellValue::Text(a), CellValue::Text(b)) => a.is_equal(b),
            (CellValue::Linear(a), CellValue::Linear(b)) => a.is_equal(b),
            (CellValue::Prefix(a), CellValue::Prefix(b)) => a.is_equal(b),
            (CellValue::SetIntersection(a), CellValue::SetIntersection(b)) => a.is_equal(b),
            (CellValue::SetUnion(a), CellValue::SetUnion(b)) => a.is_equal(b),
            (CellValue::PartialOrder(a), CellValue::PartialOrder(b)) => a.is_equal(b),
            (CellValue::Dict(a), CellValue::Dict(b)) => a.is_equal(b),
            _ => false,
        }
    }

    fn is_entailed_by(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Bool(a), CellValue::Bool(b)) => a.is_entailed_by(b),
            (CellValue::Interval(a), CellValue::Interval(b)) => a.is_entailed_by(b),
            (CellValue::Text(a), CellValue::Text(b)) => a.is_entailed_by(b),
            (CellValue::Linear(a), CellValue::Linear(b)) => a.is_entailed_by(b),
            (CellValue::Prefix(a), CellValue::Prefix(b)) => a.is_entailed_by(b),
            (CellValue::SetIntersection(a), CellValue::SetIntersection(b)) => {
                a.is_entailed_by(b)
            }
            (CellValue::SetUnion(a), CellValue::SetUnion(b)) => a.is_entailed_by(b),
            (CellValue::PartialOrder(a), CellValue::PartialOrder(b)) => a.is_entailed_by(b),
            (CellValue::Dict(a), CellValue::Dict(b)) => a.is_entailed_by(b),
            _ => false,
        }
    }

    fn is_contradictory(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Bool(a), CellValue::Bool(b)) => a.is_contradictory(b),
            (CellValue::Interval(a), CellValue::Interval(b)) => a.is_contradictory(b),
            (CellValue::Text(a), CellValue::Text(b)) => a.is_contradictory(b),
            (CellValue::Linear(a), CellValue::Linear(b)) => a.is_contradictory(b),
            (CellValue::Prefix(a), CellValue::Prefix(b)) => a.is_contradictory(b),
            (CellValue::SetIntersection(a), CellValue::SetIntersection(b)) => {
                a.is_contradictory(b)
            }
            (CellValue::SetUnion(a), CellValue::SetUnion(b)) => a.is_contradictory(b),
            (CellValue::PartialOrder(a), CellValue::PartialOrder(b)) => a.is_contradictory(b),
            (CellValue::Dict(a), CellValue::Dict(b)) => a.is_contradictory(b),
            // different kinds carry unrelated information
            _ => false,
        }
    }

    fn stem(&self) -> Self {
        match self {
            CellValue::Bool(cell) => CellValue::Bool(cell.stem()),
            CellValue::Interval(cell) => CellValue::Interval(cell.stem()),
            CellValue::Text(cell) => CellValue::Text(cell.stem()),
            CellValue::Linear(cell) => CellValue::Linear(cell.stem()),
            CellValue::Prefix(cell) => CellValue::Prefix(cell.stem()),
            CellValue::SetIntersection(cell) => CellValue::SetIntersection(cell.stem()),
            CellValue::SetUnion(cell) => CellValue::SetUnion(cell.stem()),
            CellValue::PartialOrder(cell) => CellValue::PartialOrder(cell.stem()),
            CellValue::Dict(cell) => CellValue::Dict(cell.stem()),
        }
    }

    fn content_hash(&self) -> u64 {
        let inner = match self {
            CellValue::Bool(cell) => cell.content_hash(),
            CellValue::Interval(cell) => cell.content_hash(),
            CellValue::Text(cell) => cell.content_hash(),
            CellValue::Linear(cell) => cell.content_hash(),
            CellValue::Prefix(cell) => cell.content_hash(),
            CellValue::SetIntersection(cell) => cell.content_hash(),
            CellValue::SetUnion(cell) => cell.content_hash(),
            CellValue::PartialOrder(cell) => cell.content_hash(),
            CellValue::Dict(cell) => cell.content_hash(),
        };
        // the kind participates so that, say, an empty prefix and an empty
        // string cannot collide
        let mut hasher = FxHasher::default();
        self.kind().hash(&mut hasher);
        inner.hash(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Bool(cell) => cell.fmt(f),
            CellValue::Interval(cell) => cell.fmt(f),
            CellValue::Text(cell) => cell.fmt(f),
            CellValue::Linear(cell) => cell.fmt(f),
            CellValue::Prefix(cell) => cell.fmt(f),
            CellValue::SetIntersection(cell) => cell.fmt(f),
            CellValue::SetUnion(cell) => cell.fmt(f),
            CellValue::PartialOrder(cell) => cell.fmt(f),
            CellValue::Dict(cell) => cell.fmt(f),
        }
    }
}

impl From<BoolCell> for CellValue {
    fn from(cell: BoolCell) -> Self {
        CellValue::Bool(cell)
    }
}

impl From<IntervalCell> for CellValue {
    fn from(cell: IntervalCell) -> Self {
        CellValue::Interval(cell)
    }
}

impl From<StringCell> for CellValue {
    fn from(cell: StringCell) -> Self {
        CellValue::Text(cell)
    }
}

impl From<LinearOrderedCell> for CellValue {
    fn from(cell: LinearOrderedCell) -> Self {
        CellValue::Linear(cell)
    }
}

impl From<PrefixCell> for CellValue {
    fn from(cell: PrefixCell) -> Self {
        CellValue::Prefix(cell)
    }
}

impl From<SetIntersectionCell> for CellValue {
    fn from(cell: SetIntersectionCell) -> Self {
        CellValue::SetIntersection(cell)
    }
}

impl From<SetUnionCell> for CellValue {
    fn from(cell: SetUnionCell) -> Self {
        CellValue::SetUnion(cell)
    }
}

impl From<PartialOrderedCell> for CellValue {
    fn from(cell: PartialOrderedCell) -> Self {
        CellValue::PartialOrder(cell)
    }
}

impl From<DictCell> for CellValue {
    fn from(cell: DictCell) -> Self {
        CellValue::Dict(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_kind_merges_fail_structurally() {
        let mut interval = CellValue::from(IntervalCell::point(3.0));
        let flag = CellValue::from(BoolCell::new(Truth::True));
        let err = interval.merge(&flag).unwrap_err();
        assert!(matches!(err, CellError::KindMismatch { .. }));
        assert!(!err.is_contradiction());
    }

    #[test]
    fn cross_kind_comparisons_are_false() {
        let interval = CellValue::from(IntervalCell::point(3.0));
        let text = CellValue::from(StringCell::new("three"));
        assert!(!interval.is_equal(&text));
        assert!(!interval.is_entailed_by(&text));
        assert!(!interval.is_contradictory(&text));
    }

    #[test]
    fn same_kind_merges_dispatch() {
        let mut value = CellValue::from(IntervalCell::new(0.0, 10.0).unwrap());
        value
            .merge(&CellValue::from(IntervalCell::new(3.0, 6.0).unwrap()))
            .unwrap();
        assert_eq!(value.as_interval().unwrap().bounds(), (3.0, 6.0));
    }

    #[test]
    fn hash_separates_kinds() {
        let empty_text = CellValue::from(StringCell::empty());
        let empty_prefix = CellValue::from(PrefixCell::empty());
        assert_ne!(empty_text.content_hash(), empty_prefix.content_hash());
    }

    #[test]
    fn coercion_follows_the_receiver_kind() {
        let interval = CellValue::from(IntervalCell::unconstrained());
        let coerced = interval.coerce_like(&CellInput::from(4.0)).unwrap();
        assert_eq!(coerced.as_interval().unwrap().as_point(), Some(4.0));

        let text = CellValue::from(StringCell::empty());
        let coerced = text.coerce_like(&CellInput::from("red")).unwrap();
        assert_eq!(coerced.as_string().unwrap().value(), Some("red"));

        // structures only accept structures
        let dict = CellValue::from(DictCell::new());
        assert!(dict.coerce_like(&CellInput::from(4.0)).is_err());
        assert!(dict
            .coerce_like(&CellInput::from(CellValue::from(DictCell::new())))
            .is_ok());
    }

    #[test]
    fn stem_preserves_kind() {
        let value = CellValue::from(StringCell::new("word"));
        let stem = value.stem();
        assert_eq!(stem.kind(), "StringCell");
        assert!(stem.as_string().unwrap().is_empty());
    }

    #[test]
    fn json_rendering() {
        let point = CellValue::from(IntervalCell::point(3.0));
        assert_eq!(point.to_json(), json!(3.0));

        let range = CellValue::from(IntervalCell::new(1.0, 2.0).unwrap());
        assert_eq!(range.to_json(), json!([1.0, 2.0]));

        let dict = CellValue::from(DictCell::from_pairs([(
            "color",
            CellValue::from(StringCell::new("red")),
        )]));
        assert_eq!(dict.to_json(), json!({ "color": "red" }));
    }
}
