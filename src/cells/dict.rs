//! Recursive key/value composite of cells.
//!
//! A `DictCell` maps string keys to cells, including nested `DictCell`s, and
//! lifts the cell contract over the whole structure. Information is open
//! world: a key absent from one side never contradicts the other, and a
//! partial-information merge adopts the missing keys. Contradiction and
//! entailment are checked recursively through shared keys before anything is
//! mutated, so a contradictory merge leaves the structure untouched.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::cell::Cell;
use crate::cells::CellValue;
use crate::error::{CellError, CellResult};

/// Composite cell over named slots.
#[derive(Debug, Clone, Default)]
pub struct DictCell {
    slots: BTreeMap<String, CellValue>,
}

impl DictCell {
    /// Empty structure.
    pub fn new() -> Self {
        DictCell::default()
    }

    /// Build a structure from `(key, cell)` pairs.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, CellValue)>,
        K: Into<String>,
    {
        DictCell {
            slots: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        }
    }

    /// Number of top-level slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the structure has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether a top-level key exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Whether a nested keypath resolves. The empty path never does.
    pub fn contains_path<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.value_at_path(path).is_some()
    }

    /// Look up a top-level slot.
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.slots.get(key)
    }

    /// Mutable access to a top-level slot.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut CellValue> {
        self.slots.get_mut(key)
    }

    /// Resolve a nested keypath like `["target", "size"]`.
    pub fn value_at_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&CellValue> {
        let (first, rest) = path.split_first()?;
        let mut current = self.slots.get(first.as_ref())?;
        for key in rest {
            current = current.as_dict()?.get(key.as_ref())?;
        }
        Some(current)
    }

    /// Mutable variant of [`value_at_path`](Self::value_at_path).
    pub fn value_at_path_mut<S: AsRef<str>>(&mut self, path: &[S]) -> Option<&mut CellValue> {
        let (first, rest) = path.split_first()?;
        let mut current = self.slots.get_mut(first.as_ref())?;
        for key in rest {
            current = current.as_dict_mut()?.get_mut(key.as_ref())?;
        }
        Some(current)
    }

    /// Insert a slot directly, replacing and returning any previous cell.
    pub fn insert(&mut self, key: impl Into<String>, value: CellValue) -> Option<CellValue> {
        self.slots.insert(key.into(), value)
    }

    /// Remove a slot.
    pub fn remove(&mut self, key: &str) -> Option<CellValue> {
        self.slots.remove(key)
    }

    /// Merge into an existing slot, or create it when absent.
    pub fn set(&mut self, key: &str, value: &CellValue) -> CellResult<()> {
        match self.slots.get_mut(key) {
            Some(existing) => existing.merge(value),
            None => {
                self.slots.insert(key.to_string(), value.clone());
                Ok(())
            }
        }
    }

    /// Top-level keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Top-level cells, in key order.
    pub fn values(&self) -> impl Iterator<Item = &CellValue> {
        self.slots.values()
    }

    /// Top-level `(key, cell)` pairs, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.slots.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// JSON object mirroring the slot structure.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.slots
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect(),
        )
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        for (i, (key, value)) in self.slots.iter().enumerate() {
            if i != 0 {
                write!(f, "{:indent$}", "")?;
            }
            match value {
                CellValue::Dict(nested) => {
                    write!(f, "{key} : ")?;
                    nested.fmt_indented(f, indent + key.len() + 3)?;
                }
                other => writeln!(f, "{key} : {other}")?,
            }
        }
        Ok(())
    }
}

impl Cell for DictCell {
    fn merge(&mut self, other: &Self) -> CellResult<()> {
        if self.is_equal(other) || other.is_entailed_by(self) {
            return Ok(());
        }
        if self.is_entailed_by(other) {
            self.slots = other.slots.clone();
            return Ok(());
        }
        if self.is_contradictory(other) {
            return Err(CellError::contradiction(
                "cannot merge contradictory structures",
            ));
        }
        // partial information on both sides: merge shared slots, adopt the rest
        for (key, value) in &other.slots {
            match self.slots.get_mut(key) {
                Some(existing) => existing.merge(value)?,
                None => {
                    self.slots.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    fn is_equal(&self, other: &Self) -> bool {
        self.slots.len() == other.slots.len()
            && self
                .slots
                .iter()
                .zip(&other.slots)
                .all(|((key_a, val_a), (key_b, val_b))| key_a == key_b && val_a.is_equal(val_b))
    }

    /// Every slot of `self` must exist in `other` with an entailing cell.
    fn is_entailed_by(&self, other: &Self) -> bool {
        self.slots.iter().all(|(key, value)| {
            other
                .slots
                .get(key)
                .map_or(false, |theirs| theirs.entails(value))
        })
    }

    /// Contradiction needs a shared slot whose cells contradict; missing
    /// slots never conflict.
    fn is_contradictory(&self, other: &Self) -> bool {
        self.slots.iter().any(|(key, value)| {
            other
                .slots
                .get(key)
                .map_or(false, |theirs| value.is_contradictory(theirs))
        })
    }

    fn stem(&self) -> Self {
        DictCell::new()
    }

    fn content_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        for (key, value) in &self.slots {
            key.hash(&mut hasher);
            value.content_hash().hash(&mut hasher);
        }
        hasher.finish()
    }
}

impl PartialEq for DictCell {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl fmt::Display for DictCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
