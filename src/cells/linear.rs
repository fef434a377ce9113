//! Interval lattice over an explicit symbol ordering.
//!
//! A `LinearOrderedCell` generalizes the numeric interval to any finite,
//! totally ordered list of symbols: bounds are positions in the list, and
//! merging narrows the spanned range. Two cells only interact when they
//! share the same domain sequence; the ordering is part of the lattice, so
//! the same symbols in a different order form a different domain.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHasher;

use crate::cell::Cell;
use crate::error::{CellError, CellResult};
use crate::input::CellInput;

/// Cell spanning a contiguous range of an ordered symbol list.
#[derive(Debug, Clone)]
pub struct LinearOrderedCell {
    domain: Arc<Vec<String>>,
    low: usize,
    high: usize,
}

impl LinearOrderedCell {
    /// Cell spanning the entire domain.
    ///
    /// The domain must be nonempty and free of duplicate symbols.
    pub fn over(domain: Arc<Vec<String>>) -> CellResult<Self> {
        if domain.is_empty() {
            return Err(CellError::construction("LinearOrderedCell", "empty domain"));
        }
        for (i, symbol) in domain.iter().enumerate() {
            if domain[..i].contains(symbol) {
                return Err(CellError::construction(
                    "LinearOrderedCell",
                    format!("duplicate domain symbol '{symbol}'"),
                ));
            }
        }
        let high = domain.len() - 1;
        Ok(LinearOrderedCell {
            domain,
            low: 0,
            high,
        })
    }

    /// Cell spanning `[low, high]` within the domain ordering.
    pub fn with_bounds(domain: Arc<Vec<String>>, low: &str, high: &str) -> CellResult<Self> {
        let mut cell = LinearOrderedCell::over(domain)?;
        let low = cell.require_index(low)?;
        let high = cell.require_index(high)?;
        if low > high {
            return Err(CellError::construction(
                "LinearOrderedCell",
                "lower bound above upper bound",
            ));
        }
        cell.low = low;
        cell.high = high;
        Ok(cell)
    }

    /// The ordered domain.
    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    /// Symbol at the lower bound.
    pub fn low(&self) -> &str {
        &self.domain[self.low]
    }

    /// Symbol at the upper bound.
    pub fn high(&self) -> &str {
        &self.domain[self.high]
    }

    /// Position of a symbol in the domain ordering.
    pub fn to_index(&self, symbol: &str) -> Option<usize> {
        self.domain.iter().position(|s| s == symbol)
    }

    fn require_index(&self, symbol: &str) -> CellResult<usize> {
        self.to_index(symbol).ok_or_else(|| CellError::OutOfDomain {
            kind: "LinearOrderedCell".into(),
            value: symbol.into(),
        })
    }

    fn same_domain(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.domain, &other.domain) || self.domain == other.domain
    }

    /// Narrow this cell to one or more symbols of its own domain.
    ///
    /// A single symbol makes a point range; a pair is taken as given bounds;
    /// a longer list is folded to its positional min/max. Unlike the other
    /// cell kinds this is an instance method, because the result inherits
    /// the receiver's domain.
    pub fn coerce(&self, input: &CellInput) -> CellResult<Self> {
        match input {
            CellInput::Token(symbol) => {
                let at = self.require_index(symbol)?;
                Ok(LinearOrderedCell {
                    domain: Arc::clone(&self.domain),
                    low: at,
                    high: at,
                })
            }
            CellInput::Tokens(symbols) => match symbols.as_slice() {
                [] => Err(CellError::construction("LinearOrderedCell", "empty symbol list")),
                [symbol] => self.coerce(&CellInput::Token(symbol.clone())),
                [low, high] => {
                    LinearOrderedCell::with_bounds(Arc::clone(&self.domain), low, high)
                }
                many => {
                    let mut low = self.domain.len() - 1;
                    let mut high = 0;
                    for symbol in many {
                        let at = self.require_index(symbol)?;
                        low = low.min(at);
                        high = high.max(at);
                    }
                    Ok(LinearOrderedCell {
                        domain: Arc::clone(&self.domain),
                        low,
                        high,
                    })
                }
            },
            CellInput::Cell(cell) => match cell.as_linear() {
                Some(linear) if self.same_domain(linear) => Ok(linear.clone()),
                Some(_) => Err(CellError::DomainMismatch {
                    kind: "LinearOrderedCell".into(),
                }),
                None => Err(CellError::construction(
                    "LinearOrderedCell",
                    cell.kind().to_string(),
                )),
            },
            other => Err(CellError::construction("LinearOrderedCell", other.shape())),
        }
    }
}

impl Cell for LinearOrderedCell {
    fn merge(&mut self, other: &Self) -> CellResult<()> {
        if !self.same_domain(other) {
            return Err(CellError::DomainMismatch {
                kind: "LinearOrderedCell".into(),
            });
        }
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
                "cannot merge {} with {}",
                self, other
            )));
        }
        // information in both: intersect the ranges
        self.low = self.low.max(other.low);
        self.high = self.high.min(other.high);
        Ok(())
    }

    fn is_equal(&self, other: &Self) -> bool {
        self.same_domain(other) && self.low == other.low && self.high == other.high
    }

    fn is_entailed_by(&self, other: &Self) -> bool {
        self.same_domain(other) && other.low >= self.low && other.high <= self.high
    }

    fn is_contradictory(&self, other: &Self) -> bool {
        if !self.same_domain(other) {
            return false;
        }
        self.low.max(other.low) > self.high.min(other.high)
    }

    fn stem(&self) -> Self {
        let high = self.domain.len() - 1;
        LinearOrderedCell {
            domain: Arc::clone(&self.domain),
            low: 0,
            high,
        }
    }

    fn content_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        for symbol in self.domain.iter() {
            symbol.hash(&mut hasher);
        }
        self.low.hash(&mut hasher);
        self.high.hash(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for LinearOrderedCell {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl fmt::Display for LinearOrderedCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low(), self.high())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dog_domain() -> Arc<Vec<String>> {
        Arc::new(
            ["animal", "dog", "poodle", "toy poodle"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }

    fn range(low: &str, high: &str) -> LinearOrderedCell {
        LinearOrderedCell::with_bounds(dog_domain(), low, high).unwrap()
    }

    #[test]
    fn construction_checks_domain() {
        let full = LinearOrderedCell::over(dog_domain()).unwrap();
        assert_eq!(full.low(), "animal");
        assert_eq!(full.high(), "toy poodle");

        let dupes = Arc::new(vec!["a".to_string(), "a".to_string()]);
        assert!(LinearOrderedCell::over(dupes).is_err());
        assert!(LinearOrderedCell::over(Arc::new(vec![])).is_err());
        assert!(LinearOrderedCell::with_bounds(dog_domain(), "cat", "dog").is_err());
        assert!(LinearOrderedCell::with_bounds(dog_domain(), "poodle", "dog").is_err());
    }

    #[test]
    fn position_mapping() {
        let full = LinearOrderedCell::over(dog_domain()).unwrap();
        assert_eq!(full.to_index("dog"), Some(1));
        assert_eq!(full.to_index("toy poodle"), Some(3));
        assert_eq!(full.to_index("cat"), None);
    }

    #[test]
    fn entailment_direction() {
        let x = range("animal", "poodle");
        let y = range("dog", "dog");
        let z = range("poodle", "toy poodle");
        assert!(x.is_entailed_by(&y));
        assert!(!x.is_entailed_by(&z));
        assert!(!y.is_entailed_by(&x));
        assert!(!z.is_entailed_by(&y));
        assert!(y.entails(&x));
    }

    #[test]
    fn disjoint_ranges_contradict() {
        let x = range("animal", "dog");
        let y = range("animal", "toy poodle");
        let z = range("poodle", "toy poodle");
        assert!(x.is_contradictory(&z));
        assert!(!x.is_contradictory(&y));
        assert!(!y.is_contradictory(&z));
    }

    #[test]
    fn merge_narrows_the_range() {
        let mut x = range("animal", "poodle");
        x.merge(&range("dog", "poodle")).unwrap();
        assert_eq!(x, range("dog", "poodle"));
        x.merge(&range("poodle", "toy poodle")).unwrap();
        assert_eq!(x, range("poodle", "poodle"));
    }

    #[test]
    fn contradictory_merge_leaves_receiver_unchanged() {
        let mut x = range("animal", "dog");
        let err = x.merge(&range("poodle", "toy poodle")).unwrap_err();
        assert!(err.is_contradiction());
        assert_eq!(x, range("animal", "dog"));
    }

    #[test]
    fn mismatched_domains_are_structural() {
        let colors = Arc::new(vec!["red".to_string(), "blue".to_string()]);
        let mut x = range("animal", "dog");
        let other = LinearOrderedCell::over(colors).unwrap();
        let err = x.merge(&other).unwrap_err();
        assert!(!err.is_contradiction());
        assert!(!x.is_contradictory(&other));
    }

    #[test]
    fn domain_order_is_significant() {
        let scrambled = Arc::new(
            ["dog", "toy poodle", "animal", "poodle"]
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>(),
        );
        let x = range("animal", "poodle");
        let z = LinearOrderedCell::with_bounds(scrambled, "animal", "poodle").unwrap();
        assert!(!x.is_equal(&z));
    }

    #[test]
    fn coercion_shapes() {
        let full = LinearOrderedCell::over(dog_domain()).unwrap();
        let point = full.coerce(&CellInput::from("dog")).unwrap();
        assert_eq!(point, range("dog", "dog"));

        let pair = full
            .coerce(&CellInput::from(vec!["dog", "poodle"]))
            .unwrap();
        assert_eq!(pair, range("dog", "poodle"));

        // longer lists fold to their positional extremes
        let spread = full
            .coerce(&CellInput::from(vec!["poodle", "animal", "dog"]))
            .unwrap();
        assert_eq!(spread, range("animal", "poodle"));

        assert!(full.coerce(&CellInput::from("cat")).is_err());
        assert!(full.coerce(&CellInput::from(4)).is_err());
    }

    #[test]
    fn stem_spans_the_domain() {
        let y = range("dog", "dog");
        let stem = y.stem();
        assert_eq!(stem, LinearOrderedCell::over(dog_domain()).unwrap());
        assert!(stem.is_entailed_by(&y));
    }

    #[test]
    fn display_shows_bounds() {
        assert_eq!(range("dog", "poodle").to_string(), "[dog, poodle]");
        assert_eq!(range("dog", "dog").to_string(), "[dog, dog]");
    }

    #[test]
    fn hash_follows_equality() {
        assert_eq!(
            range("dog", "poodle").content_hash(),
            range("dog", "poodle").content_hash()
        );
        assert_ne!(
            range("dog", "poodle").content_hash(),
            range("dog", "dog").content_hash()
        );
    }
}
