//! Partial-order lattice over a shared taxonomy graph.
//!
//! A `PartialOrderedCell` generalizes the linear symbol range to a directed
//! acyclic generalization structure. State is two boundary sets over the
//! graph's labels: `upper` holds asserted generalizations ("it is a
//! vehicle"), `lower` holds exclusions ("it is not a car"). The member set
//! spanned by the boundaries is everything reachable downward from the
//! effective upper bound, minus anything at or below an exclusion.
//!
//! Asserting a root label adds no information: the effective upper bound
//! already starts at the roots, so such a merge is a no-op. Sibling
//! assertions widen the upper boundary instead of contradicting; a
//! contradiction arises only when an exclusion generalizes an assertion or
//! the boundaries span no members at all.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHasher;

use crate::cell::Cell;
use crate::error::{CellError, CellResult};
use crate::input::CellInput;
use crate::taxonomy::graph::{same_graph, TaxonomyGraph};

/// Effective upper boundary: roots stand in for the universal bound, and a
/// root is dropped once one of its descendants appears in `upper`.
fn effective_upper(domain: &TaxonomyGraph, upper: &BTreeSet<String>) -> BTreeSet<String> {
    let mut bound = BTreeSet::new();
    for root in domain.roots().difference(upper) {
        let specialized = upper
            .difference(domain.roots())
            .any(|up| domain.reaches(root, up));
        if !specialized {
            bound.insert(root.clone());
        }
    }
    bound.extend(upper.difference(domain.roots()).cloned());
    bound
}

/// Members spanned by a boundary pair.
fn spanned_values(
    domain: &TaxonomyGraph,
    upper: &BTreeSet<String>,
    lower: &BTreeSet<String>,
) -> BTreeSet<String> {
    let start: BTreeSet<String> = effective_upper(domain, upper)
        .difference(lower)
        .cloned()
        .collect();
    let seen = domain.descendants_below(start.iter().cloned(), lower);
    let mut values: BTreeSet<String> = seen.union(&start).cloned().collect();
    // a label on both boundaries is collapsed out entirely
    for conflated in upper.intersection(lower) {
        values.remove(conflated);
    }
    values
}

/// Cell over the boundary lattice of a taxonomy graph.
#[derive(Debug, Clone)]
pub struct PartialOrderedCell {
    domain: Arc<TaxonomyGraph>,
    upper: BTreeSet<String>,
    lower: BTreeSet<String>,
    // kept in sync with the boundaries on every change
    values: BTreeSet<String>,
}

impl PartialOrderedCell {
    /// Unconstrained cell spanning the whole graph.
    pub fn new(domain: Arc<TaxonomyGraph>) -> Self {
        let values = spanned_values(&domain, &BTreeSet::new(), &BTreeSet::new());
        PartialOrderedCell {
            domain,
            upper: BTreeSet::new(),
            lower: BTreeSet::new(),
            values,
        }
    }

    /// Cell asserting a single generalization.
    pub fn positive(domain: Arc<TaxonomyGraph>, label: &str) -> CellResult<Self> {
        let mut cell = PartialOrderedCell::new(domain);
        cell.require_member(label)?;
        cell.upper.insert(label.to_string());
        cell.recompute();
        Ok(cell)
    }

    /// Cell excluding a single label and everything beneath it.
    pub fn negative(domain: Arc<TaxonomyGraph>, label: &str) -> CellResult<Self> {
        let mut cell = PartialOrderedCell::new(domain);
        cell.require_member(label)?;
        cell.lower.insert(label.to_string());
        cell.recompute();
        Ok(cell)
    }

    /// Cell with explicit boundary sets.
    pub fn with_boundaries<U, L, S>(
        domain: Arc<TaxonomyGraph>,
        upper: U,
        lower: L,
    ) -> CellResult<Self>
    where
        U: IntoIterator<Item = S>,
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cell = PartialOrderedCell::new(domain);
        for label in upper {
            let label = label.into();
            cell.require_member(&label)?;
            cell.upper.insert(label);
        }
        for label in lower {
            let label = label.into();
            cell.require_member(&label)?;
            cell.lower.insert(label);
        }
        cell.recompute();
        Ok(cell)
    }

    fn require_member(&self, label: &str) -> CellResult<()> {
        if self.domain.contains(label) {
            Ok(())
        } else {
            Err(CellError::OutOfDomain {
                kind: "PartialOrderedCell".into(),
                value: label.into(),
            })
        }
    }

    fn recompute(&mut self) {
        self.values = spanned_values(&self.domain, &self.upper, &self.lower);
    }

    /// The shared generalization structure.
    pub fn domain(&self) -> &Arc<TaxonomyGraph> {
        &self.domain
    }

    /// Asserted generalizations.
    pub fn upper(&self) -> &BTreeSet<String> {
        &self.upper
    }

    /// Asserted exclusions.
    pub fn lower(&self) -> &BTreeSet<String> {
        &self.lower
    }

    /// Labels spanned by the current boundaries.
    pub fn values(&self) -> &BTreeSet<String> {
        &self.values
    }

    /// Number of spanned labels.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// The upper boundary with roots standing in where nothing more
    /// specific has been asserted.
    pub fn compute_upper_bound(&self) -> BTreeSet<String> {
        effective_upper(&self.domain, &self.upper)
    }

    /// Direct specializations of the asserted generalizations.
    pub fn refinement_options(&self) -> BTreeSet<String> {
        self.upper
            .iter()
            .flat_map(|label| self.domain.successors(label))
            .collect()
    }

    /// Direct generalizations of the asserted generalizations.
    pub fn relaxation_options(&self) -> BTreeSet<String> {
        self.upper
            .iter()
            .flat_map(|label| self.domain.predecessors(label))
            .collect()
    }

    /// The asserted generalizations, or the roots when nothing has been
    /// asserted yet.
    pub fn most_specific_members(&self) -> BTreeSet<String> {
        if self.upper.is_empty() {
            self.domain.roots().clone()
        } else {
            self.upper.clone()
        }
    }

    /// Build a same-domain cell asserting the given label or cell.
    pub fn coerce(&self, input: &CellInput) -> CellResult<Self> {
        self.coerce_with(input, true)
    }

    /// Build a same-domain cell excluding the given label.
    pub fn coerce_excluded(&self, input: &CellInput) -> CellResult<Self> {
        self.coerce_with(input, false)
    }

    fn coerce_with(&self, input: &CellInput, positive: bool) -> CellResult<Self> {
        match input {
            CellInput::Token(label) => {
                if positive {
                    PartialOrderedCell::positive(Arc::clone(&self.domain), label)
                } else {
                    PartialOrderedCell::negative(Arc::clone(&self.domain), label)
                }
            }
            CellInput::Cell(cell) => match cell.as_partial_order() {
                Some(poset) if same_graph(&self.domain, &poset.domain) => Ok(poset.clone()),
                Some(_) => Err(CellError::DomainMismatch {
                    kind: "PartialOrderedCell".into(),
                }),
                None => Err(CellError::construction(
                    "PartialOrderedCell",
                    cell.kind().to_string(),
                )),
            },
            other => Err(CellError::construction("PartialOrderedCell", other.shape())),
        }
    }
}

impl Cell for PartialOrderedCell {
    fn merge(&mut self, other: &Self) -> CellResult<()> {
        if !same_graph(&self.domain, &other.domain) {
            return Err(CellError::DomainMismatch {
                kind: "PartialOrderedCell".into(),
            });
        }
        if self.is_equal(other) || other.is_entailed_by(self) {
            // no new information; fall through to the member check
        } else if self.is_entailed_by(other) {
            self.upper = other.upper.clone();
            self.lower = other.lower.clone();
            self.recompute();
            return Ok(());
        } else if self.is_contradictory(other) {
            return Err(CellError::contradiction("cannot merge partial orders"));
        } else {
            // incomparable: take the union of both boundaries
            let mut changed = false;
            for label in &other.upper {
                changed |= self.upper.insert(label.clone());
            }
            for label in &other.lower {
                changed |= self.lower.insert(label.clone());
            }
            if changed {
                self.recompute();
            }
        }
        if self.values.is_empty() {
            return Err(CellError::contradiction("partial ordering has no members"));
        }
        Ok(())
    }

    fn is_equal(&self, other: &Self) -> bool {
        same_graph(&self.domain, &other.domain)
            && self.upper == other.upper
            && self.lower == other.lower
    }

    fn is_entailed_by(&self, other: &Self) -> bool {
        if !same_graph(&self.domain, &other.domain) {
            return false;
        }
        // every member of the full upper bound that other does not share
        // must be generalized by something other asserts
        let full_upper = self.compute_upper_bound();
        if !(self.upper.is_empty() || other.upper.is_superset(&self.upper)) {
            for self_up in full_upper.difference(&other.upper) {
                let covered = other
                    .upper
                    .difference(&full_upper)
                    .any(|other_up| self.domain.reaches(self_up, other_up));
                if !covered {
                    return false;
                }
            }
        }
        // every exclusion of self must be matched or refined by other
        if !(self.lower.is_empty() || self.lower.is_subset(&other.lower)) {
            for self_lo in self.lower.difference(&other.lower) {
                let covered = other
                    .lower
                    .difference(&self.lower)
                    .any(|other_lo| self.domain.reaches(self_lo, other_lo));
                if !covered {
                    return false;
                }
            }
        }
        true
    }

    fn is_contradictory(&self, other: &Self) -> bool {
        if !same_graph(&self.domain, &other.domain) {
            return true;
        }
        // an exclusion that generalizes an assertion empties the overlap
        let lowers: BTreeSet<&String> = self.lower.union(&other.lower).collect();
        let uppers: BTreeSet<&String> = self.upper.union(&other.upper).collect();
        for low in &lowers {
            for high in &uppers {
                if low != high && self.domain.reaches(low, high) {
                    return true;
                }
            }
        }
        // otherwise, contradictory iff the combined boundaries span nothing
        let merged_upper: BTreeSet<String> = uppers.into_iter().cloned().collect();
        let merged_lower: BTreeSet<String> = lowers.into_iter().cloned().collect();
        spanned_values(&self.domain, &merged_upper, &merged_lower).is_empty()
    }

    fn stem(&self) -> Self {
        PartialOrderedCell::new(Arc::clone(&self.domain))
    }

    fn content_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.domain.fingerprint().hash(&mut hasher);
        self.upper.hash(&mut hasher);
        self.lower.hash(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for PartialOrderedCell {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl fmt::Display for PartialOrderedCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(set: &BTreeSet<String>) -> String {
            set.iter().cloned().collect::<Vec<_>>().join(", ")
        }
        write!(
            f,
            "upper={{{}}}, lower={{{}}}",
            join(&self.upper),
            join(&self.lower)
        )
    }
}
