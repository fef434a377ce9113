//! Finite-set lattices over a fixed token domain.
//!
//! Two dual cells share the `(domain, values)` shape:
//!
//! * [`SetIntersectionCell`] starts unconstrained (every domain member is
//!   possible) and narrows by intersection; fewer members means more
//!   information, and a merge that would empty the set is a contradiction.
//! * [`SetUnionCell`] starts empty and accumulates by union; more members
//!   means more information, and merges over the same domain never
//!   contradict.
//!
//! Cells only interact within one domain. Operands drawn from different
//! domains are a structural error on merge, never a contradiction.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHasher;

use crate::cell::Cell;
use crate::error::{CellError, CellResult};
use crate::input::CellInput;

/// Shared, immutable token domain for set cells.
pub type SetDomain = Arc<BTreeSet<String>>;

/// Build a [`SetDomain`] from anything yielding tokens.
pub fn set_domain<I, S>(members: I) -> SetDomain
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Arc::new(members.into_iter().map(Into::into).collect())
}

fn same_domain(a: &SetDomain, b: &SetDomain) -> bool {
    Arc::ptr_eq(a, b) || a == b
}

fn collect_members(domain: &SetDomain, input: &CellInput) -> CellResult<BTreeSet<String>> {
    let tokens: Vec<String> = match input {
        CellInput::Token(token) => vec![token.clone()],
        CellInput::Tokens(tokens) => tokens.clone(),
        other => {
            return Err(CellError::construction("SetCell", other.shape()));
        }
    };
    let mut members = BTreeSet::new();
    for token in tokens {
        if !domain.contains(&token) {
            return Err(CellError::OutOfDomain {
                kind: "SetCell".into(),
                value: token,
            });
        }
        members.insert(token);
    }
    Ok(members)
}

fn display_members(f: &mut fmt::Formatter<'_>, members: &BTreeSet<String>) -> fmt::Result {
    write!(f, "{{")?;
    for (i, member) in members.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{member}")?;
    }
    write!(f, "}}")
}

fn hash_members(members: &BTreeSet<String>) -> u64 {
    let mut hasher = FxHasher::default();
    for member in members {
        member.hash(&mut hasher);
    }
    hasher.finish()
}

// ============================================================================
// SetIntersectionCell
// ============================================================================

/// Cell that narrows a candidate set by intersection.
///
/// `values == None` means every domain member is still possible.
#[derive(Debug, Clone)]
pub struct SetIntersectionCell {
    domain: SetDomain,
    values: Option<BTreeSet<String>>,
}

impl SetIntersectionCell {
    /// Unconstrained cell over the given domain.
    pub fn new(domain: SetDomain) -> Self {
        SetIntersectionCell {
            domain,
            values: None,
        }
    }

    /// Cell restricted to the given members, which must lie in the domain.
    pub fn with_values<I, S>(domain: SetDomain, members: I) -> CellResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = members.into_iter().map(Into::into).collect();
        let members = collect_members(&domain, &CellInput::Tokens(tokens))?;
        Ok(SetIntersectionCell {
            domain,
            values: Some(members),
        })
    }

    /// The full domain.
    pub fn domain(&self) -> &SetDomain {
        &self.domain
    }

    /// Members still possible: the explicit values, or the whole domain.
    pub fn members(&self) -> &BTreeSet<String> {
        self.values.as_ref().unwrap_or(&self.domain)
    }

    /// Number of members still possible.
    pub fn size(&self) -> usize {
        self.members().len()
    }

    /// Whether `value` is still possible.
    pub fn contains(&self, value: &str) -> bool {
        self.members().contains(value)
    }

    /// Build a same-domain cell from a member token, a token list, or an
    /// existing intersection cell.
    pub fn coerce(&self, input: &CellInput) -> CellResult<Self> {
        match input {
            CellInput::Cell(cell) => match cell.as_set_intersection() {
                Some(set) if same_domain(&self.domain, &set.domain) => Ok(set.clone()),
                Some(_) => Err(CellError::DomainMismatch {
                    kind: "SetIntersectionCell".into(),
                }),
                None => Err(CellError::construction(
                    "SetIntersectionCell",
                    cell.kind().to_string(),
                )),
            },
            other => {
                let members = collect_members(&self.domain, other)?;
                Ok(SetIntersectionCell {
                    domain: Arc::clone(&self.domain),
                    values: Some(members),
                })
            }
        }
    }
}

impl Cell for SetIntersectionCell {
    fn merge(&mut self, other: &Self) -> CellResult<()> {
        if !same_domain(&self.domain, &other.domain) {
            return Err(CellError::DomainMismatch {
                kind: "SetIntersectionCell".into(),
            });
        }
        if self.is_equal(other) || other.is_entailed_by(self) {
            return Ok(());
        }
        if self.is_entailed_by(other) {
            self.values = other.values.clone();
            return Ok(());
        }
        if self.is_contradictory(other) {
            return Err(CellError::contradiction(format!(
                "cannot merge set with {}",
                other
            )));
        }
        // information in both: intersect
        let shared: BTreeSet<String> = self
            .members()
            .intersection(other.members())
            .cloned()
            .collect();
        self.values = Some(shared);
        Ok(())
    }

    fn is_equal(&self, other: &Self) -> bool {
        same_domain(&self.domain, &other.domain) && self.members() == other.members()
    }

    fn is_entailed_by(&self, other: &Self) -> bool {
        if !same_domain(&self.domain, &other.domain) {
            return false;
        }
        match (&self.values, &other.values) {
            // an unconstrained operand only entails another unconstrained cell
            (own, None) => own.is_none(),
            (None, Some(_)) => true,
            (Some(own), Some(theirs)) => own.is_superset(theirs),
        }
    }

    fn is_contradictory(&self, other: &Self) -> bool {
        same_domain(&self.domain, &other.domain) && self.members().is_disjoint(other.members())
    }

    fn stem(&self) -> Self {
        SetIntersectionCell::new(Arc::clone(&self.domain))
    }

    fn content_hash(&self) -> u64 {
        hash_members(self.members())
    }
}

impl PartialEq for SetIntersectionCell {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl fmt::Display for SetIntersectionCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        display_members(f, self.members())
    }
}

// ============================================================================
// SetUnionCell
// ============================================================================

/// Cell that accumulates members by union.
///
/// The empty set asserts nothing; each merge can only add members. Since
/// accumulation never removes a possibility, same-domain union merges
/// cannot contradict.
#[derive(Debug, Clone)]
pub struct SetUnionCell {
    domain: SetDomain,
    values: BTreeSet<String>,
}

impl SetUnionCell {
    /// Empty cell over the given domain.
    pub fn new(domain: SetDomain) -> Self {
        SetUnionCell {
            domain,
            values: BTreeSet::new(),
        }
    }

    /// Cell seeded with the given members, which must lie in the domain.
    pub fn with_values<I, S>(domain: SetDomain, members: I) -> CellResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = members.into_iter().map(Into::into).collect();
        let members = collect_members(&domain, &CellInput::Tokens(tokens))?;
        Ok(SetUnionCell {
            domain,
            values: members,
        })
    }

    /// The full domain.
    pub fn domain(&self) -> &SetDomain {
        &self.domain
    }

    /// Members accumulated so far.
    pub fn members(&self) -> &BTreeSet<String> {
        &self.values
    }

    /// Number of accumulated members.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Whether `value` has been accumulated.
    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    /// Build a same-domain cell from a member token, a token list, or an
    /// existing union cell.
    pub fn coerce(&self, input: &CellInput) -> CellResult<Self> {
        match input {
            CellInput::Cell(cell) => match cell.as_set_union() {
                Some(set) if same_domain(&self.domain, &set.domain) => Ok(set.clone()),
                Some(_) => Err(CellError::DomainMismatch {
                    kind: "SetUnionCell".into(),
                }),
                None => Err(CellError::construction(
                    "SetUnionCell",
                    cell.kind().to_string(),
                )),
            },
            other => {
                let members = collect_members(&self.domain, other)?;
                Ok(SetUnionCell {
                    domain: Arc::clone(&self.domain),
                    values: members,
                })
            }
        }
    }
}

impl Cell for SetUnionCell {
    fn merge(&mut self, other: &Self) -> CellResult<()> {
        if !same_domain(&self.domain, &other.domain) {
            return Err(CellError::DomainMismatch {
                kind: "SetUnionCell".into(),
            });
        }
        if !self.is_equal(other) {
            self.values.extend(other.values.iter().cloned());
        }
        Ok(())
    }

    fn is_equal(&self, other: &Self) -> bool {
        same_domain(&self.domain, &other.domain) && self.values == other.values
    }

    fn is_entailed_by(&self, other: &Self) -> bool {
        // more accumulated members = more information
        same_domain(&self.domain, &other.domain) && other.values.is_superset(&self.values)
    }

    fn is_contradictory(&self, _other: &Self) -> bool {
        false
    }

    fn stem(&self) -> Self {
        SetUnionCell::new(Arc::clone(&self.domain))
    }

    fn content_hash(&self) -> u64 {
        hash_members(&self.values)
    }
}

impl PartialEq for SetUnionCell {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl fmt::Display for SetUnionCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        display_members(f, &self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors() -> SetDomain {
        set_domain(["red", "yellow", "green", "blue"])
    }

    mod intersection {
        use super::*;

        #[test]
        fn starts_with_the_whole_domain() {
            let cell = SetIntersectionCell::new(colors());
            assert_eq!(cell.size(), 4);
            assert!(cell.contains("red"));
            assert!(!cell.contains("purple"));
        }

        #[test]
        fn merge_narrows_by_intersection() {
            let mut cell = SetIntersectionCell::new(colors());
            let h1 = cell.content_hash();

            cell.merge(&cell.coerce(&CellInput::from(vec!["yellow", "green"])).unwrap())
                .unwrap();
            assert_eq!(cell.size(), 2);
            let h2 = cell.content_hash();

            cell.merge(&cell.coerce(&CellInput::from("yellow")).unwrap())
                .unwrap();
            assert_eq!(cell.size(), 1);
            assert!(cell.contains("yellow"));
            assert!(!cell.contains("green"));
            let h3 = cell.content_hash();

            assert_ne!(h1, h2);
            assert_ne!(h2, h3);
        }

        #[test]
        fn fewer_members_is_more_information() {
            let full = SetIntersectionCell::new(colors());
            let yellow = SetIntersectionCell::with_values(colors(), ["yellow"]).unwrap();
            let warm = SetIntersectionCell::with_values(colors(), ["red", "yellow"]).unwrap();

            assert!(full.is_entailed_by(&yellow));
            assert!(full.is_entailed_by(&warm));
            assert!(warm.is_entailed_by(&yellow));
            assert!(!yellow.is_entailed_by(&warm));
            assert!(!full.entails(&yellow));
            assert!(yellow.entails(&full));
        }

        #[test]
        fn unconstrained_only_entails_unconstrained() {
            let full = SetIntersectionCell::new(colors());
            let yellow = SetIntersectionCell::with_values(colors(), ["yellow"]).unwrap();
            assert!(!yellow.is_entailed_by(&full));
            assert!(full.is_entailed_by(&full.clone()));
        }

        #[test]
        fn explicit_full_domain_equals_unconstrained() {
            let implicit = SetIntersectionCell::new(colors());
            let explicit =
                SetIntersectionCell::with_values(colors(), ["red", "yellow", "green", "blue"])
                    .unwrap();
            assert!(implicit.is_equal(&explicit));
            assert_eq!(implicit.content_hash(), explicit.content_hash());
        }

        #[test]
        fn disjoint_sets_contradict() {
            let red = SetIntersectionCell::with_values(colors(), ["red"]).unwrap();
            let green = SetIntersectionCell::with_values(colors(), ["green"]).unwrap();
            assert!(red.is_contradictory(&green));

            let mut cell = red.clone();
            let err = cell.merge(&green).unwrap_err();
            assert!(err.is_contradiction());
            // the receiver is untouched by a failed merge
            assert!(cell.is_equal(&red));
        }

        #[test]
        fn overlap_is_not_a_contradiction() {
            let warm = SetIntersectionCell::with_values(colors(), ["red", "yellow"]).unwrap();
            let yellowish =
                SetIntersectionCell::with_values(colors(), ["yellow", "green"]).unwrap();
            assert!(!warm.is_contradictory(&yellowish));

            let mut cell = warm;
            cell.merge(&yellowish).unwrap();
            assert!(cell.contains("yellow"));
            assert_eq!(cell.size(), 1);
        }

        #[test]
        fn out_of_domain_values_fail_coercion() {
            let cell = SetIntersectionCell::new(colors());
            assert!(cell.coerce(&CellInput::from("purple")).is_err());
            assert!(SetIntersectionCell::with_values(colors(), ["purple"]).is_err());
        }

        #[test]
        fn mismatched_domains_are_structural() {
            let mut cell = SetIntersectionCell::new(colors());
            let other = SetIntersectionCell::new(set_domain(["cube", "sphere"]));
            let err = cell.merge(&other).unwrap_err();
            assert!(!err.is_contradiction());
            assert!(!cell.is_contradictory(&other));
            assert!(!cell.is_entailed_by(&other));
        }

        #[test]
        fn stem_resets_to_the_domain() {
            let yellow = SetIntersectionCell::with_values(colors(), ["yellow"]).unwrap();
            let stem = yellow.stem();
            assert_eq!(stem.size(), 4);
            assert!(stem.is_entailed_by(&yellow));
        }
    }

    mod union {
        use super::*;

        #[test]
        fn starts_empty_and_accumulates() {
            let mut cell = SetUnionCell::new(colors());
            assert_eq!(cell.size(), 0);
            let h1 = cell.content_hash();

            cell.merge(&cell.coerce(&CellInput::from(vec!["yellow", "green"])).unwrap())
                .unwrap();
            assert_eq!(cell.size(), 2);
            let h2 = cell.content_hash();

            // re-merging a known member changes nothing
            cell.merge(&cell.coerce(&CellInput::from("yellow")).unwrap())
                .unwrap();
            assert_eq!(cell.size(), 2);
            let h3 = cell.content_hash();

            assert_ne!(h1, h2);
            assert_eq!(h2, h3);
        }

        #[test]
        fn seeded_cell_grows_monotonically() {
            let mut cell = SetUnionCell::with_values(colors(), ["yellow"]).unwrap();
            assert_eq!(cell.size(), 1);
            cell.merge(
                &cell
                    .coerce(&CellInput::from(vec!["yellow", "green", "blue"]))
                    .unwrap(),
            )
            .unwrap();
            assert_eq!(cell.size(), 3);
            cell.merge(&cell.coerce(&CellInput::from("yellow")).unwrap())
                .unwrap();
            assert_eq!(cell.size(), 3);
        }

        #[test]
        fn more_members_is_more_information() {
            let empty = SetUnionCell::new(colors());
            let yellow = SetUnionCell::with_values(colors(), ["yellow"]).unwrap();
            let warm = SetUnionCell::with_values(colors(), ["red", "yellow"]).unwrap();

            assert!(empty.is_entailed_by(&yellow));
            assert!(yellow.is_entailed_by(&warm));
            assert!(!warm.is_entailed_by(&yellow));
            assert!(warm.entails(&yellow));
        }

        #[test]
        fn same_domain_unions_never_contradict() {
            let red = SetUnionCell::with_values(colors(), ["red"]).unwrap();
            let green = SetUnionCell::with_values(colors(), ["green"]).unwrap();
            assert!(!red.is_contradictory(&green));

            let mut cell = red;
            cell.merge(&green).unwrap();
            assert_eq!(cell.size(), 2);
        }

        #[test]
        fn mismatched_domains_are_structural() {
            let mut cell = SetUnionCell::new(colors());
            let other = SetUnionCell::new(set_domain(["cube", "sphere"]));
            assert!(cell.merge(&other).is_err());
        }

        #[test]
        fn display_is_sorted() {
            let cell = SetUnionCell::with_values(colors(), ["yellow", "blue"]).unwrap();
            assert_eq!(cell.to_string(), "{blue, yellow}");
        }
    }
}
