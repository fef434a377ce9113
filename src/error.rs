//! Error and result types shared by every cell kind.
//!
//! Three families of failure flow through the engine, and they are not
//! interchangeable:
//!
//! | Family | Meaning | Caller response |
//! |--------|---------|-----------------|
//! | Contradiction | Two partial descriptions admit no consistent merge | Recoverable: treat the branch as a dead end |
//! | Construction | Input could not be read as a value of a cell's kind | Caller bug or malformed input |
//! | Structural | Protocol violation (kind/domain mismatch, bad path, bad graph) | Fatal programmer error |
//!
//! Only `Contradiction` is part of the lattice algebra itself: a failed
//! merge with [`CellError::is_contradiction`] returning `true` is the
//! ordinary backtracking signal, not a defect. Everything else indicates
//! the engine was driven incorrectly.

/// Result alias used throughout the crate.
pub type CellResult<T> = Result<T, CellError>;

/// Unified error type for cell construction, comparison, and merging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CellError {
    /// A merge would produce an empty or inconsistent lattice position.
    ///
    /// This is a semantic outcome, not a programmer error: callers driving
    /// a search are expected to catch it and prune the branch.
    #[error("contradiction: {reason}")]
    Contradiction {
        /// Human-readable account of the incompatible information.
        reason: String,
    },

    /// Input could not be interpreted as a value of the target kind.
    #[error("cannot construct {kind} from input: {reason}")]
    Construction {
        /// Cell kind that rejected the input.
        kind: &'static str,
        /// What was wrong with the input.
        reason: String,
    },

    /// A value was offered that lies outside a cell's finite domain.
    #[error("value `{value}` is not in the domain of {kind}")]
    OutOfDomain {
        /// Cell kind whose domain was violated.
        kind: &'static str,
        /// The offending token.
        value: String,
    },

    /// Two cells of different kinds were asked to merge or compare.
    #[error("kind mismatch: expected {expected}, found {found}")]
    KindMismatch {
        /// Kind of the receiver.
        expected: &'static str,
        /// Kind of the argument.
        found: &'static str,
    },

    /// Two finite-domain cells with different domains were combined.
    ///
    /// Domain agreement is a protocol requirement; a mismatch is never
    /// expressible as a lattice outcome.
    #[error("domain mismatch between {kind} cells")]
    DomainMismatch {
        /// Cell kind involved.
        kind: &'static str,
    },

    /// A keypath referred outside the recognized structure.
    #[error("unknown path `{path}`")]
    UnknownPath {
        /// The rejected path, joined with `.`.
        path: String,
    },

    /// A taxonomy graph failed validation at build time.
    #[error("invalid taxonomy `{name}`: {reason}")]
    InvalidTaxonomy {
        /// Name the graph was being registered under.
        name: String,
        /// Which invariant failed (empty, cyclic, disconnected, ...).
        reason: String,
    },

    /// A taxonomy name was registered twice.
    #[error("taxonomy `{name}` is already registered")]
    DuplicateTaxonomy {
        /// The contested name.
        name: String,
    },
}

impl CellError {
    /// Build the recoverable contradiction outcome.
    pub fn contradiction(reason: impl Into<String>) -> Self {
        CellError::Contradiction {
            reason: reason.into(),
        }
    }

    /// Build a construction failure for `kind`.
    pub fn construction(kind: &'static str, reason: impl Into<String>) -> Self {
        CellError::Construction {
            kind,
            reason: reason.into(),
        }
    }

    /// True iff this error is the recoverable contradiction outcome.
    ///
    /// Search layers use this to distinguish "prune the branch" from
    /// "abort, the caller is buggy".
    pub fn is_contradiction(&self) -> bool {
        matches!(self, CellError::Contradiction { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contradiction_is_recoverable() {
        let err = CellError::contradiction("disjoint intervals");
        assert!(err.is_contradiction());
        assert_eq!(err.to_string(), "contradiction: disjoint intervals");
    }

    #[test]
    fn structural_errors_are_not_contradictions() {
        let kind = CellError::KindMismatch {
            expected: "IntervalCell",
            found: "BoolCell",
        };
        assert!(!kind.is_contradiction());

        let domain = CellError::DomainMismatch {
            kind: "SetIntersectionCell",
        };
        assert!(!domain.is_contradiction());
        assert_eq!(
            domain.to_string(),
            "domain mismatch between SetIntersectionCell cells"
        );
    }
}
