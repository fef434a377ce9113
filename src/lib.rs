//! Partial-information lattice engine
//!
//! Values here are not single data points but *cells*: containers for
//! everything currently known about a quantity, with operations to
//! combine knowledge (`merge`), compare informativeness (`entails`), and
//! detect incompatibility (`is_contradictory`). The concrete lattices:
//! - Three-valued booleans ([`BoolCell`])
//! - Closed real intervals with interval arithmetic ([`IntervalCell`])
//! - Subsequence-ordered strings ([`StringCell`])
//! - Intervals over an explicit symbol order ([`LinearOrderedCell`])
//! - List prefixes ([`PrefixCell`])
//! - Finite sets narrowed by intersection or grown by union
//!   ([`SetIntersectionCell`], [`SetUnionCell`])
//! - Boundaries in a shared is-a taxonomy ([`PartialOrderedCell`])
//! - Recursive named-field composites ([`DictCell`])
//!
//! On top of the algebra, a [`BeliefState`] accumulates structured
//! constraints about which subsets of a finite entity domain are the
//! intended referents, and counts the consistent subsets in closed form.
//!
//! # Architecture
//!
//! ```text
//! merge(path, value) → target/distractor DictCells → entailment scan
//! over the ReferentialDomain → arity bounds → size()/referents()
//! ```
//!
//! # Example
//!
//! ```
//! use beliefs::cells::{CellValue, DictCell, StringCell};
//! use beliefs::{BeliefState, MergeOp, ReferentialDomain};
//!
//! # fn main() -> beliefs::CellResult<()> {
//! let mut entities = Vec::new();
//! for color in ["yellow", "green", "green", "yellow"] {
//!     let mut entity = DictCell::new();
//!     entity.insert("color", CellValue::from(StringCell::new(color)));
//!     entities.push(entity);
//! }
//! let domain = ReferentialDomain::from_entities(entities);
//!
//! let mut belief = BeliefState::new(domain);
//! assert_eq!(belief.size(), 15); // every non-empty subset of 4 entities
//!
//! belief.merge(&["target", "color"], "yellow", MergeOp::Set)?;
//! assert_eq!(belief.singleton_ids(), [0, 3]);
//! assert_eq!(belief.size(), 3);
//! # Ok(())
//! # }
//! ```

pub mod belief;
pub mod cell;
pub mod cells;
pub mod error;
pub mod input;
pub mod taxonomy;

// Re-export the contract and error types for convenience
pub use cell::Cell;
pub use error::{CellError, CellResult};
pub use input::CellInput;

// Re-exports for convenience
pub use belief::{BeliefState, EffectOrder, EnvValue, MergeOp, ReferentialDomain};
pub use cells::{
    BoolCell, CellValue, DictCell, IntervalCell, LinearOrderedCell, PrefixCell,
    SetIntersectionCell, SetUnionCell, StringCell, Truth,
};
pub use taxonomy::{PartialOrderedCell, TaxonomyBuilder, TaxonomyGraph, TaxonomyRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
