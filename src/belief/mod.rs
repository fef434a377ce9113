//! The referent layer: belief states over a finite entity domain.
//!
//! [`ReferentialDomain`] holds the candidate entities, [`BeliefState`]
//! accumulates constraints against them through keypath merges, and the
//! [`combinatorics`] helpers turn arity bounds into subset counts without
//! enumeration.

pub mod combinatorics;
pub mod domain;
pub mod state;

pub use combinatorics::{binomial_range, choose, combinations, factorial, Combinations};
pub use domain::{entity_num, DomainSpec, ReferentialDomain};
pub use state::{BeliefState, DeferredEffect, EffectOrder, EnvValue, MergeOp};
