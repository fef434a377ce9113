//! Taxonomy graphs and the partial-order cell built on them.
//!
//! The graph side ([`TaxonomyGraph`], [`TaxonomyBuilder`], [`TaxonomyRegistry`])
//! owns the generalization structures: validated DAGs of labels, built once
//! and shared behind `Arc`s. The cell side ([`PartialOrderedCell`]) layers
//! merge, entailment, and contradiction over boundary sets on such a graph.

pub mod graph;
pub mod poset;

pub use graph::{TaxonomyBuilder, TaxonomyGraph, TaxonomyRegistry, TaxonomySpec};
pub use poset::PartialOrderedCell;
