//! Validated taxonomy graphs and their bootstrap.
//!
//! A [`TaxonomyGraph`] is the generalization structure behind
//! [`PartialOrderedCell`](crate::taxonomy::PartialOrderedCell): a directed
//! acyclic graph whose edges point from general to specific (`thing ->
//! vehicle -> car`). Graphs are built once through [`TaxonomyBuilder`],
//! validated (nonempty, acyclic, weakly connected), then shared read-only
//! behind an `Arc`; cells hold a reference, never a copy.
//!
//! [`TaxonomyRegistry`] keeps named graphs for lookup at entity-bootstrap
//! time, and [`TaxonomySpec`] is the serde edge-list format the registry
//! can load them from.

use std::collections::{BTreeSet, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use petgraph::algo::{connected_components, has_path_connecting, is_cyclic_directed};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use rustc_hash::{FxHashMap, FxHasher};
use serde::Deserialize;
use tracing::debug;

use crate::error::{CellError, CellResult};

/// Immutable generalization structure over string labels.
///
/// Edges run from the more general label to the more specific one.
#[derive(Debug)]
pub struct TaxonomyGraph {
    name: String,
    graph: DiGraph<String, ()>,
    label_to_node: FxHashMap<String, NodeIndex>,
    roots: BTreeSet<String>,
    leaves: BTreeSet<String>,
    fingerprint: u64,
}

impl TaxonomyGraph {
    /// Name given at build time.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stable digest of the name and edge set, used for cheap identity
    /// checks between cells.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Labels with no predecessors, the most general members.
    pub fn roots(&self) -> &BTreeSet<String> {
        &self.roots
    }

    /// Labels with no successors, the most specific members.
    pub fn leaves(&self) -> &BTreeSet<String> {
        &self.leaves
    }

    /// Number of labels in the graph.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the graph has no labels. Validated graphs never do.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Whether `label` belongs to the graph.
    pub fn contains(&self, label: &str) -> bool {
        self.label_to_node.contains_key(label)
    }

    /// All labels, in sorted order.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.graph.node_weights().cloned().collect();
        labels.sort();
        labels
    }

    /// Immediate specializations of `label`, sorted.
    pub fn successors(&self, label: &str) -> Vec<String> {
        self.neighbors(label, Direction::Outgoing)
    }

    /// Immediate generalizations of `label`, sorted.
    pub fn predecessors(&self, label: &str) -> Vec<String> {
        self.neighbors(label, Direction::Incoming)
    }

    fn neighbors(&self, label: &str, direction: Direction) -> Vec<String> {
        let Some(&idx) = self.label_to_node.get(label) else {
            return Vec::new();
        };
        let mut neighbors: Vec<String> = self
            .graph
            .neighbors_directed(idx, direction)
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect();
        neighbors.sort();
        neighbors
    }

    /// Whether a directed path runs from `from` down to `to`.
    ///
    /// Every label reaches itself.
    pub fn reaches(&self, from: &str, to: &str) -> bool {
        let (Some(&from_idx), Some(&to_idx)) =
            (self.label_to_node.get(from), self.label_to_node.get(to))
        else {
            return false;
        };
        has_path_connecting(&self.graph, from_idx, to_idx, None)
    }

    /// All labels reachable downward from `start`, excluding `start` itself
    /// and anything in `blocked` (blocked labels are not expanded through).
    pub fn descendants_below(
        &self,
        start: impl IntoIterator<Item = String>,
        blocked: &BTreeSet<String>,
    ) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut agenda: VecDeque<String> = start.into_iter().collect();
        let initial: BTreeSet<String> = agenda.iter().cloned().collect();
        while let Some(label) = agenda.pop_front() {
            for child in self.successors(&label) {
                if seen.contains(&child) || blocked.contains(&child) || initial.contains(&child) {
                    continue;
                }
                seen.insert(child.clone());
                agenda.push_back(child);
            }
        }
        seen
    }
}

/// Whether two cells share one generalization structure.
pub(crate) fn same_graph(a: &Arc<TaxonomyGraph>, b: &Arc<TaxonomyGraph>) -> bool {
    Arc::ptr_eq(a, b) || a.fingerprint == b.fingerprint
}

// ============================================================================
// Builder
// ============================================================================

/// Edge-by-edge construction of a [`TaxonomyGraph`].
#[derive(Debug, Default)]
pub struct TaxonomyBuilder {
    graph: DiGraph<String, ()>,
    label_to_node: FxHashMap<String, NodeIndex>,
    edges: Vec<(String, String)>,
}

impl TaxonomyBuilder {
    pub fn new() -> Self {
        TaxonomyBuilder::default()
    }

    fn node(&mut self, label: &str) -> NodeIndex {
        if let Some(&idx) = self.label_to_node.get(label) {
            return idx;
        }
        let idx = self.graph.add_node(label.to_string());
        self.label_to_node.insert(label.to_string(), idx);
        idx
    }

    /// Add an isolated label.
    pub fn add_label(mut self, label: &str) -> Self {
        self.node(label);
        self
    }

    /// Add a generalization edge from `parent` down to `child`.
    pub fn add_edge(mut self, parent: &str, child: &str) -> Self {
        let parent_idx = self.node(parent);
        let child_idx = self.node(child);
        if !self.graph.contains_edge(parent_idx, child_idx) {
            self.graph.add_edge(parent_idx, child_idx, ());
            self.edges.push((parent.to_string(), child.to_string()));
        }
        self
    }

    /// Validate and freeze the graph.
    ///
    /// Fails when the graph is empty, cyclic, or not weakly connected.
    pub fn build(self, name: &str) -> CellResult<Arc<TaxonomyGraph>> {
        if self.graph.node_count() == 0 {
            return Err(CellError::InvalidTaxonomy {
                name: name.into(),
                reason: "empty generalization structure".into(),
            });
        }
        if is_cyclic_directed(&self.graph) {
            return Err(CellError::InvalidTaxonomy {
                name: name.into(),
                reason: "must be directed and acyclic".into(),
            });
        }
        if connected_components(&self.graph) != 1 {
            return Err(CellError::InvalidTaxonomy {
                name: name.into(),
                reason: "must be connected".into(),
            });
        }

        let mut roots = BTreeSet::new();
        let mut leaves = BTreeSet::new();
        for idx in self.graph.node_indices() {
            let label = &self.graph[idx];
            if self
                .graph
                .neighbors_directed(idx, Direction::Incoming)
                .next()
                .is_none()
            {
                roots.insert(label.clone());
            }
            if self
                .graph
                .neighbors_directed(idx, Direction::Outgoing)
                .next()
                .is_none()
            {
                leaves.insert(label.clone());
            }
        }

        let mut edges = self.edges;
        edges.sort();
        let mut hasher = FxHasher::default();
        name.hash(&mut hasher);
        edges.hash(&mut hasher);
        let fingerprint = hasher.finish();

        debug!(
            taxonomy = name,
            labels = self.graph.node_count(),
            edges = edges.len(),
            "built taxonomy graph"
        );

        Ok(Arc::new(TaxonomyGraph {
            name: name.to_string(),
            graph: self.graph,
            label_to_node: self.label_to_node,
            roots,
            leaves,
            fingerprint,
        }))
    }
}

// ============================================================================
// Serde spec + registry
// ============================================================================

/// Edge-list description of a taxonomy, the serde boundary for loading
/// graphs from configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomySpec {
    /// Registry name for the graph.
    pub name: String,
    /// `[parent, child]` label pairs.
    pub edges: Vec<(String, String)>,
}

impl TaxonomySpec {
    /// Build and validate the described graph.
    pub fn build(&self) -> CellResult<Arc<TaxonomyGraph>> {
        let mut builder = TaxonomyBuilder::new();
        for (parent, child) in &self.edges {
            builder = builder.add_edge(parent, child);
        }
        builder.build(&self.name)
    }
}

/// Register-once store of named taxonomy graphs.
#[derive(Debug, Default)]
pub struct TaxonomyRegistry {
    graphs: FxHashMap<String, Arc<TaxonomyGraph>>,
}

impl TaxonomyRegistry {
    pub fn new() -> Self {
        TaxonomyRegistry::default()
    }

    /// Register a built graph under its own name.
    pub fn register(&mut self, graph: Arc<TaxonomyGraph>) -> CellResult<()> {
        let name = graph.name().to_string();
        if self.graphs.contains_key(&name) {
            return Err(CellError::DuplicateTaxonomy { name });
        }
        debug!(taxonomy = %name, "registered taxonomy");
        self.graphs.insert(name, graph);
        Ok(())
    }

    /// Build a graph from its spec and register it.
    pub fn register_spec(&mut self, spec: &TaxonomySpec) -> CellResult<Arc<TaxonomyGraph>> {
        let graph = spec.build()?;
        self.register(Arc::clone(&graph))?;
        Ok(graph)
    }

    /// Look up a registered graph.
    pub fn get(&self, name: &str) -> Option<&Arc<TaxonomyGraph>> {
        self.graphs.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.graphs.keys().map(String::as_str).collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicles() -> Arc<TaxonomyGraph> {
        TaxonomyBuilder::new()
            .add_edge("thing", "vehicle")
            .add_edge("vehicle", "car")
            .add_edge("vehicle", "truck")
            .build("vehicles")
            .unwrap()
    }

    #[test]
    fn build_validates_structure() {
        let graph = vehicles();
        assert_eq!(graph.len(), 4);
        assert!(graph.contains("car"));
        assert!(!graph.contains("boat"));

        let cyclic = TaxonomyBuilder::new()
            .add_edge("a", "b")
            .add_edge("b", "a")
            .build("cyclic");
        assert!(cyclic.is_err());

        let disconnected = TaxonomyBuilder::new()
            .add_edge("a", "b")
            .add_edge("c", "d")
            .build("disconnected");
        assert!(disconnected.is_err());

        assert!(TaxonomyBuilder::new().build("empty").is_err());
    }

    #[test]
    fn roots_and_leaves() {
        let graph = vehicles();
        assert_eq!(graph.roots().iter().collect::<Vec<_>>(), ["thing"]);
        assert_eq!(graph.leaves().iter().collect::<Vec<_>>(), ["car", "truck"]);
    }

    #[test]
    fn reachability_follows_edges_downward() {
        let graph = vehicles();
        assert!(graph.reaches("thing", "car"));
        assert!(graph.reaches("vehicle", "truck"));
        assert!(graph.reaches("car", "car"));
        assert!(!graph.reaches("car", "vehicle"));
        assert!(!graph.reaches("car", "truck"));
        assert!(!graph.reaches("boat", "car"));
    }

    #[test]
    fn neighbor_queries_are_sorted() {
        let graph = vehicles();
        assert_eq!(graph.successors("vehicle"), ["car", "truck"]);
        assert_eq!(graph.predecessors("car"), ["vehicle"]);
        assert!(graph.successors("car").is_empty());
        assert!(graph.successors("boat").is_empty());
    }

    #[test]
    fn descendant_traversal_respects_blocks() {
        let graph = vehicles();
        let below = graph.descendants_below(["vehicle".to_string()], &BTreeSet::new());
        assert_eq!(
            below.iter().collect::<Vec<_>>(),
            ["car", "truck"]
        );

        let mut blocked = BTreeSet::new();
        blocked.insert("car".to_string());
        let below = graph.descendants_below(["vehicle".to_string()], &blocked);
        assert_eq!(below.iter().collect::<Vec<_>>(), ["truck"]);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = vehicles();
        let b = vehicles();
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(same_graph(&a, &b));

        let other = TaxonomyBuilder::new()
            .add_edge("thing", "person")
            .build("people")
            .unwrap();
        assert!(!same_graph(&a, &other));
    }

    #[test]
    fn registry_rejects_duplicates() {
        let mut registry = TaxonomyRegistry::new();
        registry.register(vehicles()).unwrap();
        assert!(registry.get("vehicles").is_some());
        assert!(registry.get("people").is_none());

        let err = registry.register(vehicles()).unwrap_err();
        assert!(matches!(err, CellError::DuplicateTaxonomy { .. }));
        assert_eq!(registry.names(), ["vehicles"]);
    }

    #[test]
    fn spec_round_trip() {
        let json = r#"{
            "name": "vehicles",
            "edges": [["thing", "vehicle"], ["vehicle", "car"], ["vehicle", "truck"]]
        }"#;
        let spec: TaxonomySpec = serde_json::from_str(json).unwrap();
        let graph = spec.build().unwrap();
        assert!(graph.reaches("thing", "truck"));
        assert!(same_graph(&graph, &vehicles()));
    }
}
