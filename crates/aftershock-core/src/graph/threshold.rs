//! Threshold pruning of the causal graph.
//!
//! A single convention applies everywhere: an edge is **kept iff
//! `weight ≤ τ`**. Raising τ therefore only ever adds edges, so the
//! partition at a smaller τ always refines the partition at a larger one.
//!
//! Duplicate links have weight zero and are kept for every valid τ.

use petgraph::graph::DiGraph;
use tracing::{debug, instrument};

use crate::catalog::EventId;
use crate::edges::{DuplicateLink, Edge};
use crate::error::ClusterError;
use crate::graph::build::{CausalGraph, position_edges};

/// Validated cutoff τ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholder {
    threshold: f64,
}

impl Thresholder {
    /// # Errors
    ///
    /// Returns [`ClusterError::InvalidThreshold`] if `threshold` is NaN,
    /// infinite, or negative.
    pub fn new(threshold: f64) -> Result<Self, ClusterError> {
        if threshold.is_finite() && threshold >= 0.0 {
            Ok(Self { threshold })
        } else {
            Err(ClusterError::InvalidThreshold(threshold))
        }
    }

    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Return `true` if an edge of this weight survives pruning.
    #[must_use]
    pub fn keeps(&self, weight: f64) -> bool {
        weight <= self.threshold
    }

    /// Drop every edge whose weight exceeds τ.
    ///
    /// All nodes are kept, so node indices in the pruned graph still equal
    /// catalog positions.
    #[must_use]
    #[instrument(skip(self, graph), fields(threshold = self.threshold, edges = graph.edge_count()))]
    pub fn prune(&self, graph: &CausalGraph) -> PrunedGraph {
        let pruned_graph = graph
            .graph
            .filter_map(|_, id| Some(*id), |_, w| self.keeps(*w).then_some(*w));

        let pruned_edges = graph.edge_count() - pruned_graph.edge_count();
        debug!(
            kept = pruned_graph.edge_count(),
            pruned = pruned_edges,
            "threshold applied"
        );

        PrunedGraph {
            graph: pruned_graph,
            duplicates: graph.duplicates.clone(),
            threshold: self.threshold,
            pruned_edges,
        }
    }
}

/// The causal graph after thresholding.
#[derive(Debug, Clone)]
pub struct PrunedGraph {
    /// Same nodes as the source graph; only edges with weight ≤ τ.
    pub graph: DiGraph<EventId, f64>,
    /// Duplicate links, all retained.
    pub duplicates: Vec<DuplicateLink>,
    pub threshold: f64,
    /// Number of edges removed.
    pub pruned_edges: usize,
}

impl PrunedGraph {
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of retained parent edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Retained edges as catalog positions, in child order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        position_edges(&self.graph)
    }
}
