//! Causal graph assembly, thresholding, and cluster extraction.
//!
//! # Overview
//!
//! This module turns the parent edges found by [`crate::edges`] into a
//! petgraph directed graph, prunes it against the caller's threshold, and
//! splits the result into connected components.
//!
//! ## Pipeline
//!
//! ```text
//! EdgeSet
//!        ↓  build::CausalGraph::from_edges()
//! CausalGraph (DiGraph<EventId, f64>, node index = catalog position)
//!        ↓  threshold::Thresholder::prune()
//! PrunedGraph (edges with weight ≤ τ, same node indices)
//!        ↓  components::extract_components()
//! Vec<Component> (discovery order)
//!        ↓  stats::ClusterStats::collect()
//! ClusterStats
//! ```
//!
//! ## Typical Usage
//!
//! ```rust,ignore
//! let set = EdgeBuilder::new(&catalog, DistanceKind::Planar).build(&NeverCancel)?;
//! let graph = CausalGraph::from_edges(&catalog, &set);
//! let pruned = Thresholder::new(1e-5)?.prune(&graph);
//! let components = extract_components(&pruned);
//! ```

pub mod build;
pub mod components;
pub mod stats;
pub mod threshold;

// Re-export primary types at module level for convenience.
pub use build::CausalGraph;
pub use components::{Component, UnionFind, extract_components};
pub use stats::{ClusterStats, WeightSummary};
pub use threshold::{PrunedGraph, Thresholder};
