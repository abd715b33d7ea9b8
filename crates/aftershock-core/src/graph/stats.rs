//! Summary statistics for one clustering run.
//!
//! # Statistics Provided
//!
//! - **event_count** / **excluded_count**: validated events and records
//!   rejected at the catalog boundary.
//! - **candidate_edges**: parent edges before thresholding (one per
//!   non-root event).
//! - **retained_edges** / **pruned_edges**: split of the candidates by the
//!   `weight ≤ τ` rule.
//! - **duplicate_links**: zero-weight links between exact duplicates.
//! - **root_count**: events with no strictly earlier candidate.
//! - **cluster_count**, **singleton_count**, **largest_cluster**: shape of
//!   the partition.
//! - **weights**: min/median/max of the candidate edge weights. Useful for
//!   picking τ: everything above the chosen value gets cut.

use serde::Serialize;

use crate::catalog::Catalog;
use crate::graph::build::CausalGraph;
use crate::graph::components::Component;
use crate::graph::threshold::PrunedGraph;

// ---------------------------------------------------------------------------
// ClusterStats
// ---------------------------------------------------------------------------

/// Summary statistics for one clustering run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterStats {
    pub event_count: usize,
    pub excluded_count: usize,
    pub candidate_edges: usize,
    pub retained_edges: usize,
    pub pruned_edges: usize,
    pub duplicate_links: usize,
    pub root_count: usize,
    pub cluster_count: usize,
    pub singleton_count: usize,
    pub largest_cluster: usize,
    /// `None` when there are no candidate edges.
    pub weights: Option<WeightSummary>,
}

/// Spread of candidate edge weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightSummary {
    pub min: f64,
    pub median: f64,
    pub max: f64,
}

impl ClusterStats {
    /// Compute statistics from the intermediate products of a run.
    #[must_use]
    pub fn collect(
        catalog: &Catalog,
        graph: &CausalGraph,
        pruned: &PrunedGraph,
        components: &[Component],
    ) -> Self {
        let event_count = catalog.len();
        let candidate_edges = graph.edge_count();

        Self {
            event_count,
            excluded_count: catalog.excluded().len(),
            candidate_edges,
            retained_edges: pruned.edge_count(),
            pruned_edges: pruned.pruned_edges,
            duplicate_links: pruned.duplicates.len(),
            root_count: event_count.saturating_sub(candidate_edges),
            cluster_count: components.len(),
            singleton_count: components.iter().filter(|c| c.is_singleton()).count(),
            largest_cluster: components.iter().map(Component::len).max().unwrap_or(0),
            weights: WeightSummary::from_weights(graph.weights()),
        }
    }

    /// Share of candidate edges removed by the threshold.
    ///
    /// Returns 0.0 if there are no candidate edges.
    #[must_use]
    pub fn pruned_ratio(&self) -> f64 {
        compute_ratio(self.pruned_edges, self.candidate_edges)
    }

    /// Return `true` if no two events ended up in the same cluster.
    #[must_use]
    pub const fn is_fully_declustered(&self) -> bool {
        self.cluster_count == self.singleton_count
    }
}

impl WeightSummary {
    /// Summarize a set of weights; `None` for an empty set.
    ///
    /// The median of an even-sized set is the lower middle value, so it is
    /// always an actual edge weight.
    #[must_use]
    pub fn from_weights(weights: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut sorted: Vec<f64> = weights.into_iter().collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        Some(Self {
            min: sorted[0],
            median: sorted[(sorted.len() - 1) / 2],
            max: sorted[sorted.len() - 1],
        })
    }
}

#[allow(clippy::cast_precision_loss)]
fn compute_ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0_f64;
    }
    part as f64 / whole as f64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::NeverCancel;
    use crate::catalog::{Event, RawEvent};
    use crate::edges::EdgeBuilder;
    use crate::graph::components::extract_components;
    use crate::graph::threshold::Thresholder;
    use crate::metric::DistanceKind;

    fn stats_for(catalog: &Catalog, threshold: f64) -> ClusterStats {
        let set = EdgeBuilder::new(catalog, DistanceKind::Planar)
            .build(&NeverCancel)
            .expect("edges");
        let graph = CausalGraph::from_edges(catalog, &set);
        let pruned = Thresholder::new(threshold).expect("valid").prune(&graph);
        let components = extract_components(&pruned);
        ClusterStats::collect(catalog, &graph, &pruned, &components)
    }

    #[test]
    fn empty_catalog_stats() {
        let stats = stats_for(&Catalog::default(), 1.0);
        assert_eq!(stats.event_count, 0);
        assert_eq!(stats.candidate_edges, 0);
        assert_eq!(stats.cluster_count, 0);
        assert_eq!(stats.largest_cluster, 0);
        assert!(stats.weights.is_none());
        assert!((stats.pruned_ratio() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn chain_stats() {
        let catalog = Catalog::from_events([
            Event::new(1, 0.0, 5.0, 0.0, 0.0),
            Event::new(2, 10.0, 3.0, 0.01, 0.01),
            Event::new(3, 20.0, 2.0, 0.01, 0.01),
        ]);
        let stats = stats_for(&catalog, 1e-8);

        assert_eq!(stats.event_count, 3);
        assert_eq!(stats.candidate_edges, 2);
        assert_eq!(stats.retained_edges, 1);
        assert_eq!(stats.pruned_edges, 1);
        assert_eq!(stats.root_count, 1);
        assert_eq!(stats.cluster_count, 2);
        assert_eq!(stats.singleton_count, 1);
        assert_eq!(stats.largest_cluster, 2);
        assert!((stats.pruned_ratio() - 0.5).abs() < 1e-12);

        let weights = stats.weights.expect("weights");
        assert_eq!(weights.min, 0.0);
        assert!(weights.max > 1e-8);
    }

    #[test]
    fn exclusions_are_counted() {
        let catalog = Catalog::from_raw([RawEvent::default(), Event::new(1, 0.0, 1.0, 0.0, 0.0).into()]);
        let stats = stats_for(&catalog, 1.0);
        assert_eq!(stats.excluded_count, 1);
        assert_eq!(stats.event_count, 1);
        assert!(stats.is_fully_declustered());
    }

    #[test]
    fn weight_summary_uses_lower_median() {
        let summary = WeightSummary::from_weights([4.0, 1.0, 3.0, 2.0]).expect("summary");
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.median, 2.0);
        assert_eq!(summary.max, 4.0);
        assert!(WeightSummary::from_weights(std::iter::empty()).is_none());
    }
}
