//! End-to-end clustering over one immutable catalog snapshot.
//!
//! ```text
//! Catalog → Edges → Graph → PrunedGraph → Clusters → ClassifiedClusters → RankedClusters
//! ```
//!
//! The pipeline is a pure function of the catalog and the configuration:
//! nothing is cached between runs, and re-running with a new threshold or
//! date window recomputes everything. Only the edge search runs in
//! parallel; the later stages work on the much smaller edge and cluster
//! structures.

use serde::Serialize;
use tracing::{info, instrument};

use crate::cancel::{CancellationCheck, Interrupted, NeverCancel, Stage};
use crate::catalog::Catalog;
use crate::cluster::{classify_all, rank_clusters};
use crate::config::ClusterConfig;
use crate::edges::{EdgeBuilder, EdgeSet};
use crate::error::ClusterError;
use crate::graph::{CausalGraph, ClusterStats, Thresholder, extract_components};
use crate::report::ClusterReport;
use crate::timing::timed;

/// Result of a run that did not fail.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClusterOutcome {
    Complete(ClusterReport),
    /// The caller cancelled the run; no partial result is exposed.
    Incomplete(Interrupted),
}

impl ClusterOutcome {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    /// The report of a complete run.
    #[must_use]
    pub fn report(&self) -> Option<&ClusterReport> {
        match self {
            Self::Complete(report) => Some(report),
            Self::Incomplete(_) => None,
        }
    }

    /// Convert into a plain `Result`, treating cancellation as an error.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::Cancelled`] for an incomplete run.
    pub fn into_result(self) -> Result<ClusterReport, ClusterError> {
        match self {
            Self::Complete(report) => Ok(report),
            Self::Incomplete(interrupted) => Err(ClusterError::Cancelled(interrupted)),
        }
    }
}

/// Configured clustering pipeline.
#[derive(Debug, Clone)]
pub struct ClusterPipeline {
    config: ClusterConfig,
    thresholder: Thresholder,
}

impl ClusterPipeline {
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn new(config: ClusterConfig) -> Result<Self, ClusterError> {
        config.validate()?;
        let thresholder = Thresholder::new(config.threshold)?;
        Ok(Self {
            config,
            thresholder,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Run the pipeline to completion.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::WorkerPool`] if a dedicated worker pool was
    /// requested and could not be started.
    pub fn run(&self, catalog: &Catalog) -> Result<ClusterReport, ClusterError> {
        self.run_with_cancel(catalog, &NeverCancel)?.into_result()
    }

    /// Run the pipeline, polling `cancel` during the edge search and
    /// between stages.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::WorkerPool`] if a dedicated worker pool was
    /// requested and could not be started. Cancellation is not an error; it
    /// yields [`ClusterOutcome::Incomplete`].
    #[instrument(skip(self, catalog, cancel), fields(events = catalog.len(), threshold = self.config.threshold))]
    pub fn run_with_cancel(
        &self,
        catalog: &Catalog,
        cancel: &dyn CancellationCheck,
    ) -> Result<ClusterOutcome, ClusterError> {
        let edge_set = match self.find_edges(catalog, cancel)? {
            Ok(set) => set,
            Err(interrupted) => {
                info!(%interrupted, "clustering cancelled");
                return Ok(ClusterOutcome::Incomplete(interrupted));
            }
        };

        let graph = timed(Stage::Graph, || CausalGraph::from_edges(catalog, &edge_set));
        if let Some(interrupted) = poll(cancel, Stage::Graph, catalog.len()) {
            return Ok(ClusterOutcome::Incomplete(interrupted));
        }

        let pruned = timed(Stage::Threshold, || self.thresholder.prune(&graph));
        let components = timed(Stage::Components, || extract_components(&pruned));
        if let Some(interrupted) = poll(cancel, Stage::Components, catalog.len()) {
            return Ok(ClusterOutcome::Incomplete(interrupted));
        }

        let stats = ClusterStats::collect(catalog, &graph, &pruned, &components);
        let clusters = timed(Stage::Roles, || classify_all(catalog, &components));
        let ranked = timed(Stage::Rank, || rank_clusters(clusters, self.config.limit));

        info!(
            events = stats.event_count,
            excluded = stats.excluded_count,
            clusters = stats.cluster_count,
            largest = stats.largest_cluster,
            retained_edges = stats.retained_edges,
            "clustering complete"
        );

        Ok(ClusterOutcome::Complete(ClusterReport {
            threshold: self.config.threshold,
            distance: self.config.distance,
            clusters: ranked,
            excluded: catalog.excluded().to_vec(),
            stats,
            edge_hash: graph.content_hash,
        }))
    }

    /// Parent search on the configured pool.
    fn find_edges(
        &self,
        catalog: &Catalog,
        cancel: &dyn CancellationCheck,
    ) -> Result<Result<EdgeSet, Interrupted>, ClusterError> {
        let builder = EdgeBuilder::new(catalog, self.config.distance)
            .check_every(self.config.cancel_check_interval);

        if self.config.workers == 0 {
            return Ok(timed(Stage::Edges, || builder.build(cancel)));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .thread_name(|i| format!("aftershock-edges-{i}"))
            .build()?;
        Ok(timed(Stage::Edges, || pool.install(|| builder.build(cancel))))
    }
}

fn poll(cancel: &dyn CancellationCheck, stage: Stage, total: usize) -> Option<Interrupted> {
    cancel.is_cancelled().then_some(Interrupted {
        stage,
        processed: 0,
        total,
    })
}

/// Cluster `catalog` with default settings and the given threshold.
///
/// # Errors
///
/// Returns [`ClusterError::InvalidThreshold`] for a NaN, infinite, or
/// negative threshold.
pub fn cluster_catalog(catalog: &Catalog, threshold: f64) -> Result<ClusterReport, ClusterError> {
    ClusterPipeline::new(ClusterConfig::with_threshold(threshold))?.run(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelFlag;
    use crate::catalog::Event;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scenario() -> Catalog {
        Catalog::from_events([
            Event::new(1, 0.0, 5.0, 0.0, 0.0),
            Event::new(2, 10.0, 3.0, 0.01, 0.01),
            Event::new(3, 20.0, 2.0, 0.01, 0.01),
        ])
    }

    #[test]
    fn empty_catalog_is_complete_and_empty() {
        let report = cluster_catalog(&Catalog::default(), 1.0).expect("run");
        assert!(report.is_empty());
        assert_eq!(report.stats.event_count, 0);
    }

    #[test]
    fn invalid_threshold_is_rejected_up_front() {
        assert!(matches!(
            cluster_catalog(&scenario(), f64::NAN),
            Err(ClusterError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn large_threshold_yields_one_cluster() {
        let report = cluster_catalog(&scenario(), 1.0).expect("run");
        assert_eq!(report.len(), 1);
        let c = &report.clusters[0].cluster;
        assert_eq!(c.mainshock, 1);
        assert_eq!(c.aftershocks, vec![2, 3]);
        assert_eq!(c.edges.len(), 2);
    }

    #[test]
    fn pre_cancelled_flag_returns_incomplete() {
        let flag = CancelFlag::new();
        flag.cancel();
        let pipeline = ClusterPipeline::new(ClusterConfig::default()).expect("pipeline");
        let outcome = pipeline.run_with_cancel(&scenario(), &flag).expect("run");

        assert!(!outcome.is_complete());
        assert!(outcome.report().is_none());
        match outcome.into_result() {
            Err(ClusterError::Cancelled(i)) => assert_eq!(i.stage, Stage::Edges),
            other => panic!("expected cancellation, got {other:?}"),
        }
    }

    #[test]
    fn cancellation_between_stages_is_observed() {
        // Let the edge search finish (one poll at rank 0), then cancel.
        let polls = AtomicUsize::new(0);
        let check = || polls.fetch_add(1, Ordering::SeqCst) >= 1;
        let pipeline = ClusterPipeline::new(ClusterConfig {
            cancel_check_interval: 1_000,
            ..ClusterConfig::default()
        })
        .expect("pipeline");

        let outcome = pipeline.run_with_cancel(&scenario(), &check).expect("run");
        match outcome {
            ClusterOutcome::Incomplete(i) => assert_eq!(i.stage, Stage::Graph),
            ClusterOutcome::Complete(_) => panic!("expected incomplete"),
        }
    }

    #[test]
    fn dedicated_workers_match_global_pool() {
        let catalog = scenario();
        let global = cluster_catalog(&catalog, 1.0).expect("global");
        let pinned = ClusterPipeline::new(ClusterConfig {
            threshold: 1.0,
            workers: 2,
            ..ClusterConfig::default()
        })
        .expect("pipeline")
        .run(&catalog)
        .expect("pinned");

        assert_eq!(global.fingerprint(), pinned.fingerprint());
        assert_eq!(global.edge_hash, pinned.edge_hash);
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let report = cluster_catalog(&scenario(), 1.0).expect("run");
        let json = serde_json::to_value(ClusterOutcome::Complete(report)).expect("json");
        assert_eq!(json["status"], "complete");
        assert_eq!(json["clusters"][0]["mainshock"], 1);
    }
}
