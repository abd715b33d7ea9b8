#![forbid(unsafe_code)]
//! aftershock-core library.
//!
//! Groups a catalog of seismic events into clusters of causally linked
//! events (mainshock, foreshocks, aftershocks) using the space-time-magnitude
//! nearest-neighbor metric.
//!
//! ## Pipeline
//!
//! ```text
//! Catalog (validated, immutable)
//!        ↓  edges::EdgeBuilder::build()          (parallel, cancellable)
//! EdgeSet (one best earlier parent per event)
//!        ↓  graph::CausalGraph::from_edges()
//! CausalGraph (DiGraph<EventId, f64>, child → parent)
//!        ↓  graph::Thresholder::prune()          (keep iff weight ≤ τ)
//! PrunedGraph
//!        ↓  graph::extract_components()          (union-find)
//! Vec<Component>
//!        ↓  cluster::classify()                  (mainshock / fore / after)
//!        ↓  cluster::rank_clusters()             (size descending, stable)
//! ClusterReport
//! ```
//!
//! [`pipeline::ClusterPipeline`] drives the whole chain.
//!
//! # Conventions
//!
//! - **Errors**: [`error::ClusterError`] for pipeline failures, `anyhow::Result`
//!   for file-backed configuration loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod cancel;
pub mod catalog;
pub mod cluster;
pub mod config;
pub mod edges;
pub mod error;
pub mod graph;
pub mod metric;
pub mod pipeline;
pub mod report;
pub mod timing;

pub use catalog::{Catalog, Event, EventId, RawEvent};
pub use config::ClusterConfig;
pub use error::{ClusterError, ErrorCode};
pub use metric::DistanceKind;
pub use pipeline::{ClusterOutcome, ClusterPipeline, cluster_catalog};
pub use report::ClusterReport;
