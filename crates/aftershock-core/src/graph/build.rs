//! Graph construction from parent edges.
//!
//! # Overview
//!
//! Builds a [`petgraph`] directed weighted graph whose vertex set is the
//! full validated catalog and whose edge set is exactly the parent edges
//! produced by the [`EdgeBuilder`](crate::edges::EdgeBuilder). Root events
//! contribute a node but no edge.
//!
//! ## Edge Direction
//!
//! An edge `j → i` means "`i` is the nearest earlier neighbor of `j`", i.e.
//! it points from child to parent. Edge weights are the nearest-neighbor
//! distances.
//!
//! ## Node Indices
//!
//! Nodes are inserted in catalog order, so `NodeIndex::new(p)` is the node
//! of the event at catalog position `p`. Node weights are event ids.
//!
//! ## Content Hash
//!
//! The graph carries a BLAKE3 hash of its edge set (child id, parent id,
//! weight bits), so two runs can be compared without diffing edge lists.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::{debug, instrument};

use crate::catalog::{Catalog, EventId};
use crate::edges::{DuplicateLink, Edge, EdgeSet};

// ---------------------------------------------------------------------------
// CausalGraph
// ---------------------------------------------------------------------------

/// Directed child → parent graph over the whole catalog.
#[derive(Debug, Clone)]
pub struct CausalGraph {
    /// Nodes = event ids (index = catalog position), edges = parent links.
    pub graph: DiGraph<EventId, f64>,
    /// Mapping from event id to petgraph `NodeIndex`.
    pub node_map: HashMap<EventId, NodeIndex>,
    /// Zero-weight links between exact duplicates, carried alongside the
    /// graph since they are not time-ordered edges.
    pub duplicates: Vec<DuplicateLink>,
    /// BLAKE3 content hash of the edge set.
    pub content_hash: String,
}

impl CausalGraph {
    /// Assemble the graph for `catalog` from a parent edge set.
    ///
    /// Edges referring to positions outside the catalog are ignored.
    #[must_use]
    #[instrument(skip(catalog, set), fields(events = catalog.len(), edges = set.edges.len()))]
    pub fn from_edges(catalog: &Catalog, set: &EdgeSet) -> Self {
        let events = catalog.events();

        let mut graph = DiGraph::<EventId, f64>::with_capacity(events.len(), set.edges.len());
        let mut node_map: HashMap<EventId, NodeIndex> = HashMap::with_capacity(events.len());

        for event in events {
            let idx = graph.add_node(event.id);
            node_map.insert(event.id, idx);
        }

        let node_count = graph.node_count();
        for edge in &set.edges {
            if edge.child >= node_count || edge.parent >= node_count {
                continue;
            }
            graph.add_edge(
                NodeIndex::new(edge.child),
                NodeIndex::new(edge.parent),
                edge.weight,
            );
        }

        let content_hash = compute_edge_hash(&graph);
        debug!(nodes = graph.node_count(), edges = graph.edge_count(), "causal graph assembled");

        Self {
            graph,
            node_map,
            duplicates: set.duplicates.clone(),
            content_hash,
        }
    }

    /// Return the number of nodes (events) in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of parent edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up the `NodeIndex` for an event id.
    #[must_use]
    pub fn node_index(&self, id: EventId) -> Option<NodeIndex> {
        self.node_map.get(&id).copied()
    }

    /// Return the event id of a node.
    #[must_use]
    pub fn event_id(&self, idx: NodeIndex) -> Option<EventId> {
        self.graph.node_weight(idx).copied()
    }

    /// Parent edges as catalog positions, in insertion (child) order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        position_edges(&self.graph)
    }

    /// All edge weights, in insertion order.
    pub fn weights(&self) -> impl Iterator<Item = f64> + '_ {
        self.graph.edge_weights().copied()
    }
}

/// Edges of a child → parent graph expressed as catalog positions.
pub(crate) fn position_edges(graph: &DiGraph<EventId, f64>) -> impl Iterator<Item = Edge> + '_ {
    graph.edge_references().map(|e| Edge {
        child: e.source().index(),
        parent: e.target().index(),
        weight: *e.weight(),
    })
}

/// Compute a BLAKE3 hash of the edge list.
fn compute_edge_hash(graph: &DiGraph<EventId, f64>) -> String {
    let mut hasher = blake3::Hasher::new();
    for edge in graph.edge_references() {
        hasher.update(&graph[edge.source()].to_le_bytes());
        hasher.update(&graph[edge.target()].to_le_bytes());
        hasher.update(&edge.weight().to_bits().to_le_bytes());
    }
    format!("blake3:{}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
