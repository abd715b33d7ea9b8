//! Connected components of the pruned graph.
//!
//! Edge direction is ignored: two events share a cluster when they are
//! connected, directly or transitively, by retained parent edges or
//! duplicate links. Components are found with a union-find over catalog
//! positions, which keeps this stage near-linear in the number of events.
//!
//! # Ordering
//!
//! Components are returned in *discovery order*: sorted by the smallest
//! catalog position among their members. Members, edges, and duplicate
//! links inside a component are listed in catalog order of the child.
//! The result depends only on the edge set.

use tracing::{debug, instrument};

use crate::edges::{DuplicateLink, Edge};
use crate::graph::threshold::PrunedGraph;

// ---------------------------------------------------------------------------
// UnionFind
// ---------------------------------------------------------------------------

/// Disjoint-set forest with path compression and union by rank.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    /// `n` singleton sets `{0}, {1}, …, {n-1}`.
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    /// Representative of `x`'s set.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }

        root
    }

    /// Merge the sets of `a` and `b`. Returns `false` if they were already joined.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let mut ra = self.find(a);
        let mut rb = self.find(b);
        if ra == rb {
            return false;
        }
        if self.rank[ra] < self.rank[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        if self.rank[ra] == self.rank[rb] {
            self.rank[ra] = self.rank[ra].saturating_add(1);
        }
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// One connected component, before role classification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Component {
    /// Member catalog positions, ascending.
    pub members: Vec<usize>,
    /// Retained parent edges whose endpoints lie in this component.
    pub edges: Vec<Edge>,
    /// Duplicate links inside this component.
    pub duplicates: Vec<DuplicateLink>,
}

impl Component {
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

/// Split the pruned graph into connected components, singletons included.
#[must_use]
#[instrument(skip(pruned), fields(nodes = pruned.node_count(), edges = pruned.edge_count()))]
pub fn extract_components(pruned: &PrunedGraph) -> Vec<Component> {
    let n = pruned.node_count();
    let mut sets = UnionFind::new(n);

    for edge in pruned.edges() {
        sets.union(edge.child, edge.parent);
    }
    for link in &pruned.duplicates {
        if link.duplicate < n && link.original < n {
            sets.union(link.duplicate, link.original);
        }
    }

    // Walking positions in ascending order assigns component slots in
    // discovery order and fills members already sorted.
    let mut slot_of_root: Vec<Option<usize>> = vec![None; n];
    let mut slot_of: Vec<usize> = Vec::with_capacity(n);
    let mut components: Vec<Component> = Vec::new();

    for position in 0..n {
        let root = sets.find(position);
        let slot = *slot_of_root[root].get_or_insert_with(|| {
            components.push(Component::default());
            components.len() - 1
        });
        components[slot].members.push(position);
        slot_of.push(slot);
    }

    for edge in pruned.edges() {
        components[slot_of[edge.child]].edges.push(edge);
    }
    for link in &pruned.duplicates {
        if let Some(&slot) = slot_of.get(link.duplicate) {
            components[slot].duplicates.push(*link);
        }
    }

    debug!(components = components.len(), "components extracted");
    components
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Event};
    use crate::edges::EdgeSet;
    use crate::graph::build::CausalGraph;
    use crate::graph::threshold::Thresholder;
    use petgraph::algo::connected_components;

    fn pruned_from(n: usize, edges: &[(usize, usize, f64)], dups: &[(usize, usize)]) -> PrunedGraph {
        let catalog = Catalog::from_events((0..n).map(|i| {
            let t = i as f64;
            Event::new(i as u64, t, 2.0, 0.0, 0.0)
        }));
        let set = EdgeSet {
            edges: edges
                .iter()
                .map(|&(child, parent, weight)| Edge {
                    child,
                    parent,
                    weight,
                })
                .collect(),
            duplicates: dups
                .iter()
                .map(|&(duplicate, original)| DuplicateLink {
                    duplicate,
                    original,
                })
                .collect(),
            roots: 0,
        };
        let graph = CausalGraph::from_edges(&catalog, &set);
        Thresholder::new(1.0).expect("valid").prune(&graph)
    }

    #[test]
    fn union_find_merges_and_reports() {
        let mut uf = UnionFind::new(4);
        assert!(uf.union(0, 1));
        assert!(uf.union(2, 3));
        assert!(!uf.union(1, 0));
        assert_eq!(uf.find(0), uf.find(1));
        assert_ne!(uf.find(1), uf.find(2));
        assert!(uf.union(1, 3));
        assert_eq!(uf.find(0), uf.find(2));
        assert_eq!(uf.len(), 4);
    }

    #[test]
    fn long_chain_does_not_overflow() {
        let n = 100_000;
        let mut uf = UnionFind::new(n);
        for i in 1..n {
            uf.union(i, i - 1);
        }
        let root = uf.find(0);
        assert!((0..n).all(|i| uf.find(i) == root));
    }

    #[test]
    fn empty_graph_has_no_components() {
        assert!(extract_components(&pruned_from(0, &[], &[])).is_empty());
    }

    #[test]
    fn isolated_events_are_singletons() {
        let comps = extract_components(&pruned_from(3, &[], &[]));
        assert_eq!(comps.len(), 3);
        assert!(comps.iter().all(Component::is_singleton));
        assert_eq!(comps[2].members, vec![2]);
    }

    #[test]
    fn components_in_discovery_order() {
        // {0, 3}, {1}, {2, 4}
        let comps = extract_components(&pruned_from(
            5,
            &[(3, 0, 0.1), (4, 2, 0.2)],
            &[],
        ));
        let members: Vec<_> = comps.iter().map(|c| c.members.clone()).collect();
        assert_eq!(members, vec![vec![0, 3], vec![1], vec![2, 4]]);
        assert_eq!(comps[0].edges.len(), 1);
        assert_eq!(comps[2].edges[0].child, 4);
    }

    #[test]
    fn pruned_edges_split_components() {
        // weight 5.0 exceeds the test threshold of 1.0
        let comps = extract_components(&pruned_from(3, &[(1, 0, 5.0), (2, 1, 0.5)], &[]));
        let members: Vec<_> = comps.iter().map(|c| c.members.clone()).collect();
        assert_eq!(members, vec![vec![0], vec![1, 2]]);
    }

    #[test]
    fn duplicate_links_join_components() {
        let comps = extract_components(&pruned_from(3, &[], &[(2, 0)]));
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].members, vec![0, 2]);
        assert_eq!(comps[0].duplicates.len(), 1);
    }

    #[test]
    fn agrees_with_petgraph_connected_components() {
        let edges = [(1, 0, 0.1), (2, 0, 0.1), (5, 4, 0.1), (7, 6, 0.9), (8, 7, 0.3)];
        let pruned = pruned_from(10, &edges, &[]);
        let comps = extract_components(&pruned);
        assert_eq!(comps.len(), connected_components(&pruned.graph));
    }
}
