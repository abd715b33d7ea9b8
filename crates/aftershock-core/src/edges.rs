//! Best-parent search: one causal edge per event.
//!
//! # Overview
//!
//! Events are visited in ascending `(timestamp, catalog position)` order.
//! For each event `j`, the candidate parents are all events with a strictly
//! earlier timestamp; the parent is the candidate minimizing the
//! [nearest-neighbor distance](crate::metric::nearest_neighbor_distance).
//! Ties go to the earliest catalog position. An event without candidates is
//! a *root* and emits no edge.
//!
//! ## Edge Direction
//!
//! An [`Edge`] points from the later event (child) to its earlier parent.
//! Since parents are strictly earlier, the edge set is acyclic by
//! construction and contains no self-loops.
//!
//! ## Exact Duplicates
//!
//! Events sharing both origin time and epicenter cannot be linked by an
//! edge (neither is strictly earlier). Each such event instead gets a
//! zero-weight [`DuplicateLink`] to the first event of its duplicate group,
//! which keeps them in the same cluster regardless of threshold.
//!
//! ## Parallelism
//!
//! Every child's search reads the shared, immutable sorted catalog and
//! writes only its own output slot, so the work is a plain
//! `par_iter().map().collect()` with no locks. The result does not depend
//! on the rayon schedule.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::cancel::{CancellationCheck, Interrupted, Stage};
use crate::catalog::Catalog;
use crate::metric::{DistanceKind, nearest_neighbor_distance};

/// Default number of children processed between cancellation polls.
pub const DEFAULT_CHECK_INTERVAL: usize = 256;

/// Directed link from a child event to its best earlier parent.
///
/// `child` and `parent` are catalog positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Edge {
    pub child: usize,
    pub parent: usize,
    pub weight: f64,
}

/// Zero-weight link between exact duplicates (same time, same epicenter).
///
/// `original` is the first event of the duplicate group in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DuplicateLink {
    pub duplicate: usize,
    pub original: usize,
}

/// Output of [`EdgeBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct EdgeSet {
    /// Parent edges, ordered by child position.
    pub edges: Vec<Edge>,
    /// Links between exact duplicates, ordered by duplicate position.
    pub duplicates: Vec<DuplicateLink>,
    /// Number of events with no earlier candidate.
    pub roots: usize,
}

/// Per-child search result, written into the child's own slot.
#[derive(Debug, Clone, Copy, Default)]
struct ChildLinks {
    parent: Option<(usize, f64)>,
    original: Option<usize>,
}

/// Finds each event's minimal-weight earlier parent.
#[derive(Debug, Clone, Copy)]
pub struct EdgeBuilder<'a> {
    catalog: &'a Catalog,
    distance: DistanceKind,
    check_interval: usize,
}

impl<'a> EdgeBuilder<'a> {
    #[must_use]
    pub const fn new(catalog: &'a Catalog, distance: DistanceKind) -> Self {
        Self {
            catalog,
            distance,
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }

    /// Poll the cancellation check every `interval` children (minimum 1).
    #[must_use]
    pub fn check_every(mut self, interval: usize) -> Self {
        self.check_interval = interval.max(1);
        self
    }

    /// Run the search on the current rayon pool.
    ///
    /// Wrap the call in [`rayon::ThreadPool::install`] to pin it to a
    /// dedicated pool.
    ///
    /// # Errors
    ///
    /// Returns [`Interrupted`] if `cancel` fired before every child was
    /// processed. No partial edge set is returned in that case.
    #[instrument(skip(self, cancel), fields(events = self.catalog.len(), distance = %self.distance))]
    pub fn build(&self, cancel: &dyn CancellationCheck) -> Result<EdgeSet, Interrupted> {
        let events = self.catalog.events();
        let total = events.len();

        let order = time_order(self.catalog);
        let sorted_times: Vec<f64> = order.iter().map(|&p| events[p].timestamp).collect();

        let aborted = AtomicBool::new(false);
        let processed = AtomicUsize::new(0);

        let slots: Vec<Option<ChildLinks>> = (0..total)
            .into_par_iter()
            .map(|rank| {
                if aborted.load(Ordering::Relaxed) {
                    return None;
                }
                if rank % self.check_interval == 0 && cancel.is_cancelled() {
                    aborted.store(true, Ordering::Relaxed);
                    return None;
                }

                let links = self.links_for(rank, &order, &sorted_times);
                processed.fetch_add(1, Ordering::Relaxed);
                Some(links)
            })
            .collect();

        if aborted.load(Ordering::Relaxed) {
            return Err(Interrupted {
                stage: Stage::Edges,
                processed: processed.load(Ordering::Relaxed),
                total,
            });
        }

        // Slots are indexed by time rank; re-key them by catalog position.
        let mut by_position = vec![ChildLinks::default(); total];
        for (rank, slot) in slots.into_iter().enumerate() {
            if let Some(links) = slot {
                by_position[order[rank]] = links;
            }
        }

        let mut set = EdgeSet::default();
        for (child, links) in by_position.into_iter().enumerate() {
            match links.parent {
                Some((parent, weight)) => set.edges.push(Edge {
                    child,
                    parent,
                    weight,
                }),
                None => set.roots += 1,
            }
            if let Some(original) = links.original {
                set.duplicates.push(DuplicateLink {
                    duplicate: child,
                    original,
                });
            }
        }

        debug!(
            edges = set.edges.len(),
            duplicates = set.duplicates.len(),
            roots = set.roots,
            "parent search complete"
        );

        Ok(set)
    }

    /// Best parent and duplicate original for the child at time rank `rank`.
    fn links_for(&self, rank: usize, order: &[usize], sorted_times: &[f64]) -> ChildLinks {
        let events = self.catalog.events();
        let child_pos = order[rank];
        let child = &events[child_pos];

        // Candidates are exactly the prefix with strictly smaller timestamps.
        let earlier = sorted_times.partition_point(|&t| t < child.timestamp);

        let mut best: Option<(usize, f64)> = None;
        for &candidate in &order[..earlier] {
            let weight = nearest_neighbor_distance(&events[candidate], child, self.distance);
            best = match best {
                None => Some((candidate, weight)),
                Some((best_pos, best_weight)) => match weight.total_cmp(&best_weight) {
                    CmpOrdering::Less => Some((candidate, weight)),
                    CmpOrdering::Equal if candidate < best_pos => Some((candidate, weight)),
                    _ => best,
                },
            };
        }

        // Same-timestamp events ranked before this one, in catalog order.
        let original = order[earlier..rank]
            .iter()
            .copied()
            .find(|&p| events[p].is_duplicate_of(child));

        ChildLinks {
            parent: best,
            original,
        }
    }
}

/// Catalog positions sorted by `(timestamp, position)`.
fn time_order(catalog: &Catalog) -> Vec<usize> {
    let events = catalog.events();
    let mut order: Vec<usize> = (0..events.len()).collect();
    // Stable sort keeps catalog order among equal timestamps.
    order.sort_by(|&a, &b| events[a].timestamp.total_cmp(&events[b].timestamp));
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::NeverCancel;
    use crate::catalog::Event;

    fn build(events: Vec<Event>) -> EdgeSet {
        let catalog = Catalog::from_events(events);
        EdgeBuilder::new(&catalog, DistanceKind::Planar)
            .build(&NeverCancel)
            .expect("not cancelled")
    }

    #[test]
    fn empty_catalog_has_no_edges() {
        let set = build(vec![]);
        assert!(set.edges.is_empty());
        assert!(set.duplicates.is_empty());
        assert_eq!(set.roots, 0);
    }

    #[test]
    fn single_event_is_root() {
        let set = build(vec![Event::new(1, 0.0, 3.0, 0.0, 0.0)]);
        assert!(set.edges.is_empty());
        assert_eq!(set.roots, 1);
    }

    #[test]
    fn picks_minimal_weight_parent() {
        // C is much closer to B than to A, and B is not much smaller.
        let set = build(vec![
            Event::new(1, 0.0, 3.0, 0.0, 0.0),
            Event::new(2, 10.0, 3.0, 1.0, 1.0),
            Event::new(3, 20.0, 2.0, 1.01, 1.01),
        ]);

        assert_eq!(set.edges.len(), 2);
        assert_eq!(set.edges[0].child, 1);
        assert_eq!(set.edges[0].parent, 0);
        assert_eq!(set.edges[1].child, 2);
        assert_eq!(set.edges[1].parent, 1);
    }

    #[test]
    fn unsorted_catalog_is_handled_by_time() {
        // Catalog order is reversed in time.
        let set = build(vec![
            Event::new(3, 20.0, 2.0, 0.0, 0.1),
            Event::new(2, 10.0, 3.0, 0.0, 0.1),
            Event::new(1, 0.0, 5.0, 0.0, 0.0),
        ]);

        assert_eq!(set.roots, 1);
        for edge in &set.edges {
            assert!(edge.child < 2, "position 2 is the earliest event");
        }
        let events = [20.0, 10.0, 0.0];
        for edge in &set.edges {
            assert!(events[edge.parent] < events[edge.child]);
        }
    }

    #[test]
    fn ties_go_to_earliest_catalog_position() {
        // Two candidate parents at identical time, magnitude and distance.
        let set = build(vec![
            Event::new(10, 0.0, 3.0, 0.0, 1.0),
            Event::new(11, 0.0, 3.0, 0.0, -1.0),
            Event::new(12, 5.0, 2.0, 0.0, 0.0),
        ]);

        let child = set.edges.iter().find(|e| e.child == 2).expect("edge for child");
        assert_eq!(child.parent, 0);
    }

    #[test]
    fn same_timestamp_events_are_not_candidates() {
        let set = build(vec![
            Event::new(1, 5.0, 3.0, 0.0, 0.0),
            Event::new(2, 5.0, 2.0, 0.5, 0.5),
        ]);
        assert!(set.edges.is_empty());
        assert!(set.duplicates.is_empty());
        assert_eq!(set.roots, 2);
    }

    #[test]
    fn exact_duplicates_are_linked_to_first_occurrence() {
        let set = build(vec![
            Event::new(1, 5.0, 3.0, 0.2, 0.2),
            Event::new(2, 5.0, 3.0, 0.2, 0.2),
            Event::new(3, 5.0, 2.5, 0.2, 0.2),
        ]);

        assert_eq!(
            set.duplicates,
            vec![
                DuplicateLink {
                    duplicate: 1,
                    original: 0
                },
                DuplicateLink {
                    duplicate: 2,
                    original: 0
                },
            ]
        );
    }

    #[test]
    fn cancellation_returns_interrupted() {
        let catalog = Catalog::from_events(
            (0..64_u32).map(|i| Event::new(u64::from(i), f64::from(i), 2.0, 0.0, 0.0)),
        );
        let err = EdgeBuilder::new(&catalog, DistanceKind::Planar)
            .check_every(1)
            .build(&|| true)
            .expect_err("cancelled");

        assert_eq!(err.stage, Stage::Edges);
        assert_eq!(err.total, 64);
        assert!(err.processed < 64);
    }

    #[test]
    fn dedicated_pool_matches_global_pool() {
        let catalog = Catalog::from_events((0..200_u32).map(|i| {
            let x = f64::from(i);
            Event::new(
                u64::from(i),
                (x * 7.3) % 101.0,
                1.0 + (x % 5.0),
                (x * 0.37) % 3.0,
                (x * 0.91) % 4.0,
            )
        }));
        let builder = EdgeBuilder::new(&catalog, DistanceKind::Planar);

        let global = builder.build(&NeverCancel).expect("global");
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(3)
            .build()
            .expect("pool");
        let pinned = pool.install(|| builder.build(&NeverCancel)).expect("pinned");

        assert_eq!(global.edges, pinned.edges);
        assert_eq!(global.duplicates, pinned.duplicates);
        assert_eq!(global.roots, pinned.roots);
    }
}
