//! The structured result handed back to callers.

use std::collections::HashMap;

use serde::Serialize;

use crate::catalog::{EventId, Exclusion};
use crate::cluster::{RankedCluster, Role};
use crate::graph::ClusterStats;
use crate::metric::DistanceKind;

/// Ranked clusters plus everything a caller needs to interpret them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterReport {
    pub threshold: f64,
    pub distance: DistanceKind,
    /// Clusters, largest first.
    pub clusters: Vec<RankedCluster>,
    /// Records that were kept out of the computation.
    pub excluded: Vec<Exclusion>,
    pub stats: ClusterStats,
    /// BLAKE3 hash of the candidate edge set.
    pub edge_hash: String,
}

impl ClusterReport {
    /// Number of clusters in the report.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Cluster containing `id`, if any.
    #[must_use]
    pub fn cluster_of(&self, id: EventId) -> Option<&RankedCluster> {
        self.clusters.iter().find(|c| c.cluster.contains(id))
    }

    /// Map every clustered event to its cluster rank and role.
    #[must_use]
    pub fn assignments(&self) -> HashMap<EventId, (usize, Role)> {
        let mut out = HashMap::new();
        for ranked in &self.clusters {
            let c = &ranked.cluster;
            out.insert(c.mainshock, (ranked.rank, Role::Mainshock));
            for &id in &c.foreshocks {
                out.insert(id, (ranked.rank, Role::Foreshock));
            }
            for &id in &c.aftershocks {
                out.insert(id, (ranked.rank, Role::Aftershock));
            }
        }
        out
    }

    /// BLAKE3 hash of the ranked partition and role assignment.
    ///
    /// Two runs over the same catalog and threshold produce the same
    /// fingerprint; any change in membership, roles, or ranking changes it.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for ranked in &self.clusters {
            let c = &ranked.cluster;
            hasher.update(&(ranked.rank as u64).to_le_bytes());
            hasher.update(&c.mainshock.to_le_bytes());
            for (tag, ids) in [(b'f', &c.foreshocks), (b'a', &c.aftershocks), (b'm', &c.members)] {
                hasher.update(&[tag]);
                for id in ids {
                    hasher.update(&id.to_le_bytes());
                }
            }
            hasher.update(b"\x00");
        }
        format!("blake3:{}", hasher.finalize())
    }
}
