//! Size ranking of clusters.

use std::cmp::Reverse;

use serde::Serialize;
use tracing::instrument;

use crate::cluster::Cluster;

/// A cluster with its 1-based position in the size ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCluster {
    pub rank: usize,
    #[serde(flatten)]
    pub cluster: Cluster,
}

/// Order clusters by member count, largest first.
///
/// The sort is stable, so equally sized clusters keep their discovery
/// order. `limit` truncates the ranked list; `None` keeps everything.
#[must_use]
#[instrument(skip(clusters), fields(clusters = clusters.len()))]
pub fn rank_clusters(mut clusters: Vec<Cluster>, limit: Option<usize>) -> Vec<RankedCluster> {
    clusters.sort_by_key(|c| Reverse(c.len()));
    if let Some(limit) = limit {
        clusters.truncate(limit);
    }

    clusters
        .into_iter()
        .enumerate()
        .map(|(i, cluster)| RankedCluster {
            rank: i + 1,
            cluster,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(mainshock: u64, size: u64) -> Cluster {
        let members: Vec<u64> = (mainshock..mainshock + size).collect();
        Cluster {
            mainshock,
            foreshocks: vec![],
            aftershocks: members[1..].to_vec(),
            members,
            edges: vec![],
            duplicates: vec![],
        }
    }

    #[test]
    fn largest_first_with_stable_ties() {
        let ranked = rank_clusters(
            vec![cluster(1, 1), cluster(10, 3), cluster(20, 1), cluster(30, 3)],
            None,
        );
        let order: Vec<_> = ranked.iter().map(|r| r.cluster.mainshock).collect();
        assert_eq!(order, vec![10, 30, 1, 20]);
        let ranks: Vec<_> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn limit_truncates_after_ranking() {
        let ranked = rank_clusters(vec![cluster(1, 1), cluster(10, 4)], Some(1));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].cluster.mainshock, 10);
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(rank_clusters(vec![], Some(3)).is_empty());
    }

    #[test]
    fn serializes_flat() {
        let ranked = rank_clusters(vec![cluster(5, 2)], None);
        let json = serde_json::to_value(&ranked[0]).expect("serialize");
        assert_eq!(json["rank"], 1);
        assert_eq!(json["mainshock"], 5);
        assert!(json.get("duplicates").is_none());
    }
}
