//! Classified and ranked clusters.
//!
//! A [`Cluster`] is one connected component of the pruned graph, expressed
//! in event ids and split into mainshock, foreshocks, and aftershocks by
//! [`roles::classify`]. [`rank::rank_clusters`] then orders clusters by size.

pub mod rank;
pub mod roles;

use std::fmt;

use serde::Serialize;

use crate::catalog::EventId;

pub use rank::{RankedCluster, rank_clusters};
pub use roles::{classify, classify_all, select_mainshock};

/// Role of an event within its cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Mainshock,
    Foreshock,
    Aftershock,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mainshock => "mainshock",
            Self::Foreshock => "foreshock",
            Self::Aftershock => "aftershock",
        })
    }
}

/// A retained parent edge, in event ids.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClusterEdge {
    pub child: EventId,
    pub parent: EventId,
    pub weight: f64,
}

/// Exact-duplicate pair, in event ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DuplicatePair {
    pub duplicate: EventId,
    pub original: EventId,
}

/// One cluster with its role assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub mainshock: EventId,
    /// Members before the mainshock, ascending by time.
    pub foreshocks: Vec<EventId>,
    /// Members at or after the mainshock's time, ascending by time.
    pub aftershocks: Vec<EventId>,
    /// All members in catalog order.
    pub members: Vec<EventId>,
    /// Retained edges, for drawing links between members.
    pub edges: Vec<ClusterEdge>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub duplicates: Vec<DuplicatePair>,
}

impl Cluster {
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

    #[must_use]
    pub fn contains(&self, id: EventId) -> bool {
        self.members.contains(&id)
    }

    /// Role of `id`, or `None` if it is not a member.
    #[must_use]
    pub fn role_of(&self, id: EventId) -> Option<Role> {
        if self.mainshock == id {
            Some(Role::Mainshock)
        } else if self.foreshocks.contains(&id) {
            Some(Role::Foreshock)
        } else if self.aftershocks.contains(&id) {
            Some(Role::Aftershock)
        } else {
            None
        }
    }
}
