//! Event records as they enter and travel through the clustering core.

use serde::{Deserialize, Serialize};

/// Opaque caller-assigned identifier used to rejoin full display records.
pub type EventId = u64;

/// A validated seismic event.
///
/// All numeric fields are finite; latitude is within `[-90, 90]` and
/// longitude within `[-180, 180]`. Instances are only produced by
/// [`Catalog`](super::Catalog) validation, never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    /// Origin time in seconds on a monotonic scale (typically Unix epoch).
    pub timestamp: f64,
    pub magnitude: f64,
    pub latitude: f64,
    pub longitude: f64,
}

impl Event {
    /// Convenience constructor, mostly for tests and benches.
    #[must_use]
    pub const fn new(
        id: EventId,
        timestamp: f64,
        magnitude: f64,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            id,
            timestamp,
            magnitude,
            latitude,
            longitude,
        }
    }

    /// Two events are exact duplicates when they share origin time and epicenter.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_duplicate_of(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp
            && self.latitude == other.latitude
            && self.longitude == other.longitude
    }
}

impl From<Event> for RawEvent {
    fn from(event: Event) -> Self {
        Self {
            id: Some(event.id),
            timestamp: Some(event.timestamp),
            magnitude: Some(event.magnitude),
            latitude: Some(event.latitude),
            longitude: Some(event.longitude),
        }
    }
}

/// An event as handed over by the catalog-loading collaborator.
///
/// Every field is optional so that incomplete records survive
/// deserialization and can be reported as exclusions instead of aborting
/// the whole load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub id: Option<EventId>,
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub magnitude: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}
