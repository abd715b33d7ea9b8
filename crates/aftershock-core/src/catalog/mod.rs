//! Immutable catalog snapshots.
//!
//! A [`Catalog`] is the only input to the clustering pipeline. It is built
//! once from caller-supplied records, validated at construction time, and
//! never mutated afterwards. Every pipeline stage refers to events by their
//! *position* in [`Catalog::events`]; ids only reappear in the final report.

pub mod event;
pub mod validate;

use tracing::{instrument, warn};

pub use event::{Event, EventId, RawEvent};
pub use validate::{Exclusion, ExclusionReason, validate_event};

/// A validated, ordered collection of events.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    events: Vec<Event>,
    excluded: Vec<Exclusion>,
}

impl Catalog {
    /// Build a catalog from raw records, excluding malformed ones.
    ///
    /// Exclusions never abort the load; they are listed in
    /// [`Catalog::excluded`] with the position of the offending record.
    #[instrument(skip(raw))]
    pub fn from_raw(raw: impl IntoIterator<Item = RawEvent>) -> Self {
        let (events, excluded) = validate::partition_raw(raw);

        for exclusion in &excluded {
            warn!(
                position = exclusion.position,
                id = ?exclusion.id,
                reason = %exclusion.reason,
                "excluding event from catalog"
            );
        }

        Self { events, excluded }
    }

    /// Build a catalog from already-typed events.
    ///
    /// The events still go through validation: non-finite values and
    /// out-of-range coordinates are excluded just like raw records.
    pub fn from_events(events: impl IntoIterator<Item = Event>) -> Self {
        Self::from_raw(events.into_iter().map(RawEvent::from))
    }

    /// Validated events in catalog order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Records rejected at the boundary.
    #[must_use]
    pub fn excluded(&self) -> &[Exclusion] {
        &self.excluded
    }

    /// Number of validated events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Return `true` if no event survived validation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Event at a catalog position.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Event> {
        self.events.get(position)
    }

    /// Return a new catalog restricted to `start ≤ timestamp ≤ end`.
    ///
    /// Catalog order is preserved. Exclusions of the parent catalog carry
    /// over unchanged since they describe the original input.
    #[must_use]
    pub fn window(&self, start: f64, end: f64) -> Self {
        let events = self
            .events
            .iter()
            .filter(|e| e.timestamp >= start && e.timestamp <= end)
            .copied()
            .collect();

        Self {
            events,
            excluded: self.excluded.clone(),
        }
    }

    /// Earliest and latest timestamps, or `None` for an empty catalog.
    #[must_use]
    pub fn time_span(&self) -> Option<(f64, f64)> {
        self.events.iter().fold(None, |acc, e| match acc {
            None => Some((e.timestamp, e.timestamp)),
            Some((lo, hi)) => Some((lo.min(e.timestamp), hi.max(e.timestamp))),
        })
    }
}
