//! Boundary validation of raw events.
//!
//! Malformed records are filtered here, before any pipeline stage runs, so
//! that no later stage discovers invalid input mid-computation. Rejected
//! records are kept as [`Exclusion`]s and reported back to the caller.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use super::event::{Event, EventId, RawEvent};

/// Why a raw event was kept out of the computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum ExclusionReason {
    MissingField(&'static str),
    NonFinite(&'static str),
    LatitudeOutOfRange,
    LongitudeOutOfRange,
    DuplicateId,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing field `{field}`"),
            Self::NonFinite(field) => write!(f, "non-finite value in `{field}`"),
            Self::LatitudeOutOfRange => f.write_str("latitude outside [-90, 90]"),
            Self::LongitudeOutOfRange => f.write_str("longitude outside [-180, 180]"),
            Self::DuplicateId => f.write_str("id already used by an earlier event"),
        }
    }
}

/// A raw event that did not make it into the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Exclusion {
    /// Position of the record in the input sequence.
    pub position: usize,
    /// The record's id, when it had one.
    pub id: Option<EventId>,
    pub reason: ExclusionReason,
}

/// Validate a single raw record.
///
/// # Errors
///
/// Returns the first problem found, checking fields in declaration order.
pub fn validate_event(raw: &RawEvent) -> Result<Event, ExclusionReason> {
    let id = raw.id.ok_or(ExclusionReason::MissingField("id"))?;
    let timestamp = finite("timestamp", raw.timestamp)?;
    let magnitude = finite("magnitude", raw.magnitude)?;
    let latitude = finite("latitude", raw.latitude)?;
    let longitude = finite("longitude", raw.longitude)?;

    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ExclusionReason::LatitudeOutOfRange);
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ExclusionReason::LongitudeOutOfRange);
    }

    Ok(Event {
        id,
        timestamp,
        magnitude,
        latitude,
        longitude,
    })
}

/// Validate a sequence of raw records, splitting accepted events from
/// exclusions. Accepted events keep their relative input order.
///
/// The first record carrying a given id wins; later records reusing it are
/// excluded with [`ExclusionReason::DuplicateId`].
pub(crate) fn partition_raw(
    raw: impl IntoIterator<Item = RawEvent>,
) -> (Vec<Event>, Vec<Exclusion>) {
    let mut events = Vec::new();
    let mut excluded = Vec::new();
    let mut seen: HashSet<EventId> = HashSet::new();

    for (position, record) in raw.into_iter().enumerate() {
        let outcome = validate_event(&record).and_then(|event| {
            if seen.insert(event.id) {
                Ok(event)
            } else {
                Err(ExclusionReason::DuplicateId)
            }
        });

        match outcome {
            Ok(event) => events.push(event),
            Err(reason) => excluded.push(Exclusion {
                position,
                id: record.id,
                reason,
            }),
        }
    }

    (events, excluded)
}

fn finite(field: &'static str, value: Option<f64>) -> Result<f64, ExclusionReason> {
    match value {
        None => Err(ExclusionReason::MissingField(field)),
        Some(v) if !v.is_finite() => Err(ExclusionReason::NonFinite(field)),
        Some(v) => Ok(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: u64, t: f64, m: f64, lat: f64, lon: f64) -> RawEvent {
        RawEvent {
            id: Some(id),
            timestamp: Some(t),
            magnitude: Some(m),
            latitude: Some(lat),
            longitude: Some(lon),
        }
    }

    #[test]
    fn accepts_complete_record() {
        let event = validate_event(&raw(1, 0.0, 4.2, 35.0, -118.0)).expect("valid");
        assert_eq!(event.id, 1);
        assert!((event.magnitude - 4.2).abs() < f64::EPSILON);
    }

    #[test]
    fn reports_missing_fields_in_order() {
        let mut r = raw(1, 0.0, 1.0, 0.0, 0.0);
        r.magnitude = None;
        r.latitude = None;
        assert_eq!(
            validate_event(&r),
            Err(ExclusionReason::MissingField("magnitude"))
        );

        let no_id = RawEvent {
            id: None,
            ..raw(1, 0.0, 1.0, 0.0, 0.0)
        };
        assert_eq!(validate_event(&no_id), Err(ExclusionReason::MissingField("id")));
    }

    #[test]
    fn rejects_non_finite_values() {
        assert_eq!(
            validate_event(&raw(1, f64::NAN, 1.0, 0.0, 0.0)),
            Err(ExclusionReason::NonFinite("timestamp"))
        );
        assert_eq!(
            validate_event(&raw(1, 0.0, f64::INFINITY, 0.0, 0.0)),
            Err(ExclusionReason::NonFinite("magnitude"))
        );
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert_eq!(
            validate_event(&raw(1, 0.0, 1.0, 90.5, 0.0)),
            Err(ExclusionReason::LatitudeOutOfRange)
        );
        assert_eq!(
            validate_event(&raw(1, 0.0, 1.0, 0.0, -181.0)),
            Err(ExclusionReason::LongitudeOutOfRange)
        );
    }

    #[test]
    fn partition_keeps_order_and_reports_positions() {
        let input = vec![
            raw(1, 0.0, 1.0, 0.0, 0.0),
            RawEvent::default(),
            raw(2, 1.0, 1.0, 0.0, 0.0),
            raw(1, 2.0, 1.0, 0.0, 0.0),
        ];

        let (events, excluded) = partition_raw(input);
        assert_eq!(events.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(excluded.len(), 2);
        assert_eq!(excluded[0].position, 1);
        assert_eq!(excluded[0].reason, ExclusionReason::MissingField("id"));
        assert_eq!(excluded[1].position, 3);
        assert_eq!(excluded[1].id, Some(1));
        assert_eq!(excluded[1].reason, ExclusionReason::DuplicateId);
    }
}
