//! Space-time-magnitude nearest-neighbor metric.
//!
//! For an earlier event `i` and a later event `j`:
//!
//! ```text
//! d(i, j) = (t_j − t_i) · r(i, j)^1.6 · 10^(−m_i)
//! ```
//!
//! where `r` is the epicentral distance and `m_i` the earlier event's
//! magnitude. Smaller values mean `j` is more likely a direct descendant
//! of `i`. The exponent and the base-10 magnitude scaling are empirical
//! constants and are kept exactly as calibrated.
//!
//! ## Distance
//!
//! [`DistanceKind::Planar`] (the default) measures Euclidean distance in
//! coordinate degrees, which is what threshold values in existing
//! dashboards were tuned against. [`DistanceKind::Haversine`] measures
//! great-circle kilometres and is opt-in; thresholds are not comparable
//! between the two.
//!
//! ## Degenerate pairs
//!
//! The metric is total over validated events: a non-positive time gap or a
//! zero distance yields exactly `0.0`, and overflow saturates at
//! [`f64::MAX`]. It never returns NaN or infinity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::Event;

/// Fractal exponent applied to the epicentral distance.
pub const DISTANCE_EXPONENT: f64 = 1.6;

/// Mean Earth radius used by [`DistanceKind::Haversine`], in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// How epicentral distance is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceKind {
    /// Euclidean distance in degrees: `sqrt(Δlat² + Δlon²)`.
    #[default]
    Planar,
    /// Great-circle distance in kilometres.
    Haversine,
}

impl DistanceKind {
    /// Distance between two epicenters.
    #[must_use]
    pub fn between(self, a: &Event, b: &Event) -> f64 {
        match self {
            Self::Planar => planar_degrees(a, b),
            Self::Haversine => haversine_km(a, b),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planar => "planar",
            Self::Haversine => "haversine",
        }
    }
}

impl fmt::Display for DistanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "planar" | "euclidean" => Ok(Self::Planar),
            "haversine" | "geodesic" => Ok(Self::Haversine),
            other => Err(format!(
                "unknown distance kind '{other}' (expected planar or haversine)"
            )),
        }
    }
}

/// Nearest-neighbor distance from `earlier` to `later`.
///
/// Callers are expected to pass `earlier.timestamp < later.timestamp`;
/// any other ordering yields `0.0`.
#[must_use]
pub fn nearest_neighbor_distance(earlier: &Event, later: &Event, kind: DistanceKind) -> f64 {
    let dt = later.timestamp - earlier.timestamp;
    if dt <= 0.0 {
        return 0.0;
    }

    let spatial = kind.between(earlier, later).powf(DISTANCE_EXPONENT);
    if spatial == 0.0 {
        return 0.0;
    }

    let weight = dt * spatial * 10_f64.powf(-earlier.magnitude);
    if weight.is_finite() { weight } else { f64::MAX }
}

fn planar_degrees(a: &Event, b: &Event) -> f64 {
    (a.latitude - b.latitude).hypot(a.longitude - b.longitude)
}

fn haversine_km(a: &Event, b: &Event) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}
