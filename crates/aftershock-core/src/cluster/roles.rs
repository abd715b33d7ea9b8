//! Mainshock / foreshock / aftershock classification.
//!
//! The mainshock is the member with the largest magnitude. Equal
//! magnitudes are resolved by the earlier timestamp, then the lower id, so
//! the choice never depends on iteration order. Every other member is a
//! foreshock if it precedes the mainshock in time and an aftershock
//! otherwise (members sharing the mainshock's timestamp count as
//! aftershocks).

use std::cmp::Ordering;

use tracing::{instrument, trace};

use crate::catalog::{Catalog, Event};
use crate::cluster::{Cluster, ClusterEdge, DuplicatePair};
use crate::graph::components::Component;

/// Pick the mainshock among `events`. Returns `None` for an empty input.
pub fn select_mainshock<'a>(events: impl IntoIterator<Item = &'a Event>) -> Option<&'a Event> {
    events.into_iter().max_by(|a, b| mainshock_order(a, b))
}

/// Total order in which the mainshock is the maximum.
fn mainshock_order(a: &Event, b: &Event) -> Ordering {
    a.magnitude
        .total_cmp(&b.magnitude)
        .then_with(|| b.timestamp.total_cmp(&a.timestamp))
        .then_with(|| b.id.cmp(&a.id))
}

fn time_order(a: &Event, b: &Event) -> Ordering {
    a.timestamp.total_cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id))
}

/// Classify one component. Returns `None` for an empty component or one
/// referring to positions outside `catalog`.
#[must_use]
pub fn classify(catalog: &Catalog, component: &Component) -> Option<Cluster> {
    let members: Vec<&Event> = component
        .members
        .iter()
        .map(|&p| catalog.get(p))
        .collect::<Option<_>>()?;

    let mainshock = *select_mainshock(members.iter().copied())?;

    let mut foreshocks: Vec<&Event> = Vec::new();
    let mut aftershocks: Vec<&Event> = Vec::new();
    for &event in &members {
        if event.id == mainshock.id {
            continue;
        }
        if event.timestamp < mainshock.timestamp {
            foreshocks.push(event);
        } else {
            aftershocks.push(event);
        }
    }
    foreshocks.sort_by(|a, b| time_order(a, b));
    aftershocks.sort_by(|a, b| time_order(a, b));

    let edges = component
        .edges
        .iter()
        .filter_map(|e| {
            Some(ClusterEdge {
                child: catalog.get(e.child)?.id,
                parent: catalog.get(e.parent)?.id,
                weight: e.weight,
            })
        })
        .collect();

    let duplicates = component
        .duplicates
        .iter()
        .filter_map(|d| {
            Some(DuplicatePair {
                duplicate: catalog.get(d.duplicate)?.id,
                original: catalog.get(d.original)?.id,
            })
        })
        .collect();

    trace!(
        mainshock = mainshock.id,
        foreshocks = foreshocks.len(),
        aftershocks = aftershocks.len(),
        "cluster classified"
    );

    Some(Cluster {
        mainshock: mainshock.id,
        foreshocks: foreshocks.iter().map(|e| e.id).collect(),
        aftershocks: aftershocks.iter().map(|e| e.id).collect(),
        members: members.iter().map(|e| e.id).collect(),
        edges,
        duplicates,
    })
}

/// Classify every component, preserving their order.
#[must_use]
#[instrument(skip(catalog, components), fields(components = components.len()))]
pub fn classify_all(catalog: &Catalog, components: &[Component]) -> Vec<Cluster> {
    components
        .iter()
        .filter_map(|component| classify(catalog, component))
        .collect()
}
