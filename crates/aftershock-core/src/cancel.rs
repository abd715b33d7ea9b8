//! Cooperative cancellation for long clustering runs.
//!
//! The caller injects a [`CancellationCheck`]; the edge builder polls it
//! periodically from its worker threads and the pipeline polls it between
//! stages. A cancelled run reports where it stopped via [`Interrupted`]
//! and never hands out a partial graph.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

/// Polled to decide whether a run should stop early.
///
/// Implementations must be cheap and thread-safe: the check is called from
/// rayon worker threads.
pub trait CancellationCheck: Sync {
    fn is_cancelled(&self) -> bool;
}

impl<F> CancellationCheck for F
where
    F: Fn() -> bool + Sync,
{
    fn is_cancelled(&self) -> bool {
        self()
    }
}

/// A check that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancellationCheck for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Shareable cancellation token backed by an atomic flag.
///
/// Clone it into a request handler and call [`CancelFlag::cancel`] from
/// any thread.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl CancellationCheck for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Edges,
    Graph,
    Threshold,
    Components,
    Roles,
    Rank,
}

impl Stage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Edges => "edges",
            Self::Graph => "graph",
            Self::Threshold => "threshold",
            Self::Components => "components",
            Self::Roles => "roles",
            Self::Rank => "rank",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a cancelled run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interrupted {
    /// Stage that observed the cancellation.
    pub stage: Stage,
    /// Units of work finished in that stage (events for [`Stage::Edges`]).
    pub processed: usize,
    /// Units of work the stage had in total.
    pub total: usize,
}

impl fmt::Display for Interrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cancelled during {} after {}/{}",
            self.stage, self.processed, self.total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_checks() {
        let check = || true;
        assert!(check.is_cancelled());
        assert!(!NeverCancel.is_cancelled());
    }

    #[test]
    fn flag_is_shared_between_clones() {
        let flag = CancelFlag::new();
        let handle = flag.clone();
        assert!(!flag.is_cancelled());
        handle.cancel();
        assert!(flag.is_cancelled());
    }

    #[test]
    fn stages_are_ordered() {
        assert!(Stage::Edges < Stage::Graph);
        assert!(Stage::Roles < Stage::Rank);
        assert_eq!(Stage::Components.to_string(), "components");
    }
}
