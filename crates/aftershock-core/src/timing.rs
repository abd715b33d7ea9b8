//! Opt-in wall-clock timing of pipeline stages.
//!
//! Samples are buffered per thread and only recorded while timing is
//! enabled (`AFTERSHOCK_TIMING=1` or [`set_timing_enabled`]). The pipeline
//! wraps each stage in [`timed`]; callers drain the buffer with
//! [`collect_report`] once a run finishes.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde_json::json;

use crate::cancel::Stage;

/// Timing statistics for every stage that recorded samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingReport {
    /// Per-stage statistics, in pipeline order.
    pub stages: Vec<StageTiming>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTiming {
    pub stage: Stage,
    pub p50: Duration,
    pub p95: Duration,
    pub p99: Duration,
    pub total: Duration,
    pub count: usize,
}

thread_local! {
    static SAMPLES: RefCell<Vec<(Stage, Duration)>> = const { RefCell::new(Vec::new()) };
}

static TIMING_ENABLED: AtomicBool = AtomicBool::new(false);

/// Returns true when `AFTERSHOCK_TIMING` enables timing collection.
///
/// Supported truthy values: `1`, `true`, `yes`, `on` (case-insensitive).
#[must_use]
pub fn timing_enabled_from_env() -> bool {
    std::env::var("AFTERSHOCK_TIMING")
        .ok()
        .is_some_and(|value| is_truthy(value.as_str()))
}

/// Enable or disable timing collection.
pub fn set_timing_enabled(enabled: bool) {
    TIMING_ENABLED.store(enabled, Ordering::Relaxed);
    if !enabled {
        clear_timings();
    }
}

#[must_use]
pub fn is_timing_enabled() -> bool {
    TIMING_ENABLED.load(Ordering::Relaxed)
}

/// Clears all recorded timings for the current thread.
pub fn clear_timings() {
    SAMPLES.with(|samples| samples.borrow_mut().clear());
}

/// Run `f`, recording its duration under `stage` when timing is enabled.
pub fn timed<R>(stage: Stage, f: impl FnOnce() -> R) -> R {
    if !is_timing_enabled() {
        return f();
    }

    let started = Instant::now();
    let result = f();
    record_sample(stage, started.elapsed());
    result
}

/// Drain the current thread's samples into a report.
#[must_use]
pub fn collect_report() -> TimingReport {
    let samples = SAMPLES.with(|samples| std::mem::take(&mut *samples.borrow_mut()));

    let mut grouped: BTreeMap<Stage, Vec<Duration>> = BTreeMap::new();
    for (stage, elapsed) in samples {
        grouped.entry(stage).or_default().push(elapsed);
    }

    let stages = grouped
        .into_iter()
        .map(|(stage, mut values)| {
            values.sort_unstable();
            StageTiming {
                stage,
                p50: percentile(&values, 50),
                p95: percentile(&values, 95),
                p99: percentile(&values, 99),
                total: values.iter().sum(),
                count: values.len(),
            }
        })
        .collect();

    TimingReport { stages }
}

impl TimingReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let stages = self
            .stages
            .iter()
            .map(|s| {
                json!({
                    "stage": s.stage.as_str(),
                    "count": s.count,
                    "total_us": s.total.as_micros(),
                    "p50_us": s.p50.as_micros(),
                    "p95_us": s.p95.as_micros(),
                    "p99_us": s.p99.as_micros(),
                })
            })
            .collect::<Vec<_>>();

        json!({ "stages": stages })
    }

    /// Render as a fixed-width table for terminal output.
    #[must_use]
    pub fn display_table(&self) -> String {
        if self.stages.is_empty() {
            return "No timing samples recorded.".to_string();
        }

        let mut out = String::new();
        out.push_str("stage        count     total      p50      p95      p99\n");
        out.push_str("--------------------------------------------------------\n");
        for s in &self.stages {
            let _ = writeln!(
                out,
                "{:<12} {:>5} {:>9} {:>8} {:>8} {:>8}",
                s.stage.as_str(),
                s.count,
                format_duration(s.total),
                format_duration(s.p50),
                format_duration(s.p95),
                format_duration(s.p99)
            );
        }
        out
    }
}

fn record_sample(stage: Stage, elapsed: Duration) {
    SAMPLES.with(|samples| samples.borrow_mut().push((stage, elapsed)));
}

fn percentile(sorted: &[Duration], pct: usize) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }

    let rank = pct.min(100).saturating_mul(sorted.len()).saturating_add(99) / 100;
    let index = rank.saturating_sub(1).min(sorted.len() - 1);
    sorted[index]
}

fn format_duration(duration: Duration) -> String {
    let micros = duration.as_micros();

    if micros >= 1_000_000 {
        format!("{}.{:03}s", micros / 1_000_000, (micros % 1_000_000) / 1_000)
    } else if micros >= 1_000 {
        format!("{}.{:03}ms", micros / 1_000, micros % 1_000)
    } else {
        format!("{micros}µs")
    }
}

fn is_truthy(value: &str) -> bool {
    ["1", "true", "yes", "on"]
        .iter()
        .any(|t| value.trim().eq_ignore_ascii_case(t))
}
