//! Command handlers and the catalog/config plumbing they share.

pub mod cluster;
pub mod stats;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use aftershock_core::cancel::{CancellationCheck, NeverCancel};
use aftershock_core::config::{DEFAULT_CONFIG_FILE, load_config};
use aftershock_core::error::ErrorCode;
use aftershock_core::{
    Catalog, ClusterConfig, ClusterError, ClusterPipeline, ClusterReport, DistanceKind, RawEvent,
};
use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate};
use clap::Args;
use tracing::debug;

use crate::output::{CliError, OutputMode, render_error};

/// How a command finished when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Complete,
    /// The run hit `--timeout` before finishing.
    Incomplete,
}

impl RunStatus {
    /// Process exit code for this status.
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Complete => 0,
            Self::Incomplete => 3,
        }
    }
}

/// Catalog selection and clustering parameters shared by all commands.
#[derive(Args, Debug, Clone)]
pub struct CatalogArgs {
    /// Catalog file: a JSON array or JSON Lines of normalized events.
    #[arg(long, short = 'c', value_name = "FILE")]
    pub catalog: PathBuf,

    /// Edge cutoff τ; edges with weight above it are removed.
    #[arg(long, short = 't')]
    pub threshold: Option<f64>,

    /// Distance used by the metric.
    #[arg(long, value_parser = parse_distance)]
    pub distance: Option<DistanceKind>,

    /// Threads for the parent search (0 = one per core).
    #[arg(long)]
    pub workers: Option<usize>,

    /// Earliest origin time to include (RFC 3339, YYYY-MM-DD, or epoch seconds).
    #[arg(long, value_name = "WHEN")]
    pub start: Option<String>,

    /// Latest origin time to include (RFC 3339, YYYY-MM-DD, or epoch seconds).
    #[arg(long, value_name = "WHEN")]
    pub end: Option<String>,

    /// Give up after this many seconds and exit with status 3.
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<f64>,

    /// Config file (default: ./aftershock.toml if present).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl CatalogArgs {
    /// Layer file, environment, and flag values into one configuration.
    pub fn resolve_config(&self) -> Result<ClusterConfig> {
        let path = self
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        if self.config.is_some() && !path.exists() {
            bail!("config file not found: {}", path.display());
        }

        let mut config = load_config(&path)?.apply_env()?;
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(distance) = self.distance {
            config.distance = distance;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        Ok(config)
    }

    /// Load the catalog and apply the `--start`/`--end` window.
    pub fn load(&self) -> Result<Catalog> {
        let catalog = load_catalog(&self.catalog)?;
        if self.start.is_none() && self.end.is_none() {
            return Ok(catalog);
        }

        let start = self
            .start
            .as_deref()
            .map(|s| parse_bound(s, Bound::Start))
            .transpose()?
            .unwrap_or(f64::NEG_INFINITY);
        let end = self
            .end
            .as_deref()
            .map(|s| parse_bound(s, Bound::End))
            .transpose()?
            .unwrap_or(f64::INFINITY);
        if start > end {
            bail!("--start must not be after --end");
        }

        let windowed = catalog.window(start, end);
        debug!(
            before = catalog.len(),
            after = windowed.len(),
            "applied date window"
        );
        Ok(windowed)
    }

    /// Cancellation check for `--timeout`, if one was given.
    fn deadline(&self) -> Result<Option<Deadline>> {
        self.timeout
            .map(|secs| {
                let limit = Duration::try_from_secs_f64(secs)
                    .with_context(|| format!("invalid --timeout: {secs}"))?;
                Ok(Deadline {
                    started: Instant::now(),
                    limit,
                })
            })
            .transpose()
    }
}

struct Deadline {
    started: Instant,
    limit: Duration,
}

impl CancellationCheck for Deadline {
    fn is_cancelled(&self) -> bool {
        self.started.elapsed() >= self.limit
    }
}

/// Load, configure, and run the pipeline, reporting failures in `output` mode.
///
/// Returns `None` when `--timeout` cut the run short; the interruption has
/// already been reported on stderr.
pub fn run_pipeline(
    args: &CatalogArgs,
    limit: Option<usize>,
    output: OutputMode,
) -> Result<Option<ClusterReport>> {
    let catalog = match args.load() {
        Ok(catalog) => catalog,
        Err(err) => {
            render_error(
                output,
                &CliError::with_details(
                    format!("{err:#}"),
                    ErrorCode::CatalogReadFailed.hint().unwrap_or_default(),
                    ErrorCode::CatalogReadFailed.code(),
                ),
            )?;
            return Err(err);
        }
    };

    let mut config = args.resolve_config()?;
    if limit.is_some() {
        config.limit = limit;
    }

    let deadline = args.deadline()?;
    let result = ClusterPipeline::new(config).and_then(|pipeline| {
        let cancel: &dyn CancellationCheck = match &deadline {
            Some(deadline) => deadline,
            None => &NeverCancel,
        };
        pipeline.run_with_cancel(&catalog, cancel)?.into_result()
    });

    match result {
        Ok(report) => Ok(Some(report)),
        Err(err) => {
            render_error(output, &CliError::from(&err))?;
            if matches!(err, ClusterError::Cancelled(_)) {
                Ok(None)
            } else {
                Err(err.into())
            }
        }
    }
}

/// Read a catalog file holding either a JSON array or JSON Lines.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;
    let raw = parse_raw_events(&content)
        .with_context(|| format!("Failed to parse catalog {}", path.display()))?;
    Ok(Catalog::from_raw(raw))
}

fn parse_raw_events(content: &str) -> Result<Vec<RawEvent>> {
    if content.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(content)?);
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("line {}: invalid event", i + 1))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Start,
    End,
}

/// Parse a window bound into epoch seconds.
///
/// A bare date means midnight UTC for `--start` and the last millisecond
/// of that day for `--end`.
#[allow(clippy::cast_precision_loss)]
fn parse_bound(value: &str, bound: Bound) -> Result<f64> {
    let value = value.trim();
    if let Some(secs) = value.parse::<f64>().ok().filter(|s| s.is_finite()) {
        return Ok(secs);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.timestamp_millis() as f64 / 1000.0);
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("expected RFC 3339, YYYY-MM-DD, or epoch seconds: {value}"))?;
    let time = match bound {
        Bound::Start => date.and_hms_milli_opt(0, 0, 0, 0),
        Bound::End => date.and_hms_milli_opt(23, 59, 59, 999),
    }
    .with_context(|| format!("invalid date: {value}"))?;
    Ok(time.and_utc().timestamp_millis() as f64 / 1000.0)
}

fn parse_distance(value: &str) -> Result<DistanceKind, String> {
    value.parse()
}
