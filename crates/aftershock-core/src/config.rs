//! Clustering configuration.
//!
//! Values come from three layers, highest precedence first:
//! 1. explicit overrides (CLI flags, request parameters)
//! 2. `AFTERSHOCK_*` environment variables
//! 3. the `[clustering]` table of `aftershock.toml`
//!
//! Anything left unset falls back to the defaults below.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::edges::DEFAULT_CHECK_INTERVAL;
use crate::error::ClusterError;
use crate::metric::DistanceKind;

/// File name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "aftershock.toml";

/// Initial threshold of the dashboard's cluster view.
pub const DEFAULT_THRESHOLD: f64 = 1e-5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Edge cutoff τ: an edge is kept iff its weight is ≤ τ.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub distance: DistanceKind,
    /// Edge builder threads; 0 uses rayon's global pool.
    #[serde(default)]
    pub workers: usize,
    /// Children processed between cancellation polls.
    #[serde(default = "default_check_interval")]
    pub cancel_check_interval: usize,
    /// Keep only the N largest clusters in the report.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            distance: DistanceKind::default(),
            workers: 0,
            cancel_check_interval: default_check_interval(),
            limit: None,
        }
    }
}

impl ClusterConfig {
    /// Default configuration with a different threshold.
    #[must_use]
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns [`ClusterError::InvalidThreshold`] for a NaN, infinite, or
    /// negative threshold and [`ClusterError::InvalidConfig`] for a zero
    /// cancellation interval.
    pub fn validate(&self) -> Result<(), ClusterError> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(ClusterError::InvalidThreshold(self.threshold));
        }
        if self.cancel_check_interval == 0 {
            return Err(ClusterError::InvalidConfig(
                "cancel_check_interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply `AFTERSHOCK_THRESHOLD`, `AFTERSHOCK_DISTANCE` and
    /// `AFTERSHOCK_WORKERS` from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Same as [`ClusterConfig::apply_env`] with an injectable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(raw) = lookup("AFTERSHOCK_THRESHOLD") {
            self.threshold = raw
                .trim()
                .parse()
                .with_context(|| format!("AFTERSHOCK_THRESHOLD is not a number: {raw}"))?;
        }
        if let Some(raw) = lookup("AFTERSHOCK_DISTANCE") {
            self.distance = raw.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(raw) = lookup("AFTERSHOCK_WORKERS") {
            self.workers = raw
                .trim()
                .parse()
                .with_context(|| format!("AFTERSHOCK_WORKERS is not a count: {raw}"))?;
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    clustering: ClusterConfig,
}

/// Load the `[clustering]` table from a TOML file.
///
/// A missing file yields the defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<ClusterConfig> {
    if !path.exists() {
        return Ok(ClusterConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    parse_config(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Parse configuration from TOML text.
///
/// # Errors
///
/// Returns an error on invalid TOML or mistyped values.
pub fn parse_config(content: &str) -> Result<ClusterConfig> {
    let file: ConfigFile = toml::from_str(content)?;
    Ok(file.clustering)
}

const fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

const fn default_check_interval() -> usize {
    DEFAULT_CHECK_INTERVAL
}
