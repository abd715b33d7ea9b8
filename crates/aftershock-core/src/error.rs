use std::fmt;

use thiserror::Error;

use crate::cancel::Interrupted;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InvalidConfig,
    InvalidThreshold,
    InvalidEvent,
    WorkerPoolUnavailable,
    CatalogReadFailed,
    Cancelled,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::InvalidConfig => "E1002",
            Self::InvalidThreshold => "E2001",
            Self::InvalidEvent => "E2002",
            Self::WorkerPoolUnavailable => "E3001",
            Self::CatalogReadFailed => "E5001",
            Self::Cancelled => "E6001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidConfig => "Invalid clustering configuration",
            Self::InvalidThreshold => "Invalid clustering threshold",
            Self::InvalidEvent => "Event excluded from clustering",
            Self::WorkerPoolUnavailable => "Worker pool could not be started",
            Self::CatalogReadFailed => "Catalog could not be read",
            Self::Cancelled => "Clustering cancelled before completion",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in aftershock.toml and retry."),
            Self::InvalidConfig => {
                Some("Use a positive cancel_check_interval and a supported distance kind.")
            }
            Self::InvalidThreshold => Some("Pass a finite, non-negative threshold (e.g. 1e-5)."),
            Self::InvalidEvent => {
                Some("Provide id, timestamp, magnitude, latitude and longitude as finite numbers.")
            }
            Self::WorkerPoolUnavailable => Some("Lower --workers or use 0 for the default pool."),
            Self::CatalogReadFailed => {
                Some("Check the catalog path and that it holds a JSON array or JSON Lines.")
            }
            Self::Cancelled => None,
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failures that stop a clustering run before it produces a result.
///
/// Invalid events are *not* errors; they are reported as exclusions on the
/// catalog. Cancellation surfaces as
/// [`ClusterOutcome::Incomplete`](crate::pipeline::ClusterOutcome::Incomplete)
/// and only becomes [`ClusterError::Cancelled`] when a caller asks for a
/// plain `Result` via
/// [`ClusterOutcome::into_result`](crate::pipeline::ClusterOutcome::into_result).
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("threshold must be finite and non-negative, got {0}")]
    InvalidThreshold(f64),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("{0}")]
    Cancelled(Interrupted),
}

impl ClusterError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidThreshold(_) => ErrorCode::InvalidThreshold,
            Self::InvalidConfig(_) => ErrorCode::InvalidConfig,
            Self::WorkerPool(_) => ErrorCode::WorkerPoolUnavailable,
            Self::Cancelled(_) => ErrorCode::Cancelled,
        }
    }

    /// Optional remediation hint for operators and agents.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

#[cfg(test)]
mod tests {
    use super::{ClusterError, ErrorCode};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigParseError,
            ErrorCode::InvalidConfig,
            ErrorCode::InvalidThreshold,
            ErrorCode::InvalidEvent,
            ErrorCode::WorkerPoolUnavailable,
            ErrorCode::CatalogReadFailed,
            ErrorCode::Cancelled,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::InvalidThreshold.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn cluster_error_maps_to_code_and_hint() {
        let err = ClusterError::InvalidThreshold(-1.0);
        assert_eq!(err.code(), ErrorCode::InvalidThreshold);
        assert!(err.hint().is_some());
        assert!(err.to_string().contains("-1"));
    }
}
