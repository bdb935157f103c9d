//! Probe failure classification.

use thiserror::Error;

/// Why a single probe attempt did not produce a URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ProbeFailure {
    /// Upstream answered, but there is no picture (private or missing profile).
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Upstream is throttling (HTTP 429/503 or equivalent).
    #[error("blocked by upstream: {message}")]
    Blocked { message: String },

    /// Network error or timeout.
    #[error("upstream unreachable: {message}")]
    Unreachable { message: String },

    /// Response did not match any known extraction pattern.
    #[error("could not parse response: {message}")]
    ParseFailure { message: String },
}

impl ProbeFailure {
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn blocked(message: impl Into<String>) -> Self {
        Self::Blocked {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseFailure {
            message: message.into(),
        }
    }

    /// Returns whether a retry may change the outcome.
    ///
    /// Only `Blocked` and `Unreachable` are retried; the other two are
    /// deterministic misses.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Blocked { .. } | Self::Unreachable { .. })
    }

    /// Short label used in log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Blocked { .. } => "blocked",
            Self::Unreachable { .. } => "unreachable",
            Self::ParseFailure { .. } => "parse_failure",
        }
    }
}
