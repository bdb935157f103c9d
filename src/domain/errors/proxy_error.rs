//! Image proxy error types.

use thiserror::Error;

/// Image proxy failures. None of these invalidate a cached avatar URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ProxyError {
    #[error("missing image URL")]
    MissingUrl,

    #[error("invalid image URL: {reason}")]
    InvalidUrl { reason: String },

    #[error("upstream returned HTTP {status}")]
    UpstreamStatus { status: u16 },

    #[error("upstream image request timed out")]
    Timeout,

    #[error("upstream unavailable: {message}")]
    UpstreamUnavailable { message: String },
}

impl ProxyError {
    #[must_use]
    pub fn invalid_url(reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            message: message.into(),
        }
    }
}
