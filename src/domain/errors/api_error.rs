//! Errors raised when a client talks to the resolution entry point.

use thiserror::Error;

/// Failures of the client-side profile API call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ApiError {
    #[error("entry point rejected request with HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("network error talking to entry point: {message}")]
    Network { message: String },

    #[error("unexpected response from entry point: {message}")]
    InvalidResponse { message: String },
}

impl ApiError {
    #[must_use]
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}
