//! Resolution error taxonomy surfaced by the entry point.

use std::time::Duration;

use thiserror::Error;

/// Outcome of a failed avatar resolution.
///
/// `Clone` so that one in-flight result can be handed to every coalesced caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ResolveError {
    #[error("invalid username: {reason}")]
    InvalidInput { reason: String },

    #[error("no profile picture found for {username} after {tiers} tiers")]
    NotFoundAnywhere { username: String, tiers: usize },

    #[error("resolution for {username} exceeded budget of {}ms", .budget.as_millis())]
    Timeout { username: String, budget: Duration },
}

impl ResolveError {
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn not_found_anywhere(username: impl Into<String>, tiers: usize) -> Self {
        Self::NotFoundAnywhere {
            username: username.into(),
            tiers,
        }
    }

    #[must_use]
    pub fn timeout(username: impl Into<String>, budget: Duration) -> Self {
        Self::Timeout {
            username: username.into(),
            budget,
        }
    }

    /// Human-readable hint for end users.
    #[must_use]
    pub const fn hint(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => {
                "Usernames may only contain letters, digits, periods and underscores."
            }
            Self::NotFoundAnywhere { .. } => {
                "Profile may be private, nonexistent, or Instagram is blocking the request."
            }
            Self::Timeout { .. } => "Instagram did not answer in time. Try again later.",
        }
    }

    /// Returns whether asking again later could succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::NotFoundAnywhere { .. })
    }
}
