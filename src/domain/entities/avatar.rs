//! Resolved avatar entity.

use chrono::{DateTime, Utc};

use super::Username;

/// A successfully resolved profile picture.
///
/// `url` is the raw upstream CDN URL, never a proxied one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAvatar {
    username: Username,
    url: String,
    resolved_at: DateTime<Utc>,
    source: String,
}

impl ResolvedAvatar {
    /// Creates a new resolved avatar.
    #[must_use]
    pub fn new(
        username: Username,
        url: impl Into<String>,
        resolved_at: DateTime<Utc>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            username,
            url: url.into(),
            resolved_at,
            source: source.into(),
        }
    }

    #[must_use]
    pub const fn username(&self) -> &Username {
        &self.username
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub const fn resolved_at(&self) -> DateTime<Utc> {
        self.resolved_at
    }

    /// Name of the probe that produced the URL.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}
