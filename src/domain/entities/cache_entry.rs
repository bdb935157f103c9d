//! Cache entry value object shared by the server and client caches.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default lifetime of a cached avatar URL.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A cached upstream URL and the moment it was stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Raw upstream URL.
    pub url: String,
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates a new entry stored at `now`.
    #[must_use]
    pub fn new(url: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            stored_at: now,
        }
    }

    /// Age of the entry relative to `now`. Entries from the future have zero age.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.stored_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// An entry is expired once `now - stored_at >= ttl`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now) >= ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_fresh_entry_is_valid() {
        let entry = CacheEntry::new("https://cdn.example/a.jpg", t0());
        let later = t0() + chrono::Duration::hours(23);
        assert!(!entry.is_expired(later, DEFAULT_TTL));
    }

    #[test]
    fn test_expires_exactly_at_ttl() {
        let entry = CacheEntry::new("https://cdn.example/a.jpg", t0());
        let at_ttl = t0() + chrono::Duration::hours(24);
        assert!(entry.is_expired(at_ttl, DEFAULT_TTL));
    }

    #[test]
    fn test_future_entry_has_zero_age() {
        let entry = CacheEntry::new("u", t0() + chrono::Duration::seconds(10));
        assert_eq!(entry.age(t0()), Duration::ZERO);
    }

    #[test]
    fn test_serialized_shape() {
        let entry = CacheEntry::new("https://cdn.example/a.jpg", t0());
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            r#"{"url":"https://cdn.example/a.jpg","timestamp":1735689600000}"#
        );
    }
}
