//! Entry-point DTOs.

use serde::{Deserialize, Serialize};

/// Successful `GET /profile` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    /// URL routed through the image proxy.
    pub proxied_url: String,
    /// Whether the answer came from the server cache.
    pub cached: bool,
}

/// Body of every non-2xx JSON response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Short error label.
    pub error: String,
    /// Human-readable hint.
    pub message: String,
}

impl ErrorBody {
    /// Creates a new error body.
    #[must_use]
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// Outcome of a batch preload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PreloadSummary {
    /// Usernames that ended up cached.
    pub success: usize,
    /// Usernames that could not be resolved.
    pub failed: usize,
}

impl std::fmt::Display for PreloadSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} cached, {} failed", self.success, self.failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_response_uses_camel_case() {
        let body = ProfileResponse {
            proxied_url: "/proxy-image?url=x".to_string(),
            cached: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["proxiedUrl"], "/proxy-image?url=x");
        assert_eq!(json["cached"], true);
    }
}
