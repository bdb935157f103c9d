//! Shared HTTP plumbing for probes: user agents, header sets and failure
//! classification.

use std::time::Duration;

use rand::seq::IndexedRandom;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode, redirect};
use tracing::{debug, trace};

use crate::domain::errors::ProbeFailure;

const DESKTOP_USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

const MOBILE_USER_AGENTS: [&str; 2] = [
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1",
    "Instagram 269.0.0.18.75 Android (26/8.0.0; 480dpi; 1080x1920; OnePlus; 6T Dev; devitron; qcom; en_US; 314665256)",
];

/// Web app id expected by the private first-party API.
pub const IG_APP_ID: &str = "936619743392459";

/// Which pool a probe draws its user agent from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UaProfile {
    /// Desktop browsers.
    Desktop,
    /// Mobile Safari and the Android app.
    Mobile,
    /// Either pool.
    Any,
}

impl UaProfile {
    /// Picks a user agent at random from the pool.
    #[must_use]
    pub fn pick(self) -> &'static str {
        let mut rng = rand::rng();
        let pool: Vec<&'static str> = match self {
            Self::Desktop => DESKTOP_USER_AGENTS.to_vec(),
            Self::Mobile => MOBILE_USER_AGENTS.to_vec(),
            Self::Any => DESKTOP_USER_AGENTS
                .iter()
                .chain(MOBILE_USER_AGENTS.iter())
                .copied()
                .collect(),
        };
        pool.choose(&mut rng)
            .copied()
            .unwrap_or(DESKTOP_USER_AGENTS[0])
    }
}

/// Browser-like headers for a top-level page navigation.
#[must_use]
pub fn document_headers(user_agent: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(user_agent));
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("document"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("navigate"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("none"),
    );
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers
}

/// Headers for the first-party JSON endpoints.
#[must_use]
pub fn api_headers(user_agent: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(user_agent));
    headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(
        HeaderName::from_static("x-ig-app-id"),
        HeaderValue::from_static(IG_APP_ID),
    );
    headers.insert(
        HeaderName::from_static("x-asbd-id"),
        HeaderValue::from_static("129477"),
    );
    headers.insert(
        HeaderName::from_static("x-requested-with"),
        HeaderValue::from_static("XMLHttpRequest"),
    );
    headers
}

/// Maps a non-success upstream status to a probe failure.
#[must_use]
pub fn classify_status(status: StatusCode) -> Option<ProbeFailure> {
    if status.is_success() {
        return None;
    }
    let message = format!("HTTP {}", status.as_u16());
    Some(match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => ProbeFailure::not_found(message),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
            ProbeFailure::blocked(message)
        }
        s if s.is_server_error() => ProbeFailure::unreachable(message),
        _ => ProbeFailure::not_found(message),
    })
}

fn classify_transport(err: &reqwest::Error) -> ProbeFailure {
    if err.is_timeout() {
        ProbeFailure::unreachable("request timed out")
    } else if err.is_connect() {
        ProbeFailure::unreachable(format!("connection failed: {err}"))
    } else if err.is_redirect() {
        ProbeFailure::blocked(format!("redirect loop: {err}"))
    } else {
        ProbeFailure::unreachable(err.to_string())
    }
}

/// Thin wrapper over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct UpstreamFetcher {
    client: Client,
}

impl UpstreamFetcher {
    /// Creates a fetcher with gzip and a bounded redirect policy.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .redirect(redirect::Policy::limited(5))
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }

    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetches a body as text, aborting at `timeout`.
    ///
    /// # Errors
    /// Returns a classified [`ProbeFailure`].
    pub async fn get_text(
        &self,
        url: &str,
        headers: HeaderMap,
        timeout: Duration,
    ) -> Result<String, ProbeFailure> {
        let response = self
            .client
            .get(url)
            .headers(headers)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let status = response.status();
        trace!(url, status = status.as_u16(), "Upstream answered");

        if let Some(failure) = classify_status(status) {
            debug!(url, status = status.as_u16(), kind = failure.kind(), "Upstream rejected request");
            return Err(failure);
        }

        if response.url().path().starts_with("/accounts/login") {
            return Err(ProbeFailure::blocked("redirected to login wall"));
        }

        response.text().await.map_err(|e| classify_transport(&e))
    }

    /// Fetches and parses a JSON body.
    ///
    /// # Errors
    /// Returns a classified [`ProbeFailure`]; undecodable bodies are `ParseFailure`.
    pub async fn get_json(
        &self,
        url: &str,
        headers: HeaderMap,
        timeout: Duration,
    ) -> Result<serde_json::Value, ProbeFailure> {
        let body = self.get_text(url, headers, timeout).await?;
        serde_json::from_str(&body)
            .map_err(|e| ProbeFailure::parse(format!("invalid JSON: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(404, "not_found")]
    #[test_case(410, "not_found")]
    #[test_case(403, "blocked")]
    #[test_case(429, "blocked")]
    #[test_case(503, "blocked")]
    #[test_case(500, "unreachable")]
    #[test_case(502, "unreachable")]
    #[test_case(401, "not_found")]
    fn test_classify_status(code: u16, kind: &str) {
        let status = StatusCode::from_u16(code).unwrap();
        assert_eq!(classify_status(status).unwrap().kind(), kind);
    }

    #[test]
    fn test_success_is_not_a_failure() {
        assert_eq!(classify_status(StatusCode::OK), None);
    }

    #[test]
    fn test_user_agent_pools() {
        for _ in 0..20 {
            assert!(DESKTOP_USER_AGENTS.contains(&UaProfile::Desktop.pick()));
            assert!(MOBILE_USER_AGENTS.contains(&UaProfile::Mobile.pick()));
        }
    }

    #[test]
    fn test_api_headers_carry_app_id() {
        let headers = api_headers(UaProfile::Desktop.pick());
        assert_eq!(headers["x-ig-app-id"], IG_APP_ID);
    }
}
