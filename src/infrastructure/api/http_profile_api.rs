//! Client adapter for `GET /profile`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::application::dto::{ErrorBody, ProfileResponse};
use crate::domain::entities::Username;
use crate::domain::errors::ApiError;
use crate::domain::ports::{ProfileApiPort, ProfileLookup};

/// Upper bound for one entry-point call; covers the server's own budget.
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(25);

/// Calls a running resolution server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpProfileApi {
    client: Client,
    base_url: String,
}

impl HttpProfileApi {
    /// Creates an adapter for the server at `base_url`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(DEFAULT_API_TIMEOUT).build()?;
        Ok(Self::with_client(client, base_url))
    }

    #[must_use]
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn profile_url(&self, username: &Username) -> String {
        format!(
            "{}/profile?username={}",
            self.base_url,
            urlencoding::encode(username.as_str())
        )
    }
}

#[async_trait]
impl ProfileApiPort for HttpProfileApi {
    async fn lookup(&self, username: &Username) -> Result<ProfileLookup, ApiError> {
        let url = self.profile_url(username);
        debug!(username = %username, url = %url, "Calling entry point");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.message,
                Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
            };
            warn!(username = %username, status = status.as_u16(), message = %message, "Entry point rejected lookup");
            return Err(ApiError::rejected(status.as_u16(), message));
        }

        let body: ProfileResponse = response
            .json()
            .await
            .map_err(|e| ApiError::invalid_response(e.to_string()))?;

        Ok(ProfileLookup {
            proxied_url: body.proxied_url,
            cached: body.cached,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;
    use tokio::net::TcpListener;

    use crate::infrastructure::test_server::serve;

    fn fake_server() -> Router {
        Router::new().route(
            "/profile",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                match q.get("username").map(String::as_str) {
                    Some("alice") => (
                        StatusCode::OK,
                        Json(serde_json::json!({
                            "proxiedUrl": "/proxy-image?url=https%3A%2F%2Fcdn.example%2Fa.jpg",
                            "cached": true
                        })),
                    ),
                    Some("garbled") => (StatusCode::OK, Json(serde_json::json!({"nope": 1}))),
                    _ => (
                        StatusCode::NOT_FOUND,
                        Json(serde_json::json!({
                            "error": "Profile picture not found",
                            "message": "Profile may be private"
                        })),
                    ),
                }
            }),
        )
    }

    #[tokio::test]
    async fn test_lookup_success() {
        let base = serve(fake_server()).await;
        let api = HttpProfileApi::new(format!("{base}/")).unwrap();

        let lookup = api.lookup(&Username::parse("alice").unwrap()).await.unwrap();

        assert!(lookup.cached);
        assert_eq!(
            lookup.proxied_url,
            "/proxy-image?url=https%3A%2F%2Fcdn.example%2Fa.jpg"
        );
    }

    #[tokio::test]
    async fn test_lookup_rejected_carries_message() {
        let base = serve(fake_server()).await;
        let api = HttpProfileApi::new(base).unwrap();

        let err = api.lookup(&Username::parse("ghost").unwrap()).await.unwrap_err();

        assert_eq!(err, ApiError::rejected(404, "Profile may be private"));
    }

    #[tokio::test]
    async fn test_lookup_invalid_body() {
        let base = serve(fake_server()).await;
        let api = HttpProfileApi::new(base).unwrap();

        let err = api.lookup(&Username::parse("garbled").unwrap()).await.unwrap_err();

        assert!(matches!(err, ApiError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_lookup_unreachable_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let api = HttpProfileApi::new(format!("http://{addr}")).unwrap();

        let err = api.lookup(&Username::parse("alice").unwrap()).await.unwrap_err();

        assert!(matches!(err, ApiError::Network { .. }));
    }
}
