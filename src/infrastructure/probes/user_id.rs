//! Two-step identity probe: profile page → numeric id → account info.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;

use super::extract::{extract_user_id, json_pointer_url};
use super::fetch::{UaProfile, UpstreamFetcher, api_headers, document_headers};
use crate::domain::entities::Username;
use crate::domain::errors::ProbeFailure;
use crate::domain::ports::ProbePort;

const PROFILE_TEMPLATE: &str = "https://www.instagram.com/{username}/";
const INFO_TEMPLATE: &str = "https://i.instagram.com/api/v1/users/{id}/info/";
const PICTURE_POINTERS: [&str; 2] = ["/user/hd_profile_pic_url_info/url", "/user/profile_pic_url"];

/// Resolves the account id first, then asks the account info endpoint for the
/// HD picture. Both steps share one deadline.
#[derive(Debug, Clone)]
pub struct UserIdProbe {
    fetcher: Arc<UpstreamFetcher>,
    profile_template: String,
    info_template: String,
}

impl UserIdProbe {
    #[must_use]
    pub fn new(fetcher: Arc<UpstreamFetcher>) -> Self {
        Self::with_templates(fetcher, PROFILE_TEMPLATE, INFO_TEMPLATE)
    }

    /// Overrides both endpoints; `{username}` and `{id}` are substituted.
    #[must_use]
    pub fn with_templates(
        fetcher: Arc<UpstreamFetcher>,
        profile_template: impl Into<String>,
        info_template: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            profile_template: profile_template.into(),
            info_template: info_template.into(),
        }
    }

    async fn account_id(&self, username: &Username, timeout: Duration) -> Result<String, ProbeFailure> {
        let url = self.profile_template.replace("{username}", username.as_str());
        let html = self
            .fetcher
            .get_text(&url, document_headers(UaProfile::Any.pick()), timeout)
            .await
            .map_err(|failure| match failure {
                // Step one only ever ends the probe as unreachable or not found.
                ProbeFailure::Blocked { message } => ProbeFailure::unreachable(message),
                other => other,
            })?;

        extract_user_id(&html).ok_or_else(|| {
            ProbeFailure::not_found("profile page carries no account id")
        })
    }
}

#[async_trait]
impl ProbePort for UserIdProbe {
    fn name(&self) -> &str {
        "user_id"
    }

    async fn attempt(&self, username: &Username, timeout: Duration) -> Result<String, ProbeFailure> {
        let deadline = Instant::now() + timeout;

        let id = self.account_id(username, timeout).await?;
        debug!(username = %username, account_id = %id, "Resolved account id");

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(ProbeFailure::unreachable("no time left for account info"));
        }

        let url = self.info_template.replace("{id}", &id);
        let info = self
            .fetcher
            .get_json(&url, api_headers(UaProfile::Any.pick()), remaining)
            .await?;

        json_pointer_url(&info, &PICTURE_POINTERS)
            .ok_or_else(|| ProbeFailure::not_found("account info has no picture"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::test_server::serve;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;

    fn probe_against(base: &str) -> UserIdProbe {
        UserIdProbe::with_templates(
            Arc::new(UpstreamFetcher::new().unwrap()),
            format!("{base}/{{username}}/"),
            format!("{base}/api/v1/users/{{id}}/info/"),
        )
    }

    #[tokio::test]
    async fn test_two_step_resolution() {
        let base = serve(
            Router::new()
                .route(
                    "/alice/",
                    get(|| async { r#"<script>{"profile_id":"25025320"}</script>"# }),
                )
                .route(
                    "/api/v1/users/25025320/info/",
                    get(|| async {
                        r#"{"user":{"hd_profile_pic_url_info":{"url":"https:\/\/cdn.example\/hd.jpg"},"profile_pic_url":"https://cdn.example/sd.jpg"}}"#
                    }),
                ),
        )
        .await;

        let url = probe_against(&base)
            .attempt(&Username::parse("alice").unwrap(), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(url, "https://cdn.example/hd.jpg");
    }

    #[tokio::test]
    async fn test_rate_limited_profile_page_is_unreachable() {
        let info_hits = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let hits = Arc::clone(&info_hits);
        let base = serve(
            Router::new()
                .route(
                    "/alice/",
                    get(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
                )
                .route(
                    "/api/v1/users/{id}/info/",
                    get(move || {
                        hits.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                        async { "{}" }
                    }),
                ),
        )
        .await;

        let err = probe_against(&base)
            .attempt(&Username::parse("alice").unwrap(), Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, ProbeFailure::Unreachable { .. }));
        assert!(err.is_transient());
        assert_eq!(info_hits.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rate_limited_info_step_stays_blocked() {
        let base = serve(
            Router::new()
                .route(
                    "/alice/",
                    get(|| async { r#"<script>{"profile_id":"25025320"}</script>"# }),
                )
                .route(
                    "/api/v1/users/25025320/info/",
                    get(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
                ),
        )
        .await;

        let err = probe_against(&base)
            .attempt(&Username::parse("alice").unwrap(), Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, ProbeFailure::Blocked { .. }));
    }

    #[tokio::test]
    async fn test_missing_id_is_not_found() {
        let base = serve(Router::new().route("/alice/", get(|| async { "<html></html>" }))).await;

        let err = probe_against(&base)
            .attempt(&Username::parse("alice").unwrap(), Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, ProbeFailure::NotFound { .. }));
    }
}
