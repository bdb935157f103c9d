//! HTML page probe, used for first-party profile pages and third-party mirrors.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use super::extract::{ExtractOutcome, PatternSet, extract};
use super::fetch::{UaProfile, UpstreamFetcher, document_headers};
use crate::domain::entities::Username;
use crate::domain::errors::ProbeFailure;
use crate::domain::ports::ProbePort;

const NOT_FOUND_MARKERS: [&str; 3] = [
    "Sorry, this page isn't available",
    "Page Not Found",
    "User not found",
];

/// Fetches one HTML page and runs an ordered pattern set over it.
#[derive(Debug, Clone)]
pub struct ProfilePageProbe {
    name: String,
    fetcher: Arc<UpstreamFetcher>,
    url_template: String,
    user_agents: UaProfile,
    patterns: PatternSet,
}

impl ProfilePageProbe {
    /// Creates a probe; `{username}` in `url_template` is substituted.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        fetcher: Arc<UpstreamFetcher>,
        url_template: impl Into<String>,
        user_agents: UaProfile,
        patterns: PatternSet,
    ) -> Self {
        Self {
            name: name.into(),
            fetcher,
            url_template: url_template.into(),
            user_agents,
            patterns,
        }
    }

    /// First-party desktop profile page.
    #[must_use]
    pub fn desktop(fetcher: Arc<UpstreamFetcher>) -> Self {
        Self::new(
            "page_desktop",
            fetcher,
            "https://www.instagram.com/{username}/",
            UaProfile::Desktop,
            PatternSet::ProfilePage,
        )
    }

    /// First-party page as served to mobile browsers.
    #[must_use]
    pub fn mobile(fetcher: Arc<UpstreamFetcher>) -> Self {
        Self::new(
            "page_mobile",
            fetcher,
            "https://www.instagram.com/{username}/?hl=en",
            UaProfile::Mobile,
            PatternSet::ProfilePage,
        )
    }

    /// Third-party mirror page.
    #[must_use]
    pub fn mirror(
        name: impl Into<String>,
        fetcher: Arc<UpstreamFetcher>,
        url_template: impl Into<String>,
    ) -> Self {
        Self::new(name, fetcher, url_template, UaProfile::Desktop, PatternSet::Mirror)
    }
}

#[async_trait]
impl ProbePort for ProfilePageProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn attempt(&self, username: &Username, timeout: Duration) -> Result<String, ProbeFailure> {
        let url = self.url_template.replace("{username}", username.as_str());
        let body = self
            .fetcher
            .get_text(&url, document_headers(self.user_agents.pick()), timeout)
            .await?;

        match extract(&body, self.patterns) {
            ExtractOutcome::Found { pattern, url } => {
                trace!(probe = %self.name, pattern, "Pattern matched");
                Ok(url)
            }
            ExtractOutcome::PlaceholderOnly => {
                Err(ProbeFailure::not_found("only placeholder images on page"))
            }
            ExtractOutcome::NoMatch if NOT_FOUND_MARKERS.iter().any(|m| body.contains(m)) => {
                Err(ProbeFailure::not_found("page reports missing profile"))
            }
            ExtractOutcome::NoMatch => Err(ProbeFailure::parse("no extraction pattern matched")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::test_server::serve;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;

    fn mirror_probe(base: &str) -> ProfilePageProbe {
        ProfilePageProbe::mirror(
            "mirror",
            Arc::new(UpstreamFetcher::new().unwrap()),
            format!("{base}/profile/{{username}}"),
        )
    }

    async fn attempt(probe: &ProfilePageProbe) -> Result<String, ProbeFailure> {
        probe
            .attempt(&Username::parse("alice").unwrap(), Duration::from_secs(5))
            .await
    }

    #[tokio::test]
    async fn test_extracts_from_mirror_page() {
        let base = serve(Router::new().route(
            "/profile/alice",
            get(|| async {
                axum::response::Html(
                    r#"<html><head><meta property="og:image" content="https://cdn.example/alice.jpg"></head></html>"#,
                )
            }),
        ))
        .await;

        assert_eq!(
            attempt(&mirror_probe(&base)).await.unwrap(),
            "https://cdn.example/alice.jpg"
        );
    }

    #[tokio::test]
    async fn test_missing_profile_page_is_not_found() {
        let base = serve(Router::new().route(
            "/profile/alice",
            get(|| async { "<h1>Sorry, this page isn't available.</h1>" }),
        ))
        .await;

        assert!(matches!(
            attempt(&mirror_probe(&base)).await,
            Err(ProbeFailure::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_shape_is_parse_failure() {
        let base = serve(Router::new().route("/profile/alice", get(|| async { "<p>hi</p>" }))).await;

        assert!(matches!(
            attempt(&mirror_probe(&base)).await,
            Err(ProbeFailure::ParseFailure { .. })
        ));
    }

    #[tokio::test]
    async fn test_http_404_is_not_found() {
        let base = serve(Router::new().route(
            "/profile/alice",
            get(|| async { (StatusCode::NOT_FOUND, "gone") }),
        ))
        .await;

        assert!(matches!(
            attempt(&mirror_probe(&base)).await,
            Err(ProbeFailure::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_slow_upstream_is_unreachable() {
        let base = serve(Router::new().route(
            "/profile/alice",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        ))
        .await;

        let err = mirror_probe(&base)
            .attempt(&Username::parse("alice").unwrap(), Duration::from_millis(200))
            .await
            .unwrap_err();

        assert!(matches!(err, ProbeFailure::Unreachable { .. }));
    }
}
