//! First-party JSON endpoint probes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::extract::json_pointer_url;
use super::fetch::{UaProfile, UpstreamFetcher, api_headers};
use crate::domain::entities::Username;
use crate::domain::errors::ProbeFailure;
use crate::domain::ports::ProbePort;

/// Queries one JSON endpoint and reads the picture from ordered pointers.
#[derive(Debug, Clone)]
pub struct JsonApiProbe {
    name: String,
    fetcher: Arc<UpstreamFetcher>,
    url_template: String,
    user_pointer: &'static str,
    picture_pointers: Vec<&'static str>,
}

impl JsonApiProbe {
    /// Creates a probe; `{username}` in `url_template` is substituted.
    ///
    /// A null or missing value at `user_pointer` means the account does not
    /// exist; a present user without any picture pointer is a parse failure.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        fetcher: Arc<UpstreamFetcher>,
        url_template: impl Into<String>,
        user_pointer: &'static str,
        picture_pointers: Vec<&'static str>,
    ) -> Self {
        Self {
            name: name.into(),
            fetcher,
            url_template: url_template.into(),
            user_pointer,
            picture_pointers,
        }
    }

    /// `web_profile_info` endpoint.
    #[must_use]
    pub fn web_profile_info(fetcher: Arc<UpstreamFetcher>) -> Self {
        Self::new(
            "web_profile_info",
            fetcher,
            "https://i.instagram.com/api/v1/users/web_profile_info/?username={username}",
            "/data/user",
            vec!["/data/user/profile_pic_url_hd", "/data/user/profile_pic_url"],
        )
    }

    /// Legacy `?__a=1` page JSON.
    #[must_use]
    pub fn legacy_page_json(fetcher: Arc<UpstreamFetcher>) -> Self {
        Self::new(
            "legacy_a1",
            fetcher,
            "https://www.instagram.com/{username}/?__a=1&__d=dis",
            "/graphql/user",
            vec![
                "/graphql/user/profile_pic_url_hd",
                "/graphql/user/profile_pic_url",
            ],
        )
    }
}

#[async_trait]
impl ProbePort for JsonApiProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn attempt(&self, username: &Username, timeout: Duration) -> Result<String, ProbeFailure> {
        let url = self.url_template.replace("{username}", username.as_str());
        let body = self
            .fetcher
            .get_json(&url, api_headers(UaProfile::Any.pick()), timeout)
            .await?;

        if let Some(url) = json_pointer_url(&body, &self.picture_pointers) {
            return Ok(url);
        }

        match body.pointer(self.user_pointer) {
            None | Some(serde_json::Value::Null) => {
                Err(ProbeFailure::not_found("endpoint returned no user"))
            }
            Some(_) => Err(ProbeFailure::parse("user object has no picture field")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::test_server::serve;
    use axum::Router;
    use axum::routing::get;

    fn probe(base: &str) -> JsonApiProbe {
        JsonApiProbe::new(
            "web_profile_info",
            Arc::new(UpstreamFetcher::new().unwrap()),
            format!("{base}/info?username={{username}}"),
            "/data/user",
            vec!["/data/user/profile_pic_url_hd", "/data/user/profile_pic_url"],
        )
    }

    async fn run(body: &'static str) -> Result<String, ProbeFailure> {
        let base = serve(Router::new().route("/info", get(move || async move { body }))).await;
        probe(&base)
            .attempt(&Username::parse("alice").unwrap(), Duration::from_secs(5))
            .await
    }

    #[tokio::test]
    async fn test_reads_hd_picture() {
        let outcome =
            run(r#"{"data":{"user":{"profile_pic_url_hd":"https://cdn.example/hd.jpg"}}}"#).await;
        assert_eq!(outcome.unwrap(), "https://cdn.example/hd.jpg");
    }

    #[tokio::test]
    async fn test_null_user_is_not_found() {
        let outcome = run(r#"{"data":{"user":null},"status":"ok"}"#).await;
        assert!(matches!(outcome, Err(ProbeFailure::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_user_without_picture_is_parse_failure() {
        let outcome = run(r#"{"data":{"user":{"username":"alice"}}}"#).await;
        assert!(matches!(outcome, Err(ProbeFailure::ParseFailure { .. })));
    }

    #[tokio::test]
    async fn test_html_instead_of_json_is_parse_failure() {
        let outcome = run("<html>login</html>").await;
        assert!(matches!(outcome, Err(ProbeFailure::ParseFailure { .. })));
    }
}
