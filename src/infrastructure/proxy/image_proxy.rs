//! Server-side image fetcher behind `/proxy-image`.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Url, redirect};
use tracing::{debug, warn};

use crate::domain::errors::ProxyError;
use crate::domain::ports::{FetchedImage, ImageFetchPort};

/// Default upstream fetch timeout.
pub const DEFAULT_PROXY_TIMEOUT: Duration = Duration::from_secs(10);

/// Content type reported when upstream omits one.
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const INSTAGRAM_REFERER: &str = "https://www.instagram.com/";
const INSTAGRAM_HOSTS: [&str; 3] = ["cdninstagram.com", "fbcdn.net", "instagram.com"];
const MAX_REDIRECTS: usize = 10;

/// Fetches upstream images with headers that pass hotlink protection.
#[derive(Debug, Clone)]
pub struct HttpImageProxy {
    client: Client,
    timeout: Duration,
    allow_private_hosts: bool,
}

impl HttpImageProxy {
    /// Creates a proxy that only reaches public hosts, redirects included.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::build(timeout, false)
    }

    /// Creates a proxy that may also reach loopback and private networks.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn with_private_hosts(timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::build(timeout, true)
    }

    fn build(timeout: Duration, allow_private_hosts: bool) -> Result<Self, reqwest::Error> {
        let policy = if allow_private_hosts {
            redirect::Policy::limited(MAX_REDIRECTS)
        } else {
            redirect::Policy::custom(|attempt| {
                if attempt.previous().len() >= MAX_REDIRECTS {
                    attempt.error("too many redirects")
                } else if is_public_host(attempt.url()) {
                    attempt.follow()
                } else {
                    attempt.error("redirect to a non-public host")
                }
            })
        };
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(policy)
            .build()?;
        Ok(Self {
            client,
            timeout,
            allow_private_hosts,
        })
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub const fn allows_private_hosts(&self) -> bool {
        self.allow_private_hosts
    }

    async fn download(&self, url: Url) -> Result<FetchedImage, ProxyError> {
        let response = self
            .client
            .get(url.clone())
            .headers(image_headers(&url))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Upstream image request failed");
            return Err(ProxyError::UpstreamStatus {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or_else(|| DEFAULT_CONTENT_TYPE.to_string(), String::from);

        let bytes = response.bytes().await.map_err(|e| transport_error(&e))?;

        Ok(FetchedImage {
            content_type,
            bytes,
        })
    }
}

#[async_trait]
impl ImageFetchPort for HttpImageProxy {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, ProxyError> {
        let url = validate_url(url)?;
        if !self.allow_private_hosts && !is_public_host(&url) {
            warn!(host = url.host_str().unwrap_or_default(), "Refusing non-public image host");
            return Err(ProxyError::invalid_url("host is not publicly routable"));
        }
        debug!(url = %truncate(url.as_str(), 100), "Fetching upstream image");

        let image = tokio::time::timeout(self.timeout, self.download(url))
            .await
            .map_err(|_| ProxyError::Timeout)??;

        debug!(size = image.bytes.len(), content_type = %image.content_type, "Fetched upstream image");
        Ok(image)
    }
}

/// Accepts absolute `http`/`https` URLs with a host.
///
/// # Errors
/// Returns [`ProxyError::MissingUrl`] for an empty string and
/// [`ProxyError::InvalidUrl`] otherwise.
pub fn validate_url(raw: &str) -> Result<Url, ProxyError> {
    if raw.trim().is_empty() {
        return Err(ProxyError::MissingUrl);
    }
    let url = Url::parse(raw.trim()).map_err(|e| ProxyError::invalid_url(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ProxyError::invalid_url(format!(
            "unsupported scheme {}",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ProxyError::invalid_url("missing host"));
    }
    Ok(url)
}

/// False for `localhost` and for literal addresses in loopback, private,
/// link-local, unspecified or broadcast ranges. Names are not resolved.
#[must_use]
pub fn is_public_host(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    if host == "localhost" || host.ends_with(".localhost") {
        return false;
    }
    match host.trim_start_matches('[').trim_end_matches(']').parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => is_public_v4(ip),
        Ok(IpAddr::V6(ip)) => is_public_v6(ip),
        Err(_) => true,
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    !(ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast())
}

fn is_public_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_public_v4(v4);
    }
    let first = ip.segments()[0];
    let unique_local = first & 0xfe00 == 0xfc00;
    let link_local = first & 0xffc0 == 0xfe80;
    !(ip.is_loopback() || ip.is_unspecified() || unique_local || link_local)
}

/// Referer the upstream expects: the first-party site for its CDNs, the
/// image's own origin elsewhere.
#[must_use]
pub fn referer_for(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    let first_party = INSTAGRAM_HOSTS
        .iter()
        .any(|suffix| host == *suffix || host.ends_with(&format!(".{suffix}")));

    if first_party {
        INSTAGRAM_REFERER.to_string()
    } else {
        format!("{}/", url.origin().ascii_serialization())
    }
}

fn image_headers(url: &Url) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    if let Ok(referer) = HeaderValue::from_str(&referer_for(url)) {
        headers.insert(header::REFERER, referer);
    }
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("image"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("no-cors"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("cross-site"),
    );
    headers
}

fn transport_error(err: &reqwest::Error) -> ProxyError {
    if err.is_timeout() {
        ProxyError::Timeout
    } else {
        ProxyError::unavailable(err.to_string())
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
