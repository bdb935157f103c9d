//! Wrapping of raw CDN URLs into same-origin proxy URLs.

/// Default path of the image proxy endpoint.
pub const DEFAULT_PROXY_PATH: &str = "/proxy-image";

/// Builds and parses `<base>?url=<percent-encoded raw url>`.
///
/// The base is either a relative path (server side) or an absolute
/// `http://host:port/proxy-image` (client side).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyUrl {
    base: String,
}

impl ProxyUrl {
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    /// Joins a server origin and the proxy path.
    #[must_use]
    pub fn absolute(origin: &str, path: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Self::new(format!("{origin}/{path}"))
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Wraps a raw upstream URL.
    #[must_use]
    pub fn wrap(&self, raw: &str) -> String {
        format!("{}?url={}", self.base, urlencoding::encode(raw))
    }

    /// Recovers the raw URL from a proxied one.
    ///
    /// Accepts any proxied URL regardless of its base, since the server may
    /// be reached under a different origin than the one configured here.
    #[must_use]
    pub fn raw_from(proxied: &str) -> Option<String> {
        let (_, query) = proxied.split_once('?')?;
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(name, _)| *name == "url")
            .and_then(|(_, value)| urlencoding::decode(value).ok())
            .map(|decoded| decoded.into_owned())
            .filter(|raw| !raw.is_empty())
    }
}

impl Default for ProxyUrl {
    fn default() -> Self {
        Self::new(DEFAULT_PROXY_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_wrap_percent_encodes_raw_url() {
        let proxy = ProxyUrl::default();

        assert_eq!(
            proxy.wrap("https://cdn.example/a.jpg"),
            "/proxy-image?url=https%3A%2F%2Fcdn.example%2Fa.jpg"
        );
    }

    #[test]
    fn test_wrap_keeps_query_of_raw_url_inside_parameter() {
        let proxy = ProxyUrl::default();
        let raw = "https://scontent.cdninstagram.com/v/t51/p.jpg?stp=dst-jpg&_nc_ht=x";

        let wrapped = proxy.wrap(raw);

        assert_eq!(wrapped.matches('?').count(), 1);
        assert_eq!(ProxyUrl::raw_from(&wrapped).as_deref(), Some(raw));
    }

    #[test]
    fn test_absolute_joins_origin_and_path() {
        let proxy = ProxyUrl::absolute("http://127.0.0.1:3000/", "/proxy-image");

        assert_eq!(proxy.base(), "http://127.0.0.1:3000/proxy-image");
        assert!(
            proxy
                .wrap("https://cdn.example/a.jpg")
                .starts_with("http://127.0.0.1:3000/proxy-image?url=https%3A")
        );
    }

    #[test_case("/proxy-image" ; "no_query")]
    #[test_case("/proxy-image?url=" ; "empty_value")]
    #[test_case("/proxy-image?other=1" ; "missing_parameter")]
    fn test_unwrap_rejects(proxied: &str) {
        assert_eq!(ProxyUrl::raw_from(proxied), None);
    }

    #[test]
    fn test_unwrap_finds_parameter_among_others() {
        assert_eq!(
            ProxyUrl::raw_from("http://h/proxy-image?v=2&url=https%3A%2F%2Fcdn.example%2Fb.jpg")
                .as_deref(),
            Some("https://cdn.example/b.jpg")
        );
    }
}
