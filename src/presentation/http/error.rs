//! HTTP mapping of resolution and proxy errors.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::ErrorBody;
use crate::domain::errors::{ProxyError, ResolveError};

/// Error returned by a handler, rendered as `{error, message}` JSON.
#[derive(Debug)]
pub enum HttpError {
    /// Failure of `/profile`.
    Resolve(ResolveError),
    /// Failure of the image proxy route.
    Proxy(ProxyError),
}

impl HttpError {
    /// Status code sent to the client.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Resolve(ResolveError::InvalidInput { .. }) => StatusCode::BAD_REQUEST,
            Self::Resolve(ResolveError::NotFoundAnywhere { .. }) => StatusCode::NOT_FOUND,
            Self::Resolve(ResolveError::Timeout { .. }) | Self::Proxy(ProxyError::Timeout) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            Self::Proxy(ProxyError::MissingUrl | ProxyError::InvalidUrl { .. }) => {
                StatusCode::BAD_REQUEST
            }
            Self::Proxy(ProxyError::UpstreamStatus { status }) => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            Self::Proxy(ProxyError::UpstreamUnavailable { .. }) => StatusCode::BAD_GATEWAY,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            Self::Resolve(err) => {
                let label = match err {
                    ResolveError::InvalidInput { .. } => "Invalid username",
                    ResolveError::NotFoundAnywhere { .. } => "Profile picture not found",
                    ResolveError::Timeout { .. } => "Resolution timed out",
                };
                ErrorBody::new(label, err.hint())
            }
            Self::Proxy(err) => {
                let label = match err {
                    ProxyError::MissingUrl => "Missing image URL",
                    ProxyError::InvalidUrl { .. } => "Invalid image URL",
                    ProxyError::UpstreamStatus { .. } | ProxyError::UpstreamUnavailable { .. } => {
                        "Failed to fetch image"
                    }
                    ProxyError::Timeout => "Request timeout",
                };
                ErrorBody::new(label, err.to_string())
            }
        }
    }
}

impl From<ResolveError> for HttpError {
    fn from(err: ResolveError) -> Self {
        Self::Resolve(err)
    }
}

impl From<ProxyError> for HttpError {
    fn from(err: ProxyError) -> Self {
        Self::Proxy(err)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use test_case::test_case;

    #[test_case(ResolveError::invalid_input("bad"), StatusCode::BAD_REQUEST ; "invalid")]
    #[test_case(ResolveError::not_found_anywhere("ghost_user", 4), StatusCode::NOT_FOUND ; "not_found")]
    #[test_case(ResolveError::timeout("slow", Duration::from_secs(20)), StatusCode::GATEWAY_TIMEOUT ; "timeout")]
    fn test_resolve_status(err: ResolveError, expected: StatusCode) {
        assert_eq!(HttpError::from(err).status_code(), expected);
    }

    #[test_case(ProxyError::MissingUrl, StatusCode::BAD_REQUEST ; "missing")]
    #[test_case(ProxyError::invalid_url("ftp"), StatusCode::BAD_REQUEST ; "invalid")]
    #[test_case(ProxyError::UpstreamStatus { status: 403 }, StatusCode::FORBIDDEN ; "forwarded_403")]
    #[test_case(ProxyError::UpstreamStatus { status: 503 }, StatusCode::SERVICE_UNAVAILABLE ; "forwarded_503")]
    #[test_case(ProxyError::UpstreamStatus { status: 304 }, StatusCode::BAD_GATEWAY ; "non_error_status")]
    #[test_case(ProxyError::Timeout, StatusCode::GATEWAY_TIMEOUT ; "timeout")]
    #[test_case(ProxyError::unavailable("reset"), StatusCode::BAD_GATEWAY ; "unavailable")]
    fn test_proxy_status(err: ProxyError, expected: StatusCode) {
        assert_eq!(HttpError::from(err).status_code(), expected);
    }

    #[test]
    fn test_not_found_body_carries_hint() {
        let body = HttpError::from(ResolveError::not_found_anywhere("ghost_user", 4)).body();

        assert_eq!(body.error, "Profile picture not found");
        assert!(body.message.contains("private"));
    }
}
