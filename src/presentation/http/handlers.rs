//! Route handlers.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::HttpError;
use super::state::AppState;
use crate::application::ProfileResponse;
use crate::domain::errors::ProxyError;
use crate::infrastructure::cache::CacheStats;

/// Cache lifetime granted to proxied images.
pub const IMAGE_CACHE_CONTROL: &str = "public, max-age=86400, immutable";

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: Option<String>,
}

/// `GET /healthz` body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub cache: CacheStats,
}

/// `GET /profile?username=`
pub async fn profile(
    State(state): State<AppState>,
    Query(query): Query<ProfileQuery>,
) -> Result<Json<ProfileResponse>, HttpError> {
    let raw = query.username.unwrap_or_default();
    let response = state.resolve.execute(&raw).await?;
    Ok(Json(response))
}

/// `GET /proxy-image?url=`
pub async fn proxy_image(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
) -> Result<Response, HttpError> {
    let url = query
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or(ProxyError::MissingUrl)?;

    let image = state.images.fetch(&url).await?;
    debug!(size = image.bytes.len(), "Serving proxied image");

    let content_type = HeaderValue::from_str(&image.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("image/jpeg"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CACHE_CONTROL,
                HeaderValue::from_static(IMAGE_CACHE_CONTROL),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            ),
        ],
        image.bytes,
    )
        .into_response())
}

/// `GET /healthz`
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cache: state.cache.stats().await,
    })
}
