//! Route table.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use super::handlers::{healthz, profile, proxy_image};
use super::state::AppState;

/// Builds the application router; the image proxy is mounted at `proxy_path`.
pub fn create_router(state: AppState, proxy_path: &str) -> Router {
    Router::new()
        .route("/profile", get(profile))
        .route(proxy_path, get(proxy_image))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
