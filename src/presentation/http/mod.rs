//! axum HTTP surface: `/profile`, the image proxy and `/healthz`.

mod error;
mod handlers;
mod router;
mod state;

pub use error::HttpError;
pub use handlers::IMAGE_CACHE_CONTROL;
pub use router::create_router;
pub use state::AppState;
