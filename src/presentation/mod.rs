//! Presentation layer: the axum HTTP surface and the CLI command runner.

/// Subcommand dispatch.
pub mod commands;
/// HTTP router and handlers.
pub mod http;

pub use commands::run;
pub use http::{AppState, create_router};
