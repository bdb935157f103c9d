//! Client adapters for the resolution entry point.

mod http_profile_api;

pub use http_profile_api::{DEFAULT_API_TIMEOUT, HttpProfileApi};
