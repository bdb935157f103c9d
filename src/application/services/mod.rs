//! Application services: the resolution engine and its building blocks.

pub mod orchestrator;
pub mod proxy_url;
pub mod registry;
pub mod retry;
pub mod single_flight;

pub use orchestrator::{DEFAULT_GLOBAL_BUDGET, ResolutionOrchestrator};
pub use proxy_url::{DEFAULT_PROXY_PATH, ProxyUrl};
pub use registry::{ProbeRegistry, Tier, TierPolicy};
pub use retry::RetryPolicy;
pub use single_flight::SingleFlight;
