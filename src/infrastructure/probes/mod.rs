//! Upstream probes over `reqwest`.

mod catalog;
mod extract;
mod fetch;
mod json_api;
mod profile_page;
mod user_id;

pub use catalog::{TIER_NAMES, default_registry};
pub use extract::{ExtractOutcome, PatternSet, clean_url, extract};
pub use fetch::{UaProfile, UpstreamFetcher, classify_status};
pub use json_api::JsonApiProbe;
pub use profile_page::ProfilePageProbe;
pub use user_id::UserIdProbe;
