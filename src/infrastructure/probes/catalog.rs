//! Default probe registry built from configuration.

use std::sync::Arc;

use super::fetch::UpstreamFetcher;
use super::json_api::JsonApiProbe;
use super::profile_page::ProfilePageProbe;
use super::user_id::UserIdProbe;
use crate::application::services::{ProbeRegistry, Tier};
use crate::infrastructure::config::ResolutionConfig;

/// Tier names in cascade order.
pub const TIER_NAMES: [&str; 4] = ["identity", "page", "api", "mirror"];

/// Builds the four-tier registry: identity chain, first-party HTML,
/// first-party JSON, then the configured mirrors.
#[must_use]
pub fn default_registry(fetcher: &Arc<UpstreamFetcher>, config: &ResolutionConfig) -> ProbeRegistry {
    let identity = Tier::new(TIER_NAMES[0], config.identity.policy())
        .with_probe(Arc::new(UserIdProbe::new(Arc::clone(fetcher))));

    let page = Tier::new(TIER_NAMES[1], config.page.policy())
        .with_probe(Arc::new(ProfilePageProbe::desktop(Arc::clone(fetcher))))
        .with_probe(Arc::new(ProfilePageProbe::mobile(Arc::clone(fetcher))));

    let api = Tier::new(TIER_NAMES[2], config.api.policy())
        .with_probe(Arc::new(JsonApiProbe::web_profile_info(Arc::clone(fetcher))))
        .with_probe(Arc::new(JsonApiProbe::legacy_page_json(Arc::clone(fetcher))));

    let mut mirror = Tier::new(TIER_NAMES[3], config.mirror.policy());
    for site in &config.mirrors {
        mirror.push(Arc::new(ProfilePageProbe::mirror(
            site.name.clone(),
            Arc::clone(fetcher),
            site.url_template.clone(),
        )));
    }

    ProbeRegistry::new()
        .with_tier(identity)
        .with_tier(page)
        .with_tier(api)
        .with_tier(mirror)
}
