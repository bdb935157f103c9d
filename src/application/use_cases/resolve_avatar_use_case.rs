//! Server-side resolution entry point.

use std::sync::Arc;

use tracing::{debug, info};

use crate::application::dto::ProfileResponse;
use crate::application::services::{ProxyUrl, ResolutionOrchestrator, SingleFlight};
use crate::domain::entities::{ResolvedAvatar, Username};
use crate::domain::errors::ResolveError;
use crate::domain::ports::AvatarCachePort;

type Flights = SingleFlight<Username, Result<ResolvedAvatar, ResolveError>>;

/// Validates a username, answers from cache or runs one coalesced resolution.
#[derive(Clone)]
pub struct ResolveAvatarUseCase {
    cache: Arc<dyn AvatarCachePort>,
    orchestrator: Arc<ResolutionOrchestrator>,
    flights: Arc<Flights>,
    proxy: ProxyUrl,
}

impl ResolveAvatarUseCase {
    #[must_use]
    pub fn new(
        cache: Arc<dyn AvatarCachePort>,
        orchestrator: Arc<ResolutionOrchestrator>,
        proxy: ProxyUrl,
    ) -> Self {
        Self {
            cache,
            orchestrator,
            flights: Arc::new(SingleFlight::new()),
            proxy,
        }
    }

    /// Resolves `raw` into a proxied picture URL.
    ///
    /// # Errors
    /// Returns [`ResolveError::InvalidInput`] before any network activity when
    /// the username is malformed, otherwise the orchestrator's error.
    pub async fn execute(&self, raw: &str) -> Result<ProfileResponse, ResolveError> {
        let username = Username::parse(raw)?;

        if let Some(url) = self.cache.get(&username).await {
            debug!(username = %username, "Answered from server cache");
            return Ok(ProfileResponse {
                proxied_url: self.proxy.wrap(&url),
                cached: true,
            });
        }

        let cache = Arc::clone(&self.cache);
        let orchestrator = Arc::clone(&self.orchestrator);
        let key = username.clone();

        let (outcome, joined) = self
            .flights
            .run(key, move || async move {
                let avatar = orchestrator.resolve(&username).await?;
                cache.put(avatar.username(), avatar.url()).await;
                Ok(avatar)
            })
            .await;

        let avatar = outcome?;
        if joined {
            info!(username = %avatar.username(), "Joined in-flight resolution");
        }

        Ok(ProfileResponse {
            proxied_url: self.proxy.wrap(avatar.url()),
            cached: false,
        })
    }

    /// Number of resolutions currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.flights.in_flight()
    }
}

impl std::fmt::Debug for ResolveAvatarUseCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolveAvatarUseCase")
            .field("orchestrator", &self.orchestrator)
            .field("proxy", &self.proxy)
            .finish_non_exhaustive()
    }
}
