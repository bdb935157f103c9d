//! Client-side avatar loading with a persisted cache and placeholder fallback.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::application::dto::PreloadSummary;
use crate::application::services::ProxyUrl;
use crate::domain::entities::Username;
use crate::domain::ports::{AvatarCachePort, ProfileApiPort};
use crate::domain::services::fallback_avatar;

/// Default pause between network requests during a preload.
pub const DEFAULT_PRELOAD_DELAY: Duration = Duration::from_millis(100);

/// Where a displayed avatar came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarSource {
    /// Local persisted cache, no network involved.
    ClientCache,
    /// Entry point answer; `cached` mirrors the server's own flag.
    Server {
        /// Whether the server answered from its cache.
        cached: bool,
    },
    /// Deterministic generated placeholder.
    Placeholder,
}

impl std::fmt::Display for AvatarSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClientCache => write!(f, "client cache"),
            Self::Server { cached: true } => write!(f, "server cache"),
            Self::Server { cached: false } => write!(f, "fresh resolution"),
            Self::Placeholder => write!(f, "placeholder"),
        }
    }
}

/// Something that can be put in an `<img src>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayAvatar {
    /// Proxied URL or `data:` URI.
    pub url: String,
    /// Origin of the URL.
    pub source: AvatarSource,
}

/// Resolves avatars for display, never failing.
#[derive(Clone)]
pub struct LoadAvatarUseCase {
    cache: Arc<dyn AvatarCachePort>,
    api: Arc<dyn ProfileApiPort>,
    proxy: ProxyUrl,
    preload_delay: Duration,
}

impl LoadAvatarUseCase {
    #[must_use]
    pub fn new(
        cache: Arc<dyn AvatarCachePort>,
        api: Arc<dyn ProfileApiPort>,
        proxy: ProxyUrl,
    ) -> Self {
        Self {
            cache,
            api,
            proxy,
            preload_delay: DEFAULT_PRELOAD_DELAY,
        }
    }

    #[must_use]
    pub const fn with_preload_delay(mut self, delay: Duration) -> Self {
        self.preload_delay = delay;
        self
    }

    /// Returns a displayable avatar for `raw`.
    ///
    /// Order: persisted cache, then the entry point, then a generated
    /// placeholder. Only the raw upstream URL is persisted.
    pub async fn load(&self, raw: &str) -> DisplayAvatar {
        let username = match Username::parse(raw) {
            Ok(username) => username,
            Err(e) => {
                debug!(error = %e, "Rejected username, using placeholder");
                return DisplayAvatar {
                    url: fallback_avatar::unknown_data_uri(),
                    source: AvatarSource::Placeholder,
                };
            }
        };

        if let Some(url) = self.cache.get(&username).await {
            debug!(username = %username, "Client cache hit");
            return DisplayAvatar {
                url: self.proxy.wrap(&url),
                source: AvatarSource::ClientCache,
            };
        }

        match self.fetch_and_store(&username).await {
            Some(avatar) => avatar,
            None => DisplayAvatar {
                url: fallback_avatar::data_uri(&username),
                source: AvatarSource::Placeholder,
            },
        }
    }

    /// Warms the persisted cache for several usernames, one at a time.
    ///
    /// Already-cached usernames count as successes without a request.
    /// `on_progress` receives `(done, total)` after each username.
    pub async fn preload<S, F>(&self, usernames: &[S], mut on_progress: F) -> PreloadSummary
    where
        S: AsRef<str>,
        F: FnMut(usize, usize),
    {
        let total = usernames.len();
        let mut summary = PreloadSummary::default();

        for (index, raw) in usernames.iter().enumerate() {
            let Ok(username) = Username::parse(raw.as_ref()) else {
                summary.failed += 1;
                on_progress(index + 1, total);
                continue;
            };

            if self.cache.get(&username).await.is_some() {
                summary.success += 1;
                on_progress(index + 1, total);
                continue;
            }

            if self.fetch_and_store(&username).await.is_some() {
                summary.success += 1;
            } else {
                summary.failed += 1;
            }
            on_progress(index + 1, total);

            if index + 1 < total && !self.preload_delay.is_zero() {
                tokio::time::sleep(self.preload_delay).await;
            }
        }

        info!(success = summary.success, failed = summary.failed, "Preload finished");
        summary
    }

    async fn fetch_and_store(&self, username: &Username) -> Option<DisplayAvatar> {
        let lookup = match self.api.lookup(username).await {
            Ok(lookup) => lookup,
            Err(e) => {
                warn!(username = %username, error = %e, "Entry point lookup failed");
                return None;
            }
        };

        let source = AvatarSource::Server {
            cached: lookup.cached,
        };

        let Some(raw_url) = ProxyUrl::raw_from(&lookup.proxied_url) else {
            warn!(username = %username, "Entry point answered without a url parameter");
            return Some(DisplayAvatar {
                url: lookup.proxied_url,
                source,
            });
        };

        if !self.cache.put(username, &raw_url).await {
            debug!(username = %username, "Client cache dropped write");
        }

        Some(DisplayAvatar {
            url: self.proxy.wrap(&raw_url),
            source,
        })
    }
}

impl std::fmt::Debug for LoadAvatarUseCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadAvatarUseCase")
            .field("proxy", &self.proxy)
            .field("preload_delay", &self.preload_delay)
            .finish_non_exhaustive()
    }
}
