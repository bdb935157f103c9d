//! Shared handler state.

use std::sync::Arc;

use crate::application::ResolveAvatarUseCase;
use crate::domain::ports::ImageFetchPort;
use crate::infrastructure::cache::MemoryAvatarCache;

/// Everything the HTTP handlers need, cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    /// Server entry point.
    pub resolve: ResolveAvatarUseCase,
    /// Upstream image fetcher behind the proxy route.
    pub images: Arc<dyn ImageFetchPort>,
    /// Server result cache, read for `/healthz`.
    pub cache: Arc<MemoryAvatarCache>,
}

impl AppState {
    #[must_use]
    pub fn new(
        resolve: ResolveAvatarUseCase,
        images: Arc<dyn ImageFetchPort>,
        cache: Arc<MemoryAvatarCache>,
    ) -> Self {
        Self {
            resolve,
            images,
            cache,
        }
    }
}
