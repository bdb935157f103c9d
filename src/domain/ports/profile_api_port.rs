//! Port for calling the resolution entry point from a client.

use async_trait::async_trait;

use crate::domain::entities::Username;
use crate::domain::errors::ApiError;

/// Answer from the resolution entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileLookup {
    /// URL routed through the image proxy.
    pub proxied_url: String,
    /// Whether the server answered from its own cache.
    pub cached: bool,
}

/// Client view of `GET /profile?username=…`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileApiPort: Send + Sync {
    /// Resolves a username through the entry point.
    async fn lookup(&self, username: &Username) -> Result<ProfileLookup, ApiError>;
}
