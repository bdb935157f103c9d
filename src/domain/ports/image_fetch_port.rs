//! Port for fetching upstream image bytes server-side.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::errors::ProxyError;

/// Image bytes fetched from an upstream CDN.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    /// Upstream `Content-Type`, defaulted when missing.
    pub content_type: String,
    /// Raw body.
    pub bytes: Bytes,
}

/// Fetches images with browser-like headers so hotlink protection lets them through.
#[async_trait]
pub trait ImageFetchPort: Send + Sync {
    /// Fetches one upstream image.
    async fn fetch(&self, url: &str) -> Result<FetchedImage, ProxyError>;
}
