//! Port definition for a single avatar source.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::entities::Username;
use crate::domain::errors::ProbeFailure;

/// One upstream strategy that tries to extract a profile-picture URL.
///
/// Implementations are stateless, perform one logical lookup per attempt and
/// must not run past `timeout`.
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Stable name used in logs and in [`ResolvedAvatar::source`].
    ///
    /// [`ResolvedAvatar::source`]: crate::domain::entities::ResolvedAvatar::source
    fn name(&self) -> &str;

    /// Attempts to resolve the raw upstream picture URL.
    async fn attempt(&self, username: &Username, timeout: Duration)
    -> Result<String, ProbeFailure>;
}
