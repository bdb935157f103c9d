//! Domain error types.

mod api_error;
mod probe_failure;
mod proxy_error;
mod resolve_error;
mod storage_error;

pub use api_error::ApiError;
pub use probe_failure::ProbeFailure;
pub use proxy_error::ProxyError;
pub use resolve_error::ResolveError;
pub use storage_error::StorageError;
