mod avatar_cache_port;
mod clock_port;
mod image_fetch_port;
mod key_value_store_port;
mod probe_port;
mod profile_api_port;

pub use avatar_cache_port::AvatarCachePort;
pub use clock_port::ClockPort;
pub use image_fetch_port::{FetchedImage, ImageFetchPort};
pub use key_value_store_port::KeyValueStorePort;
pub use probe_port::ProbePort;
pub use profile_api_port::{ProfileApiPort, ProfileLookup};
