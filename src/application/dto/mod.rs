//! Data transfer objects.

mod profile_dto;

pub use profile_dto::{ErrorBody, PreloadSummary, ProfileResponse};
