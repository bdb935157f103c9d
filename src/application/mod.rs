//! Application layer: the resolution engine, use cases and DTOs.

/// Data transfer objects.
pub mod dto;
/// Resolution engine building blocks.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use dto::{ErrorBody, PreloadSummary, ProfileResponse};
pub use use_cases::{LoadAvatarUseCase, ResolveAvatarUseCase};
