//! Use case implementations.

mod load_avatar_use_case;
mod resolve_avatar_use_case;

pub use load_avatar_use_case::{
    AvatarSource, DEFAULT_PRELOAD_DELAY, DisplayAvatar, LoadAvatarUseCase,
};
pub use resolve_avatar_use_case::ResolveAvatarUseCase;
