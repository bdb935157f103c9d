//! Pure domain services.

pub mod fallback_avatar;
