//! Application configuration.

pub mod app_config;
pub mod args;
pub mod loader;

pub use app_config::{
    AppConfig, CacheConfig, ClientConfig, LogLevel, MirrorConfig, ProxyConfig, ResolutionConfig,
    ServerConfig, TierConfig,
};
pub use args::{CacheCommand, CliArgs, Command};
pub use loader::{ConfigError, ConfigLoader, ConfigOrigin, project_dirs};
