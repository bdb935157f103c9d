//! Application configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::args::{CliArgs, Command};
use crate::application::services::{DEFAULT_PROXY_PATH, RetryPolicy, TierPolicy};

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration, read from `config.toml` and overridden by CLI flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log file path. Logs go to stderr when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Probe cascade settings.
    #[serde(default)]
    pub resolution: ResolutionConfig,

    /// Server result cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Image proxy settings.
    #[serde(default)]
    pub proxy: ProxyConfig,

    /// Client-side settings.
    #[serde(default)]
    pub client: ClientConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Path of the image proxy endpoint.
    #[serde(default = "default_proxy_path")]
    pub proxy_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            proxy_path: default_proxy_path(),
        }
    }
}

/// Execution policy of one tier, in plain numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierConfig {
    /// Per-attempt timeout.
    pub timeout_ms: u64,
    /// Retries after a transient failure.
    pub max_retries: u32,
    /// First backoff delay.
    pub backoff_base_ms: u64,
    /// Growth factor of the backoff delay.
    pub backoff_multiplier: f64,
    /// Pause before the tier starts.
    pub delay_before_ms: u64,
}

impl TierConfig {
    const fn new(timeout_ms: u64, max_retries: u32, backoff_base_ms: u64, delay_before_ms: u64) -> Self {
        Self {
            timeout_ms,
            max_retries,
            backoff_base_ms,
            backoff_multiplier: 1.5,
            delay_before_ms,
        }
    }

    /// Identity-resolution tier.
    #[must_use]
    pub const fn identity() -> Self {
        Self::new(8_000, 1, 400, 0)
    }

    /// First-party HTML tier.
    #[must_use]
    pub const fn page() -> Self {
        Self::new(6_000, 1, 400, 0)
    }

    /// First-party JSON tier.
    #[must_use]
    pub const fn api() -> Self {
        Self::new(6_000, 1, 500, 300)
    }

    /// Third-party mirror tier.
    #[must_use]
    pub const fn mirror() -> Self {
        Self::new(5_000, 0, 300, 0)
    }

    /// Converts to the orchestrator's policy type.
    #[must_use]
    pub fn policy(&self) -> TierPolicy {
        TierPolicy::new(
            Duration::from_millis(self.timeout_ms),
            RetryPolicy::new(
                self.max_retries,
                Duration::from_millis(self.backoff_base_ms),
                self.backoff_multiplier,
            ),
        )
        .with_delay_before(Duration::from_millis(self.delay_before_ms))
    }
}

impl Default for TierConfig {
    fn default() -> Self {
        Self::page()
    }
}

/// A third-party mirror page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Probe name used in logs.
    pub name: String,
    /// Page URL; `{username}` is substituted.
    pub url_template: String,
}

impl MirrorConfig {
    fn new(name: &str, url_template: &str) -> Self {
        Self {
            name: name.to_string(),
            url_template: url_template.to_string(),
        }
    }
}

/// Probe cascade configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Wall-clock budget for one resolution.
    #[serde(default = "default_global_budget_ms")]
    pub global_budget_ms: u64,

    /// Tier 0.
    #[serde(default = "TierConfig::identity")]
    pub identity: TierConfig,

    /// Tier 1.
    #[serde(default = "TierConfig::page")]
    pub page: TierConfig,

    /// Tier 2.
    #[serde(default = "TierConfig::api")]
    pub api: TierConfig,

    /// Tier 3.
    #[serde(default = "TierConfig::mirror")]
    pub mirror: TierConfig,

    /// Mirror pages raced in tier 3.
    #[serde(default = "default_mirrors")]
    pub mirrors: Vec<MirrorConfig>,
}

impl ResolutionConfig {
    #[must_use]
    pub const fn global_budget(&self) -> Duration {
        Duration::from_millis(self.global_budget_ms)
    }
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            global_budget_ms: default_global_budget_ms(),
            identity: TierConfig::identity(),
            page: TierConfig::page(),
            api: TierConfig::api(),
            mirror: TierConfig::mirror(),
            mirrors: default_mirrors(),
        }
    }
}

/// Server result cache configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry lifetime.
    pub ttl_secs: u64,
    /// Maximum number of usernames.
    pub capacity: usize,
}

impl CacheConfig {
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 24 * 60 * 60,
            capacity: 10_000,
        }
    }
}

/// Image proxy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Upstream fetch timeout.
    pub timeout_ms: u64,

    /// Lets `/proxy-image` reach loopback and private addresses.
    pub allow_private_hosts: bool,
}

impl ProxyConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            allow_private_hosts: false,
        }
    }
}

/// Client-side configuration for `avatar`, `preload` and `cache` commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Origin of the resolution server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Directory of the persisted cache; platform cache dir when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,

    /// Byte quota of the persisted cache.
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: u64,

    /// Pause between requests during a preload.
    #[serde(default = "default_preload_delay_ms")]
    pub preload_delay_ms: u64,
}

impl ClientConfig {
    #[must_use]
    pub const fn preload_delay(&self) -> Duration {
        Duration::from_millis(self.preload_delay_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            storage_dir: None,
            quota_bytes: default_quota_bytes(),
            preload_delay_ms: default_preload_delay_ms(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_proxy_path() -> String {
    DEFAULT_PROXY_PATH.to_string()
}

const fn default_global_budget_ms() -> u64 {
    20_000
}

fn default_mirrors() -> Vec<MirrorConfig> {
    vec![
        MirrorConfig::new("picuki", "https://www.picuki.com/profile/{username}"),
        MirrorConfig::new("imginn", "https://imginn.com/{username}/"),
        MirrorConfig::new("greatfon", "https://greatfon.com/v/{username}"),
    ]
}

fn default_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

const fn default_quota_bytes() -> u64 {
    5 * 1024 * 1024
}

const fn default_preload_delay_ms() -> u64 {
    100
}

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Command::Serve {
            listen: Some(listen),
        } = &args.command
        {
            self.server.listen = *listen;
        }
        if let Command::Avatar {
            server: Some(server),
            ..
        } = &args.command
        {
            self.client.base_url.clone_from(server);
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            log_level: LogLevel::Info,
            server: ServerConfig::default(),
            resolution: ResolutionConfig::default(),
            cache: CacheConfig::default(),
            proxy: ProxyConfig::default(),
            client: ClientConfig::default(),
        }
    }
}
