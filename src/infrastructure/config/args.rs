use super::app_config::LogLevel;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "oxigram",
    version,
    about = "Instagram profile-picture resolver with caching and an image proxy",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", global = true, env = "OXIGRAM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH", global = true, env = "OXIGRAM_LOG_PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum, global = true, env = "OXIGRAM_LOG_LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the HTTP server (`/profile`, `/proxy-image`, `/healthz`).
    Serve {
        /// Listen address, e.g. 127.0.0.1:3000.
        #[arg(long, value_name = "ADDR")]
        listen: Option<SocketAddr>,
    },

    /// Resolve one username in-process and print the raw picture URL.
    Lookup {
        /// Instagram username.
        username: String,
    },

    /// Load an avatar the way a client does: local cache, server, placeholder.
    Avatar {
        /// Instagram username.
        username: String,

        /// Server origin, overriding `client.base_url`.
        #[arg(long, value_name = "URL")]
        server: Option<String>,
    },

    /// Warm the local cache from a file of newline-separated usernames.
    Preload {
        /// Input file.
        file: PathBuf,
    },

    /// Manage the local avatar cache.
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum CacheCommand {
    /// Show entry counts and size.
    Stats,
    /// Remove every entry.
    Clear,
    /// Remove entries older than the given age.
    Prune {
        /// Age threshold in seconds.
        #[arg(long, value_name = "SECS")]
        older_than_secs: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cache_prune() {
        let args =
            CliArgs::parse_from(["oxigram", "cache", "prune", "--older-than-secs", "3600"]);

        assert!(matches!(
            args.command,
            Command::Cache {
                action: CacheCommand::Prune {
                    older_than_secs: 3600
                }
            }
        ));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = CliArgs::parse_from(["oxigram", "lookup", "alice", "--log-level", "debug"]);

        assert_eq!(args.log_level, Some(LogLevel::Debug));
        assert!(matches!(args.command, Command::Lookup { ref username } if username == "alice"));
    }
}
