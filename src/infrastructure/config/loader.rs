//! Locates, reads and seeds `config.toml`.

use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use thiserror::Error;

use super::app_config::AppConfig;

const CONFIG_FILE_NAME: &str = "config.toml";

/// Platform directories of oxigram (config and cache roots).
#[must_use]
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "linuxmobile", "oxigram")
}

/// Failures while locating, reading or seeding the configuration file.
///
/// A file that exists but does not parse is not an error; see
/// [`ConfigOrigin::Fallback`].
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ConfigError {
    #[error("no platform configuration directory available")]
    NoConfigDir,

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write default configuration to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode default configuration: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Parsed from an existing file.
    File(PathBuf),
    /// No file existed, so the defaults were written there.
    Seeded(PathBuf),
    /// The file did not parse. Defaults are in use and the file is untouched.
    Fallback {
        /// Offending file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "loaded {}", path.display()),
            Self::Seeded(path) => write!(f, "wrote defaults to {}", path.display()),
            Self::Fallback { path, reason } => {
                write!(f, "ignored invalid {} ({reason}), using defaults", path.display())
            }
        }
    }
}

/// Turns one configuration file into an [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    /// Uses `explicit` when given, otherwise `config.toml` in the platform
    /// config directory.
    ///
    /// # Errors
    /// Returns [`ConfigError::NoConfigDir`] when no explicit path is given and
    /// the platform has no config directory.
    pub fn locate(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Ok(Self::at(path));
        }
        let dirs = project_dirs().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::at(dirs.config_dir().join(CONFIG_FILE_NAME)))
    }

    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file. A missing file is seeded with defaults; a malformed
    /// one is reported through [`ConfigOrigin::Fallback`].
    ///
    /// Nothing is logged here: callers log the origin once logging is up.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read, or if the
    /// defaults cannot be written.
    pub fn load(&self) -> Result<(AppConfig, ConfigOrigin), ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let config = AppConfig::default();
                self.seed(&config)?;
                return Ok((config, ConfigOrigin::Seeded(self.path.clone())));
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        Ok(match toml::from_str::<AppConfig>(&text) {
            Ok(config) => (config, ConfigOrigin::File(self.path.clone())),
            Err(e) => (
                AppConfig::default(),
                ConfigOrigin::Fallback {
                    path: self.path.clone(),
                    reason: e.to_string().trim().to_string(),
                },
            ),
        })
    }

    /// Writes `config` through a staged temp file so a crash never leaves a
    /// half-written file behind.
    fn seed(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(config)?;
        let write_err = |source: std::io::Error| ConfigError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(write_err)?;

        let mut staged = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        staged.write_all(text.as_bytes()).map_err(write_err)?;
        staged.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_seeded_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let (config, origin) = ConfigLoader::at(&path).load().unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(origin, ConfigOrigin::Seeded(path.clone()));
        let seeded: AppConfig = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(seeded, AppConfig::default());
    }

    #[test]
    fn test_second_load_reads_the_seeded_file() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::at(dir.path().join(CONFIG_FILE_NAME));

        loader.load().unwrap();
        let (_, origin) = loader.load().unwrap();

        assert_eq!(origin, ConfigOrigin::File(loader.path().to_path_buf()));
    }

    #[test]
    fn test_invalid_toml_falls_back_and_keeps_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[server\nlisten = ").unwrap();

        let (config, origin) = ConfigLoader::at(&path).load().unwrap();

        assert_eq!(config, AppConfig::default());
        assert!(matches!(origin, ConfigOrigin::Fallback { ref reason, .. } if !reason.is_empty()));
        assert_eq!(fs::read_to_string(&path).unwrap(), "[server\nlisten = ");
    }

    #[test]
    fn test_explicit_path_wins() {
        let dir = tempdir().unwrap();
        let custom = dir.path().join("custom.toml");
        fs::write(&custom, "[cache]\nttl_secs = 60\n").unwrap();

        let loader = ConfigLoader::locate(Some(&custom)).unwrap();
        let (config, _) = loader.load().unwrap();

        assert_eq!(loader.path(), custom);
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.cache.capacity, AppConfig::default().cache.capacity);
    }

    #[test]
    fn test_unreadable_path_is_an_error() {
        let dir = tempdir().unwrap();

        let err = ConfigLoader::at(dir.path()).load().unwrap_err();

        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
