//! Configuration
//!
//! `AppConfig` is assembled by [`ConfigLoader`] from built-in defaults, the
//! global config file, an optional explicit file and `DESKVFS__*` environment
//! variables, in that order of precedence.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::path;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use facade::ConfigLoader;

/// Remote REST store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_interval_ms() -> u64 {
    2000
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Interactive surfaces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellConfig {
    #[serde(default = "default_home")]
    pub home: String,
    #[serde(default = "default_max_transcript")]
    pub max_transcript: usize,
    /// Notes auto-save quiet period
    #[serde(default = "default_autosave_ms")]
    pub autosave_ms: u64,
    #[serde(default = "default_notes_dir")]
    pub notes_dir: String,
}

fn default_home() -> String {
    path::DEFAULT_HOME.to_string()
}

fn default_max_transcript() -> usize {
    500
}

fn default_autosave_ms() -> u64 {
    1000
}

fn default_notes_dir() -> String {
    "/home/notes".to_string()
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            home: default_home(),
            max_transcript: default_max_transcript(),
            autosave_ms: default_autosave_ms(),
            notes_dir: default_notes_dir(),
        }
    }
}

impl ShellConfig {
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_ms)
    }
}

/// On-device store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// sled directory; empty means the XDG data directory
    #[serde(default)]
    pub path: PathBuf,
}

impl StorageConfig {
    pub fn resolve(&self) -> Result<PathBuf, ApiError> {
        if !self.path.as_os_str().is_empty() {
            return Ok(self.path.clone());
        }
        paths::xdg_root::store_dir()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub shell: ShellConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.sync.interval_ms == 0 {
            return Err(ApiError::ConfigError(
                "sync.interval_ms must be greater than zero".to_string(),
            ));
        }
        if !self.shell.home.starts_with('/') {
            return Err(ApiError::ConfigError(format!(
                "shell.home must be an absolute path, got '{}'",
                self.shell.home
            )));
        }
        if !self.shell.notes_dir.starts_with('/') {
            return Err(ApiError::ConfigError(format!(
                "shell.notes_dir must be an absolute path, got '{}'",
                self.shell.notes_dir
            )));
        }
        if self.shell.max_transcript == 0 {
            return Err(ApiError::ConfigError(
                "shell.max_transcript must be greater than zero".to_string(),
            ));
        }
        let url = &self.remote.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ApiError::ConfigError(format!(
                "remote.base_url must start with http:// or https://, got '{}'",
                url
            )));
        }
        crate::logging::validate(&self.logging)
    }

    /// Canonical home and notes paths, as the shell resolves them
    pub fn normalized(mut self) -> Self {
        self.shell.home = path::resolve(&self.shell.home, path::ROOT);
        self.shell.notes_dir = path::resolve(&self.shell.notes_dir, path::ROOT);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.sync.interval(), Duration::from_secs(2));
        assert_eq!(config.shell.notes_dir, "/home/notes");
    }

    #[test]
    fn relative_home_is_rejected() {
        let mut config = AppConfig::default();
        config.shell.home = "home".into();
        assert!(matches!(config.validate(), Err(ApiError::ConfigError(_))));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut config = AppConfig::default();
        config.sync.interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn base_url_needs_http_scheme() {
        let mut config = AppConfig::default();
        config.remote.base_url = "localhost:3000".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn normalized_strips_trailing_slashes() {
        let mut config = AppConfig::default();
        config.shell.home = "/users/me/".into();
        let config = config.normalized();
        assert_eq!(config.shell.home, "/users/me");
    }
}
