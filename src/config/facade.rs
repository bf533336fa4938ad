//! ConfigLoader facade delegating to the merge service.

use super::merge::service::MergeService;
use super::AppConfig;
use crate::error::ApiError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from the global file and environment, then validate.
    pub fn load() -> Result<AppConfig, ApiError> {
        Self::finish(MergeService::load(None)?)
    }

    /// Load with an explicit file layered over the global one, then validate.
    pub fn load_with_file(path: &Path) -> Result<AppConfig, ApiError> {
        if !path.exists() {
            return Err(ApiError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        Self::finish(MergeService::load(Some(path))?)
    }

    pub fn default() -> AppConfig {
        AppConfig::default()
    }

    fn finish(config: AppConfig) -> Result<AppConfig, ApiError> {
        config.validate()?;
        Ok(config.normalized())
    }
}
