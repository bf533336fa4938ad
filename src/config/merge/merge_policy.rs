//! Merge policy: built-in defaults form the lowest layer.

use crate::config::AppConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with `AppConfig::default()` so every later layer may be partial.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&AppConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}
