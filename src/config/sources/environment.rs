//! Environment variable source: DESKVFS_ prefix with __ separator

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment};

/// Add the environment overlay, e.g. `DESKVFS__SYNC__INTERVAL_MS=500`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix("DESKVFS")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    ))
}
