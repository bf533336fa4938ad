//! Global config file: `$XDG_CONFIG_HOME/deskvfs/config.toml`, optional.

use crate::config::paths::xdg_root;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use tracing::debug;

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let Ok(path) = xdg_root::global_config_path() else {
        return Ok(builder);
    };
    debug!(path = %path.display(), "global config source");
    Ok(builder.add_source(File::from(path).format(FileFormat::Toml).required(false)))
}
