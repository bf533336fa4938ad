//! MergeService: orchestrates sources and deserializes to `AppConfig`.

use super::merge_policy;
use crate::config::sources::{environment, explicit_file, global_file};
use crate::config::AppConfig;
use config::ConfigError;
use std::path::Path;

pub struct MergeService;

impl MergeService {
    /// Precedence: defaults (lowest) -> global file -> explicit file -> environment (highest).
    pub fn load(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = match explicit {
            Some(path) => explicit_file::add_to_builder(builder, path)?,
            None => builder,
        };
        let builder = environment::add_to_builder(builder)?;

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn explicit_file_overrides_defaults_and_keeps_the_rest() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[sync]\ninterval_ms = 500\n\n[shell]\nhome = \"/users/me\"").unwrap();

        let config = MergeService::load(Some(file.path())).unwrap();
        assert_eq!(config.sync.interval_ms, 500);
        assert_eq!(config.shell.home, "/users/me");
        assert_eq!(config.shell.max_transcript, 500);
        assert_eq!(config.remote.base_url, "http://localhost:3000");
    }
}
