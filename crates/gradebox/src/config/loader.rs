//! Configuration file loading for gradebox
//!
//! Handles loading and parsing configuration files using the config crate.

use std::path::Path;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};

use crate::config::{Config, ConfigError, ENV_PREFIX};
use crate::harness::is_identifier;

impl Config {
    /// Load configuration from a file.
    ///
    /// `GRADEBOX_`-prefixed environment variables override file values,
    /// with `__` separating nested keys (`GRADEBOX_DEFAULT_LIMITS__MAX_OUTPUT`).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        std::fs::metadata(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;

        let config = ConfigBuilder::builder()
            .add_source(File::from(path))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config = ConfigBuilder::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        if !is_identifier(&self.entry_point) {
            return Err(ConfigError::Invalid(format!(
                "entry point '{}' is not a valid identifier",
                self.entry_point
            )));
        }
        if self.runtime.name.is_empty() {
            return Err(ConfigError::Invalid("runtime has empty name".to_string()));
        }
        if self.runtime.command.is_empty() {
            return Err(ConfigError::Invalid("runtime has empty command".to_string()));
        }
        if !self.runtime.command.iter().any(|arg| arg.contains("{driver}")) {
            return Err(ConfigError::Invalid(
                "runtime command must reference {driver}".to_string(),
            ));
        }
        self.default_limits
            .require_deadline()
            .map_err(ConfigError::Invalid)?;

        Ok(())
    }
}
