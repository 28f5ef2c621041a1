use std::path::PathBuf;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

pub use crate::config::runtime::{DEFAULT_RUNTIME_PATH, RuntimeConfig};
use crate::types::ResourceLimits;

mod loader;
pub mod runtime;

/// Example configuration embedded at compile time.
///
/// Library users can access this to generate a starter config file.
pub const EXAMPLE_CONFIG: &str = include_str!("../../gradebox.example.toml");

/// Prefix of environment variables overriding file-loaded configs
pub const ENV_PREFIX: &str = "GRADEBOX";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Config for gradebox
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Name of the callable a free-form submission must define
    #[serde(default = "default_entry_point")]
    pub entry_point: String,

    /// Interpreter used to run every invocation
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Default resource limits applied to every invocation.
    /// This will be overridden if the batch request specifies different limits.
    /// Fields omitted from the table keep their built-in values.
    #[serde(default, deserialize_with = "limits_over_builtin")]
    pub default_limits: ResourceLimits,
}

impl Config {
    /// Create a new config from the embedded defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge resource limits with defaults
    pub fn effective_limits(&self, overrides: Option<&ResourceLimits>) -> ResourceLimits {
        match overrides {
            Some(limits) => self.default_limits.with_overrides(limits),
            None => self.default_limits.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_toml(EXAMPLE_CONFIG).expect("embedded default config should be valid")
    }
}

fn default_entry_point() -> String {
    "execute".to_owned()
}

fn limits_over_builtin<'de, D>(deserializer: D) -> Result<ResourceLimits, D::Error>
where
    D: Deserializer<'de>,
{
    let configured = ResourceLimits::deserialize(deserializer)?;
    Ok(ResourceLimits::default().with_overrides(&configured))
}
