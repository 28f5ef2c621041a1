use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Default PATH for the interpreter process
pub const DEFAULT_RUNTIME_PATH: &str = "/usr/local/bin:/usr/bin:/bin";

/// Interpreter used to run submissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Human-readable name reported with every batch (e.g., "Python 3")
    pub name: String,

    /// Command and arguments with placeholders
    /// Placeholders: {driver}, {source}, {request}, {result}
    pub command: Vec<String>,

    /// Environment variables to set
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// PATH environment variable for the interpreter
    ///
    /// Defaults to "/usr/local/bin:/usr/bin:/bin" if not specified.
    #[serde(default = "default_runtime_path")]
    pub path: String,
}

impl RuntimeConfig {
    /// Expand placeholders in the configured command
    pub fn expand_command(
        &self,
        driver: &str,
        source: &str,
        request: &str,
        result: &str,
    ) -> Vec<String> {
        self.command
            .iter()
            .map(|arg| {
                arg.replace("{driver}", driver)
                    .replace("{source}", source)
                    .replace("{request}", request)
                    .replace("{result}", result)
            })
            .collect()
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            name: "Python 3".to_string(),
            command: ["python3", "{driver}", "{source}", "{request}", "{result}"]
                .map(String::from)
                .to_vec(),
            env: HashMap::new(),
            path: default_runtime_path(),
        }
    }
}

fn default_runtime_path() -> String {
    DEFAULT_RUNTIME_PATH.to_owned()
}
