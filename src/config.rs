//! Build configuration.
//!
//! Values come from an optional conf file (TOML, YAML or JSON, chosen by
//! extension) layered under `SPHINX_` prefixed environment variables.
//! Extensions register their own settings with defaults through
//! [`BuildConfig::add_config_value`]; anything not named by a typed field
//! lands in the free-form `values` table.

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::BuildError;

const ENV_PREFIX: &str = "SPHINX";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_project")]
    pub project: String,

    /// Extension names to load, in order
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Extension-owned settings, keyed by config value name
    #[serde(flatten)]
    pub values: BTreeMap<String, serde_json::Value>,
}

fn default_project() -> String {
    "Project".to_string()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            project: default_project(),
            extensions: Vec::new(),
            values: BTreeMap::new(),
        }
    }
}

impl BuildConfig {
    /// Load a configuration file, with environment overrides on top.
    pub fn from_file(path: &Path) -> Result<Self, BuildError> {
        if !path.exists() {
            return Err(BuildError::ConfigError(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        debug!("Loading configuration from {}", path.display());
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .map_err(|e| BuildError::ConfigError(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| BuildError::ConfigError(e.to_string()))
    }

    /// Configuration from environment variables alone.
    pub fn from_env() -> Result<Self, BuildError> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .map_err(|e| BuildError::ConfigError(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| BuildError::ConfigError(e.to_string()))
    }

    /// Register a config value; an already present value wins over the default.
    pub fn add_config_value(&mut self, name: &str, default: serde_json::Value) {
        self.values.entry(name.to_string()).or_insert(default);
    }

    pub fn set_value(&mut self, name: &str, value: serde_json::Value) {
        self.values.insert(name.to_string(), value);
    }

    /// String value of a setting; `None` when unset, null or not a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(|v| v.as_str())
    }
}
