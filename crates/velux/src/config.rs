//! Integration configuration

use std::path::{Path, PathBuf};

use klf200::GatewayConfig;
use serde::Deserialize;
use thiserror::Error;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading the velux configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse or validate the YAML structure
    ///
    /// Missing required keys and unrecognized keys both land here.
    #[error("invalid velux configuration: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    /// A required setting is present but empty
    #[error("required setting '{key}' must not be empty")]
    EmptyValue { key: &'static str },
}

/// Configuration for the velux integration
///
/// Exactly two settings, both required; no optional keys are recognized.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VeluxConfig {
    /// Network address of the KLF-200
    pub host: String,

    /// Gateway password
    pub password: String,
}

impl VeluxConfig {
    /// Create a configuration from parts
    pub fn new(host: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            password: password.into(),
        }
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: VeluxConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML config file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    /// The gateway connection settings this config describes
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig::new(&self.host, &self.password)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyValue { key: "host" });
        }
        if self.password.trim().is_empty() {
            return Err(ConfigError::EmptyValue { key: "password" });
        }
        Ok(())
    }
}
