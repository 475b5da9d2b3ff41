//! Bridge configuration.
//!
//! [`BridgeConfig`] is always available; loading it from TOML requires the
//! `config` feature.

#[cfg(feature = "config")]
use serde::Deserialize;
#[cfg(feature = "config")]
use std::path::Path;
#[cfg(feature = "config")]
use thiserror::Error;

/// Bridge configuration, optionally loaded from a TOML file.
///
/// Every field has a default, so an empty document is a valid configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Deserialize), serde(default))]
pub struct BridgeConfig {
    /// Name of the module created at init and used by `create_function`.
    pub main_module: String,
    /// Size of each namespace's dispatch table.
    pub max_slots: usize,
    /// Prefix function docs with a generated call signature.
    pub signature_docs: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            main_module: "__main__".to_string(),
            max_slots: 1024,
            signature_docs: true,
        }
    }
}

#[cfg(feature = "config")]
impl BridgeConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().display().to_string(), e))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        if config.max_slots == 0 {
            return Err(ConfigError::Invalid("max_slots must be positive".to_string()));
        }
        Ok(config)
    }
}

/// Configuration error.
#[cfg(feature = "config")]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file '{0}': {1}")]
    Io(String, #[source] std::io::Error),
    /// TOML parse error.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// Semantically invalid value.
    #[error("Invalid config: {0}")]
    Invalid(String),
}
