//! Configuration for the annotation web service.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::AnnotatorConfig;
use crate::error::AnnoError;

/// Main service configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Annotation pipeline (provider + cache) configuration.
    #[serde(default)]
    pub annotator: AnnotatorConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to (default: "0.0.0.0").
    pub host: String,
    /// Port to listen on (default: 3000).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AnnoError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content).map_err(|e| AnnoError::Config {
            msg: format!("invalid config file: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write configuration to a TOML file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), AnnoError> {
        let content = toml::to_string_pretty(self).map_err(|e| AnnoError::Config {
            msg: format!("failed to serialize config: {e}"),
        })?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Check the configuration for values that cannot work.
    pub fn validate(&self) -> Result<(), AnnoError> {
        if self.server.host.is_empty() {
            return Err(AnnoError::Config {
                msg: "server.host must not be empty".to_string(),
            });
        }
        self.annotator.validate()
    }
}
