//! Annotator configuration.
//!
//! Loaded from a TOML file and overridable from the CLI. Both binaries share
//! this shape; the web service embeds it next to its server settings.
//!
//! ```toml
//! [provider]
//! base_url = "https://rest.ensembl.org/vep/human/hgvs"
//! timeout_seconds = 30
//!
//! [cache]
//! capacity = 1024
//! ttl_seconds = 3600
//! negative_ttl_seconds = 300
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::CacheConfig;
use crate::error::AnnoError;
use crate::provider::client::DEFAULT_BASE_URL;

/// Configuration for the annotation pipeline (provider + cache).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotatorConfig {
    /// Remote annotation source.
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Lookup cache sizing and expiry.
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Remote provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the VEP HGVS endpoint.
    pub base_url: String,
    /// Per-call request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Cache sizing and expiry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Maximum number of stored (resolved + negative) entries.
    pub capacity: usize,
    /// Resolved entries expire after this many seconds.
    pub ttl_seconds: u64,
    /// Negative-cached failures expire after this many seconds.
    pub negative_ttl_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: 1024,
            ttl_seconds: 3600,
            negative_ttl_seconds: 300,
        }
    }
}

impl AnnotatorConfig {
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
        if self.provider.base_url.is_empty() {
            return Err(AnnoError::Config {
                msg: "provider.base_url must not be empty".to_string(),
            });
        }
        if self.provider.timeout_seconds == 0 {
            return Err(AnnoError::Config {
                msg: "provider.timeout_seconds must be at least 1".to_string(),
            });
        }
        if self.cache.capacity == 0 {
            return Err(AnnoError::Config {
                msg: "cache.capacity must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Cache configuration with settings converted to durations.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            capacity: self.cache.capacity,
            ttl: Duration::from_secs(self.cache.ttl_seconds),
            negative_ttl: Duration::from_secs(self.cache.negative_ttl_seconds),
        }
    }
}
