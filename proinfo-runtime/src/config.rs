//! Engine configuration
//!
//! Every field has a default, so an empty or partial TOML file is valid:
//!
//! ```toml
//! wave_size = 5
//! adapter_timeout_secs = 5
//!
//! [http]
//! timeout_secs = 5
//!
//! [endpoints]
//! doh = "https://cloudflare-dns.com/dns-query"
//!
//! [credentials]
//! abuseipdb_key = "..."
//! ```

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use proinfo_core::{DEFAULT_ADAPTER_TIMEOUT_SECS, DEFAULT_WAVE_SIZE};
use proinfo_net::HttpConfig;
use proinfo_sources::{Credentials, SourceEndpoints};

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Targets analyzed concurrently per batch wave
    pub wave_size: usize,
    /// Deadline for each source call
    pub adapter_timeout_secs: u64,
    pub http: HttpConfig,
    pub endpoints: SourceEndpoints,
    pub credentials: Credentials,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            wave_size: DEFAULT_WAVE_SIZE,
            adapter_timeout_secs: DEFAULT_ADAPTER_TIMEOUT_SECS,
            http: HttpConfig::default(),
            endpoints: SourceEndpoints::default(),
            credentials: Credentials::from_env(),
        }
    }
}

impl EngineConfig {
    /// Parse TOML; keys missing from the file fall back to the environment
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let config: EngineConfig = toml::from_str(content)?;
        Ok(config.normalized())
    }

    /// Load from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn with_wave_size(mut self, wave_size: usize) -> Self {
        self.wave_size = wave_size;
        self.normalized()
    }

    pub fn with_adapter_timeout(mut self, secs: u64) -> Self {
        self.adapter_timeout_secs = secs;
        self
    }

    pub fn with_abuseipdb_key(mut self, key: &str) -> Self {
        self.credentials.abuseipdb_key = Some(key.to_string());
        self
    }

    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_secs(self.adapter_timeout_secs)
    }

    fn normalized(mut self) -> Self {
        self.wave_size = self.wave_size.max(1);
        self.credentials = self.credentials.or(Credentials::from_env());
        self
    }
}
