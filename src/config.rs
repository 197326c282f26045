//! Configuration for the descriptor service
//!
//! Loaded from a TOML file. Every section is optional except the secret key,
//! which may also come from the command line or `EDF_SECRET_KEY`.
//!
//! # Example
//! ```
//! use edf_descriptor::config::{Config, StorageBackend};
//!
//! let config = Config::from_toml(r#"
//!     [server]
//!     port = 9090
//!
//!     [auth]
//!     secret_key = "very secret"
//!
//!     [storage]
//!     backend = "json_lines"
//!     path = "metadata.jsonl"
//! "#).unwrap();
//!
//! assert_eq!(config.server.port, 9090);
//! assert_eq!(config.storage.backend, StorageBackend::JsonLines);
//! assert_eq!(config.retrieval.allowed_schemes, vec!["http", "https"]);
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// HTTP listener
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Pre-shared key authentication
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub secret_key: Option<String>,
}

/// Remote file retrieval
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    /// URL schemes accepted by the service; `file` must be listed explicitly
    #[serde(default = "default_allowed_schemes")]
    pub allowed_schemes: Vec<String>,
    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            allowed_schemes: default_allowed_schemes(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_allowed_schemes() -> Vec<String> {
    vec!["http".to_string(), "https".to_string()]
}

fn default_timeout_secs() -> u64 {
    30
}

/// Where decoded metadata is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    JsonLines,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// File used by the `json_lines` backend
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Checks the settings that have no usable default
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.auth.secret_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {}
            _ => return Err(ConfigError::MissingField("auth.secret_key".to_string())),
        }
        if self.storage.backend == StorageBackend::JsonLines && self.storage.path.is_none() {
            return Err(ConfigError::MissingField("storage.path".to_string()));
        }
        Ok(())
    }
}
