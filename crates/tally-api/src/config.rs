//! Configuration file parsing for the Record API server.
//!
//! Loads the bind address and the database location from TOML.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),
}

/// Record API configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bind address (e.g., "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bind port (default: 9000)
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// SQLite database file, shared with the ingestion CLI
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_bind_port() -> u16 {
    9000
}

fn default_database_path() -> PathBuf {
    PathBuf::from("tally.db")
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
            database_path: default_database_path(),
        }
    }
}

impl ApiConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ApiConfig = toml::from_str(contents)?;

        if config.bind_address.trim().is_empty() {
            return Err(ConfigError::MissingField("bind_address".to_string()));
        }
        if config.database_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("database_path".to_string()));
        }

        Ok(config)
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.database_path, PathBuf::from("tally.db"));
    }

    #[test]
    fn test_parse_toml() {
        let config = ApiConfig::from_toml(
            r#"
            bind_address = "0.0.0.0"
            bind_port = 9100
            database_path = "/var/lib/tally/tally.db"
            "#,
        )
        .unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:9100");
        assert_eq!(config.database_path, PathBuf::from("/var/lib/tally/tally.db"));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        assert_eq!(ApiConfig::from_toml("").unwrap(), ApiConfig::default());
    }

    #[test]
    fn test_empty_database_path_is_rejected() {
        let result = ApiConfig::from_toml(r#"database_path = """#);
        assert!(matches!(result, Err(ConfigError::MissingField(f)) if f == "database_path"));
    }

    #[test]
    fn test_missing_file() {
        let result = ApiConfig::from_file("/no/such/tally-api.toml");
        assert!(matches!(result, Err(ConfigError::FileRead(_))));
    }
}
