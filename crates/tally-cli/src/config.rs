//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tally_agent::AgentConfig;
use tally_extractor::ExtractorConfig;
use tally_llm::ollama::{DEFAULT_ENDPOINT, DEFAULT_MODEL};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Ollama endpoint
    #[serde(default = "default_ollama_endpoint")]
    pub ollama_endpoint: String,

    /// Model used for extraction and chat
    #[serde(default = "default_model")]
    pub model: String,

    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Directory the CSV export is regenerated in; no export when absent
    #[serde(default = "default_export_dir")]
    pub export_dir: Option<PathBuf>,

    /// Record API base URL for `ask` and `chat`
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Extraction limits and timeouts
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Chat history size
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
}

impl Config {
    /// The per-user configuration directory, `~/.tally`.
    pub fn dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".tally"))
    }

    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        Ok(Self::dir()?.join("config.toml"))
    }

    /// Load configuration from the default path, or defaults if there is no file.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file, which must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Save configuration to `path`, creating its directory.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check the values that cannot be checked by parsing alone.
    pub fn validate(&self) -> Result<()> {
        if self.ollama_endpoint.trim().is_empty() {
            return Err(CliError::Config("ollama_endpoint must not be empty".into()));
        }
        if self.model.trim().is_empty() {
            return Err(CliError::Config("model must not be empty".into()));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(CliError::Config("database_path must not be empty".into()));
        }
        self.extractor.validate().map_err(CliError::Config)?;
        self.agent_config().validate().map_err(CliError::Config)?;
        Ok(())
    }

    /// Timeout for one completion request to Ollama.
    pub fn completion_timeout(&self) -> Duration {
        self.extractor.completion_timeout()
    }

    /// Settings for the chat assistant.
    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig::default().with_api_base_url(self.api_base_url.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_endpoint: default_ollama_endpoint(),
            model: default_model(),
            database_path: default_database_path(),
            export_dir: default_export_dir(),
            api_base_url: default_api_base_url(),
            extractor: ExtractorConfig::default(),
            settings: Settings::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
            history_size: 1000,
        }
    }
}

fn default_ollama_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("tally.db")
}

fn default_export_dir() -> Option<PathBuf> {
    Some(PathBuf::from("exports"))
}

fn default_api_base_url() -> String {
    AgentConfig::default().api_base_url
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_history_size() -> usize {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ollama_endpoint, "http://localhost:11434");
        assert_eq!(config.model, "qwen2.5:7b");
        assert_eq!(config.api_base_url, "http://localhost:9000");
        assert_eq!(config.export_dir, Some(PathBuf::from("exports")));
        assert!(config.settings.color);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
model = "llama3"

[extractor]
completion_timeout_secs = 120

[settings]
format = "json"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.model, "llama3");
        assert_eq!(config.completion_timeout(), Duration::from_secs(120));
        assert_eq!(config.extractor.ocr_timeout_secs, 30);
        assert_eq!(config.settings.format, OutputFormat::Json);
        assert_eq!(config.database_path, PathBuf::from("tally.db"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.database_path = PathBuf::from("/var/lib/tally/orders.db");
        config.settings.color = false;
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = Config::load_from(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_invalid_api_url_is_rejected() {
        let config = Config {
            api_base_url: "ftp://records".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_agent_config_carries_api_url() {
        let config = Config {
            api_base_url: "http://records:8080/api".to_string(),
            ..Config::default()
        };
        assert_eq!(config.agent_config().api_base_url, "http://records:8080/api");
    }
}
