//! Configuration for the Extractor

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tally_llm::ollama::DEFAULT_TIMEOUT_SECS;

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum OCR text length sent to the model (characters)
    pub max_text_length: usize,

    /// Maximum time for the completion call (seconds)
    ///
    /// Defaults to the Ollama request timeout. A full invoice prompt on a local
    /// 7B model on CPU takes tens of seconds to generate.
    pub completion_timeout_secs: u64,

    /// Maximum time for text extraction of one document (seconds)
    pub ocr_timeout_secs: u64,
}

impl ExtractorConfig {
    /// Get the completion timeout as a Duration
    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_secs)
    }

    /// Get the OCR timeout as a Duration
    pub fn ocr_timeout(&self) -> Duration {
        Duration::from_secs(self.ocr_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.completion_timeout_secs == 0 {
            return Err("completion_timeout_secs must be greater than 0".to_string());
        }
        if self.ocr_timeout_secs == 0 {
            return Err("ocr_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Default configuration, sized for a local 7B model
    fn default() -> Self {
        Self {
            max_text_length: 50_000,
            completion_timeout_secs: DEFAULT_TIMEOUT_SECS,
            ocr_timeout_secs: 30,
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: fail fast, for hosted or small models
    pub fn aggressive() -> Self {
        Self {
            max_text_length: 20_000,
            completion_timeout_secs: 9,
            ocr_timeout_secs: 15,
        }
    }

    /// Lenient preset: long timeouts for large multi-page scans
    pub fn lenient() -> Self {
        Self {
            max_text_length: 100_000,
            completion_timeout_secs: 180,
            ocr_timeout_secs: 90,
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read {}: {}", path.as_ref().display(), e))?;
        Self::from_toml(&contents)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
