//! Configuration for the tool-call loop

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the chat assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Base URL of the Record API; planned calls must stay under it
    pub api_base_url: String,

    /// Maximum time for the planning completion (seconds)
    ///
    /// Local 7B models on CPU take 10-30 s to answer the planning prompt.
    pub plan_timeout_secs: u64,

    /// Maximum time for the narration completion (seconds)
    ///
    /// The narration prompt embeds the full API response, so listing every
    /// order takes about as long as planning.
    pub synthesis_timeout_secs: u64,

    /// Maximum time for one Record API request (seconds)
    pub request_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:9000".to_string(),
            plan_timeout_secs: 30,
            synthesis_timeout_secs: 30,
            request_timeout_secs: 10,
        }
    }
}

impl AgentConfig {
    /// Configuration pointing at a specific Record API
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Parse and check the API base URL
    ///
    /// The base must be an absolute `http` or `https` URL without query or
    /// fragment. A path prefix such as `/api` is allowed.
    pub fn base_url(&self) -> Result<Url, String> {
        let url = Url::parse(self.api_base_url.trim())
            .map_err(|e| format!("Invalid api_base_url '{}': {}", self.api_base_url, e))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("api_base_url must be http or https, got {}", url.scheme()));
        }
        if url.host_str().is_none() || url.cannot_be_a_base() {
            return Err(format!("api_base_url has no host: {}", url));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err("api_base_url must not have a query or fragment".to_string());
        }
        Ok(url)
    }

    /// Get the plan timeout as a Duration
    pub fn plan_timeout(&self) -> Duration {
        Duration::from_secs(self.plan_timeout_secs)
    }

    /// Get the synthesis timeout as a Duration
    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_secs(self.synthesis_timeout_secs)
    }

    /// Get the request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.base_url()?;
        if self.plan_timeout_secs == 0 {
            return Err("plan_timeout_secs must be greater than 0".to_string());
        }
        if self.synthesis_timeout_secs == 0 {
            return Err("synthesis_timeout_secs must be greater than 0".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
