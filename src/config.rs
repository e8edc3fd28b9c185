//! Configuration management for RagChat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{RagChatError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for RagChat
///
/// Holds everything the client needs: where the answer server lives and
/// how the interactive chat behaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Answer server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Chat session configuration
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Answer server configuration
///
/// Points the client at the generative-QA server that exposes the
/// `/generative_ai` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the answer server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whole-request timeout in seconds (covers the full answer stream)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    120
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Chat session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Maximum characters of the first question used for a session title
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,
}

fn default_title_max_chars() -> usize {
    30
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            title_max_chars: default_title_max_chars(),
        }
    }
}

impl Config {
    /// Load configuration from a file with environment and CLI overrides
    ///
    /// Precedence, lowest to highest: config file, environment variables,
    /// CLI arguments. A missing file is not an error; defaults are used.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    /// * `cli` - Parsed CLI arguments used for overrides
    ///
    /// # Errors
    ///
    /// Returns `RagChatError::Config` if the file exists but cannot be
    /// read or parsed.
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RagChatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| RagChatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("RAGCHAT_SERVER_URL") {
            self.server.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("RAGCHAT_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.server.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid RAGCHAT_TIMEOUT_SECONDS: {}", timeout);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(server_url) = &cli.server_url {
            self.server.base_url = server_url.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `RagChatError::Config` if the base URL does not parse or
    /// the timeout is zero.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.server.base_url)
            .map_err(|e| RagChatError::Config(format!("Invalid server base URL: {}", e)))?;

        if self.server.timeout_seconds == 0 {
            return Err(
                RagChatError::Config("timeout_seconds must be greater than zero".into()).into(),
            );
        }

        if self.chat.title_max_chars == 0 {
            return Err(
                RagChatError::Config("title_max_chars must be greater than zero".into()).into(),
            );
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.base_url, "http://localhost:8000");
        assert_eq!(config.server.timeout_seconds, 120);
        assert_eq!(config.chat.title_max_chars, 30);
    }

    #[test]
    fn test_default_config_validates() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml_config() {
        let yaml = r#"
server:
  base_url: "http://qa.internal:9000"
  timeout_seconds: 30
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.base_url, "http://qa.internal:9000");
        assert_eq!(config.server.timeout_seconds, 30);
        // Unspecified sections fall back to defaults
        assert_eq!(config.chat.title_max_chars, 30);
    }

    #[test]
    fn test_parse_empty_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.server.base_url, "http://localhost:8000");
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = Config::default();
        config.server.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.server.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_title_length() {
        let mut config = Config::default();
        config.chat.title_max_chars = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_roundtrip_serialization() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.server.base_url, config.server.base_url);
        assert_eq!(parsed.server.timeout_seconds, config.server.timeout_seconds);
    }
}
