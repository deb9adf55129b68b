//! Process-wide configuration: API credentials and backend endpoints.
//!
//! Loaded once at startup and treated as read-only afterwards. The routing
//! core never mutates this state.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Complete process configuration.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct SwitchyardConfig {
    /// API keys for hosted providers
    pub api_keys: ApiKeys,
    /// Backend endpoint URLs
    pub endpoints: Endpoints,
}

/// API keys for hosted providers.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiKeys {
    /// `OpenRouter` API key, used for both the paid and free hosted tiers
    pub openrouter_api_key: Option<String>,
}

/// Backend endpoint URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoints {
    /// Base URL of the Ollama runtime
    pub ollama_url: String,
    /// Base URL of the LM Studio server
    pub lmstudio_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_owned(),
            lmstudio_url: "http://localhost:1234".to_owned(),
        }
    }
}

impl SwitchyardConfig {
    /// Get the default config directory path (`~/.switchyard`)
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn config_dir() -> Result<PathBuf> {
        use dirs::home_dir;
        let home = home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_owned()))?;
        Ok(home.join(".switchyard"))
    }

    /// Get the default config file path (`~/.switchyard/config.toml`)
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from the default location (`~/.switchyard/config.toml`).
    /// If the config doesn't exist, creates it with default values.
    ///
    /// # Errors
    /// Returns an error if the config cannot be read or created
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            let config = Self::default();
            config.save_to_file(&config_path)?;
            Ok(config)
        }
    }

    /// Load config from a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|error| Error::Config(format!("Failed to read config: {error}")))?;
        toml::from_str(&contents)
            .map_err(|error| Error::Config(format!("Failed to parse config: {error}")))
    }

    /// Save config to a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be written
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|error| {
                Error::Config(format!("Failed to create config directory: {error}"))
            })?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|error| Error::Config(format!("Failed to serialize config: {error}")))?;

        let header = "# Switchyard Configuration File\n\
                      # This file is automatically generated on first run\n\
                      # Edit this file to customize your settings\n\n";

        fs::write(path, format!("{header}{contents}"))
            .map_err(|error| Error::Config(format!("Failed to write config: {error}")))?;

        Ok(())
    }

    /// Get the API key for a hosted provider, checking config first, then
    /// environment variables.
    pub fn get_api_key(&self, provider: &str) -> Option<String> {
        match provider {
            "openrouter" => self
                .api_keys
                .openrouter_api_key
                .clone()
                .or_else(|| env::var("OPENROUTER_API_KEY").ok()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SwitchyardConfig::default();
        assert!(config.api_keys.openrouter_api_key.is_none());
        assert_eq!(config.endpoints.ollama_url, "http://localhost:11434");
        assert_eq!(config.endpoints.lmstudio_url, "http://localhost:1234");
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap_or_else(|error| panic!("tempdir failed: {error}"));
        let path = dir.path().join("config.toml");

        let mut config = SwitchyardConfig::default();
        config.api_keys.openrouter_api_key = Some("sk-test".to_owned());
        config
            .save_to_file(&path)
            .unwrap_or_else(|error| panic!("save failed: {error}"));

        let loaded = SwitchyardConfig::load_from_file(&path)
            .unwrap_or_else(|error| panic!("load failed: {error}"));
        assert_eq!(
            loaded.api_keys.openrouter_api_key.as_deref(),
            Some("sk-test")
        );
        assert_eq!(loaded.endpoints.ollama_url, config.endpoints.ollama_url);
    }

    #[test]
    fn test_get_api_key_from_config() {
        let mut config = SwitchyardConfig::default();
        config.api_keys.openrouter_api_key = Some("from-config".to_owned());
        assert_eq!(
            config.get_api_key("openrouter").as_deref(),
            Some("from-config")
        );
        assert!(config.get_api_key("unknown").is_none());
    }
}
