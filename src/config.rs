//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the hydro-config.toml file.
//! It provides a centralized way to configure the completion service, dataset locations,
//! and other runtime parameters.
//!
//! The API credential is resolved once at startup (`OPENAI_API_KEY` wins over the
//! file) and then travels inside [`ApiConfig`] to whoever needs it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = "hydro-config.toml";

/// Environment variable holding the completion service credential
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Errors from writing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config IO: {0}")]
    Io(#[from] io::Error),

    #[error("config serialization: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Application configuration loaded from hydro-config.toml
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Completion service configuration
    pub api: ApiConfig,
    /// Dataset and export locations
    pub dataset: DatasetConfig,
}

/// Text-completion service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Secret credential; usually left empty and supplied via OPENAI_API_KEY
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible API
    pub base_url: String,
    /// Completion model name
    pub model: String,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f64,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Batch dataset configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Cleaned dataset consumed by the batch workflow
    pub path: String,
    /// Where the batch workflow writes its reminder plan
    pub export_path: String,
    /// Rows shown in the preview before processing
    pub preview_rows: usize,
    /// Rows kept by the `clean` command
    pub clean_row_limit: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo-instruct".to_string(),
            max_tokens: 120,
            temperature: 0.7,
            timeout_secs: 30,
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        DatasetConfig {
            path: "health_fitness_dataset_clean.csv".to_string(),
            export_path: "hydration_reminder_plan.csv".to_string(),
            preview_rows: 5,
            clean_row_limit: 50,
        }
    }
}

impl Config {
    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Invalid config file format in {}: {}", path.display(), e);
                    warn!("Using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Apply a credential taken from the environment, if one is present.
    ///
    /// Blank values are ignored so an empty variable does not mask a key
    /// stored in the file.
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api.api_key = Some(key);
        }
        self
    }

    /// Resolve the credential from `OPENAI_API_KEY`.
    pub fn with_env_credential(self) -> Self {
        self.with_api_key(std::env::var(API_KEY_ENV).ok())
    }

    /// Save current configuration to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.model, "gpt-3.5-turbo-instruct");
        assert_eq!(config.api.max_tokens, 120);
        assert_eq!(config.api.temperature, 0.7);
        assert!(config.api.api_key.is_none());
        assert_eq!(config.dataset.path, "health_fitness_dataset_clean.csv");
        assert_eq!(config.dataset.clean_row_limit, 50);
    }

    #[test]
    fn test_config_roundtrip() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.dataset.preview_rows = 10;
        config.save(file.path()).unwrap();

        let parsed = Config::load_from_path(file.path());
        assert_eq!(parsed.dataset.preview_rows, 10);
        assert_eq!(parsed.api.base_url, config.api.base_url);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let parsed: Config = toml::from_str("[api]\nmodel = \"local-model\"\n").unwrap();
        assert_eq!(parsed.api.model, "local-model");
        assert_eq!(parsed.api.max_tokens, 120);
        assert_eq!(parsed.dataset.export_path, "hydration_reminder_plan.csv");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config.api.timeout_secs, 30);
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "[api\nmodel = ").unwrap();
        let config = Config::load_from_path(file.path());
        assert_eq!(config.api.model, "gpt-3.5-turbo-instruct");
    }

    #[test]
    fn test_credential_override() {
        let mut config = Config::default();
        config.api.api_key = Some("from-file".to_string());

        let kept = config.clone().with_api_key(Some("   ".to_string()));
        assert_eq!(kept.api.api_key.as_deref(), Some("from-file"));

        let replaced = config.with_api_key(Some("from-env".to_string()));
        assert_eq!(replaced.api.api_key.as_deref(), Some("from-env"));
    }
}
