//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the backend URL, the credential backend and the last
//! used username.
//!
//! Configuration is stored at `~/.config/bookhub/config.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "bookhub";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend used when no URL is configured (local development server).
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api";

/// HTTP request timeout in seconds when none is configured.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where the access and refresh tokens are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    /// JSON file in the data directory
    #[default]
    File,
    /// OS keychain
    Keyring,
    /// Process memory only; tokens are lost on exit
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub last_username: Option<String>,
    #[serde(default)]
    pub credential_backend: CredentialBackend,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Session-only backend URL (from `BOOKHUB_API_URL`); never saved
    #[serde(skip)]
    pub api_url_override: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for persisted credentials and log files.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Base URL of the REST API, without a trailing slash.
    /// The session override wins over the saved value.
    pub fn api_base_url(&self) -> String {
        [self.api_url_override.as_deref(), self.api_base_url.as_deref()]
            .into_iter()
            .flatten()
            .find(|url| !url.trim().is_empty())
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_fields_missing() {
        let config: Config = serde_json::from_str("{}").expect("empty config parses");
        assert_eq!(config.api_base_url(), DEFAULT_API_BASE_URL);
        assert_eq!(config.credential_backend, CredentialBackend::File);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.last_username.is_none());
    }

    #[test]
    fn test_api_base_url_trims_trailing_slash() {
        let config = Config {
            api_base_url: Some("https://library.example.org/api/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.api_base_url(), "https://library.example.org/api");
    }

    #[test]
    fn test_blank_api_base_url_falls_back_to_default() {
        let config = Config {
            api_base_url: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.api_base_url(), DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_api_url_override_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let config = Config {
            api_base_url: Some("https://library.example.org/api".to_string()),
            last_username: Some("reader".to_string()),
            api_url_override: Some("http://localhost:9000/api/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.api_base_url(), "http://localhost:9000/api");

        config.save_to(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("localhost:9000"));

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_url_override, None);
        assert_eq!(loaded.api_base_url(), "https://library.example.org/api");
        assert_eq!(loaded.last_username.as_deref(), Some("reader"));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.api_base_url(), DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_credential_backend_parses_lowercase() {
        let config: Config =
            serde_json::from_str(r#"{"credential_backend": "keyring", "request_timeout_secs": 5}"#)
                .expect("config parses");
        assert_eq!(config.credential_backend, CredentialBackend::Keyring);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }
}
