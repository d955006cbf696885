//! Application configuration management.
//!
//! Handles loading and saving application-wide settings: the metadata API
//! credential and endpoint, where the playlist catalog lives, and how the
//! catalog load reacts to a failing playlist.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::pipeline::FailurePolicy;

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "YOUTUBE_API_KEY";

/// Default root of the `YouTube` Data API.
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Default request timeout for metadata lookups.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// API credential for the metadata lookups.
    pub api_key: Option<String>,
    /// Root URL of the metadata API.
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// JSON catalog of playlist definitions.
    pub catalog_path: Option<PathBuf>,
    /// What to do when one playlist's lookup fails.
    pub failure_policy: FailurePolicy,
    /// Index of the video auto-selected after a load.
    pub default_video_index: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            catalog_path: None,
            failure_policy: FailurePolicy::default(),
            default_video_index: 1,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location, or defaults if the
    /// file does not exist. The API key environment variable is applied on top.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            debug!("Config file not found, using defaults");
            Self::default()
        };

        config.apply_api_key_override(std::env::var(API_KEY_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {e}")))?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Replace the API key with a non-blank override value.
    pub fn apply_api_key_override(&mut self, value: Option<String>) {
        if let Some(key) = value.filter(|k| !k.trim().is_empty()) {
            debug!("Using API key from {}", API_KEY_ENV);
            self.api_key = Some(key);
        }
    }

    /// Check the values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(Error::Configuration(
                "API base URL cannot be empty".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Configuration(
                "Request timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the path to the config file.
    #[must_use]
    pub fn config_file_path() -> PathBuf {
        config_file_path()
    }
}

fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("tubeshelf")
        .join("config.json")
}
