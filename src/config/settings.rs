//! Application settings management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// General settings
    #[serde(default)]
    pub general: GeneralSettings,

    /// Script service connection
    #[serde(default)]
    pub service: ServiceSettings,

    /// Video generation and polling
    #[serde(default)]
    pub video: VideoSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Service backend (http)
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Base URL of the REST API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token for the API
    #[serde(default)]
    pub api_token: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Where the polling loop reads job progress from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollSource {
    /// One status request per active script
    #[default]
    JobStatus,
    /// Re-fetch the whole script list
    ScriptList,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSettings {
    /// Seconds between two polls while a job is active
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Tokens a single video render costs
    #[serde(default = "default_generation_cost")]
    pub generation_cost: u32,

    /// Endpoint used by the polling loop
    #[serde(default)]
    pub poll_source: PollSource,
}

// Default value functions

fn default_log_level() -> String {
    "info".to_string()
}

fn default_backend() -> String {
    "http".to_string()
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_generation_cost() -> u32 {
    1
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            base_url: default_base_url(),
            api_token: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            generation_cost: default_generation_cost(),
            poll_source: PollSource::default(),
        }
    }
}

impl VideoSettings {
    /// Polling period; never shorter than one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl Settings {
    /// Load settings from the configuration file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::debug!("No config file found, using defaults");
            let mut settings = Self::default();
            settings.apply_env_overrides();
            return Ok(settings);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut settings = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        settings.apply_env_overrides();

        Ok(settings)
    }

    /// Parse settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if self.service.api_token.trim().is_empty() {
            if let Ok(token) = std::env::var("SCRIPTREEL_API_TOKEN") {
                if !token.trim().is_empty() {
                    self.service.api_token = token;
                }
            }
        }

        if let Ok(url) = std::env::var("SCRIPTREEL_API_URL") {
            if !url.trim().is_empty() {
                self.service.base_url = url;
            }
        }
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", crate::APP_NAME, crate::APP_NAME)
            .context("Could not determine config directory")?;

        let config_dir = dirs.config_dir();
        Ok(config_dir.join("config.toml"))
    }

    /// Write default configuration to a file
    pub fn write_default(path: &PathBuf) -> Result<()> {
        Self::default().write_to(path)
    }

    /// Write these settings to a file
    pub fn write_to(&self, path: &PathBuf) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}
