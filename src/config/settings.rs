//! Configuration settings for skymark.
//!
//! Settings are loaded from `~/.skymark/config.yaml`. The backend URL and
//! anon key can be overridden with `SKYMARK_BACKEND_URL` and
//! `SKYMARK_BACKEND_KEY` so scripts can point at a different project
//! without editing the config file.

use serde::{Deserialize, Serialize};

use crate::cli::args::OutputFormat;
use crate::config::Paths;
use crate::error::SkymarkError;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// General settings.
    pub general: GeneralConfig,
    /// Hosted backend settings.
    pub backend: BackendConfig,
    /// NASA image archive settings.
    pub archive: ArchiveConfig,
    /// Sync queue settings.
    pub sync: SyncConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default output format.
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
}

/// Hosted backend (auth + tables + functions + storage) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend project.
    #[serde(default = "default_backend_url")]
    pub url: String,
    /// Publishable anon key sent with every request.
    #[serde(default)]
    pub anon_key: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// NASA image archive API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Base URL of the image-search API.
    #[serde(default = "default_archive_url")]
    pub url: String,
    /// Results per page requested from the archive.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// Sync queue settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between periodic drains while connectivity is present.
    #[serde(default = "default_sync_interval")]
    pub interval_secs: u64,
    /// Timeout in seconds for the connectivity probe.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

// Default value functions for serde
const fn default_output_format() -> OutputFormat {
    OutputFormat::Pretty
}

fn default_backend_url() -> String {
    "http://localhost:54321".to_string()
}

const fn default_request_timeout() -> u64 {
    30
}

fn default_archive_url() -> String {
    "https://images-api.nasa.gov".to_string()
}

const fn default_page_size() -> u32 {
    25
}

const fn default_sync_interval() -> u64 {
    300
}

const fn default_probe_timeout() -> u64 {
    3
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: default_output_format(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            anon_key: String::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            url: default_archive_url(),
            page_size: default_page_size(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_sync_interval(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from the default path, applying env overrides.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self, SkymarkError> {
        let paths = Paths::new()?;
        let mut config = Self::load_from_path(&paths.config_file)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load_from_path(path: &std::path::Path) -> Result<Self, SkymarkError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            SkymarkError::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        serde_yaml::from_str(&contents).map_err(|e| {
            SkymarkError::Config(format!(
                "Failed to parse config file {}: {e}",
                path.display()
            ))
        })
    }

    /// Save configuration to the default path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be written.
    pub fn save(&self) -> Result<(), SkymarkError> {
        let paths = Paths::new()?;
        paths.ensure_dirs()?;
        self.save_to_path(&paths.config_file)
    }

    /// Save configuration to a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be written.
    pub fn save_to_path(&self, path: &std::path::Path) -> Result<(), SkymarkError> {
        let contents = serde_yaml::to_string(self)
            .map_err(|e| SkymarkError::Config(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, contents).map_err(|e| {
            SkymarkError::Config(format!(
                "Failed to write config file {}: {e}",
                path.display()
            ))
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SKYMARK_BACKEND_URL") {
            if !url.is_empty() {
                self.backend.url = url;
            }
        }
        if let Ok(key) = std::env::var("SKYMARK_BACKEND_KEY") {
            if !key.is_empty() {
                self.backend.anon_key = key;
            }
        }
    }
}
