//! Path resolution for skymark configuration and data files.
//!
//! All skymark data is stored in `~/.skymark/`:
//! - `config.yaml` - Main configuration file
//! - `skymark.db` - SQLite database for the sync queue and local state
//! - `cache/` - Cached data (downloaded previews, completions)

use std::path::PathBuf;

use crate::error::SkymarkError;

/// Paths to skymark configuration and data directories.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Root directory: `~/.skymark/`
    pub root: PathBuf,
    /// Config file: `~/.skymark/config.yaml`
    pub config_file: PathBuf,
    /// Database file: `~/.skymark/skymark.db`
    pub database: PathBuf,
    /// Cache directory: `~/.skymark/cache/`
    pub cache: PathBuf,
}

impl Paths {
    /// Create paths based on the user's home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, SkymarkError> {
        let home = std::env::var("HOME").map_err(|_| {
            SkymarkError::Config("Could not determine home directory".to_string())
        })?;

        Ok(Self::with_root(PathBuf::from(home).join(".skymark")))
    }

    /// Create paths with a custom root directory (useful for testing).
    #[must_use]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            config_file: root.join("config.yaml"),
            database: root.join("skymark.db"),
            cache: root.join("cache"),
            root,
        }
    }

    /// Ensure all directories exist, creating them if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn ensure_dirs(&self) -> Result<(), SkymarkError> {
        for dir in [&self.root, &self.cache] {
            std::fs::create_dir_all(dir).map_err(|e| {
                SkymarkError::Config(format!("Failed to create directory {}: {e}", dir.display()))
            })?;
        }

        Ok(())
    }
}

impl Default for Paths {
    fn default() -> Self {
        // Fallback to the current directory if home cannot be determined
        Self::new().unwrap_or_else(|_| Self::with_root(PathBuf::from(".skymark")))
    }
}
