//! Configuration management for skymark.
//!
//! This module handles loading and saving configuration from `~/.skymark/`.

mod paths;
mod settings;

pub use paths::Paths;
pub use settings::{ArchiveConfig, BackendConfig, Config, GeneralConfig, SyncConfig};
