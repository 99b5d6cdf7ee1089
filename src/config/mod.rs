//! Configuration module for framestream
//!
//! The engine is configured from a single TOML file with three sections:
//!
//! ```toml
//! [devices]
//! accelerators = ["gpu0"]
//! default_device = "gpu0"
//!
//! [streamer]
//! source_format = "frames/frame_#.raw"
//! streaming_mode = "ProcessAllFrames"
//! frame_interval_ms = 33
//! raw_width = 640
//! raw_height = 480
//! raw_channels = 1
//!
//! [logging]
//! filter = "info,framestream=debug"
//! file = "framestream.log"
//! ```
//!
//! Every section and field has a default, so an empty file is valid.
//!
//! # Config Location
//!
//! Without an explicit path the runner looks in the platform config directory:
//! - **Linux**: `~/.config/framestream/framestream.toml`
//! - **macOS**: `~/Library/Application Support/framestream/framestream.toml`
//! - **Windows**: `%APPDATA%\framestream\framestream.toml`

pub mod settings;

pub use settings::*;

use crate::error::{FrameStreamError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "framestream";

/// Config filename
pub const CONFIG_FILE: &str = "framestream.toml";

/// Get the default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Execution device registry setup
    #[serde(default)]
    pub devices: DeviceConfig,

    /// Image streamer setup
    #[serde(default)]
    pub streamer: StreamerConfig,

    /// Logging setup
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a configuration file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FrameStreamError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            FrameStreamError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Load a configuration file, falling back to defaults.
    ///
    /// A missing file is not an error. Any other failure is returned next
    /// to the defaults so the caller can report it once logging is up.
    pub fn load_with_fallback(path: impl AsRef<Path>) -> (Self, Option<FrameStreamError>) {
        let path = path.as_ref();
        if !path.exists() {
            return (Self::default(), None);
        }
        match Self::load(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Load a configuration file, returning defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let (config, error) = Self::load_with_fallback(path);
        if let Some(e) = error {
            tracing::warn!("Failed to load engine config, using defaults: {}", e);
        }
        config
    }

    /// Save the configuration to disk as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                FrameStreamError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        std::fs::write(path, content).map_err(|e| {
            FrameStreamError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }
}
