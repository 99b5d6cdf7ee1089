//! Configuration sections
//!
//! - [`DeviceConfig`] - Accelerators to register and the default device
//! - [`StreamerConfig`] - Source template, consumer mode and raw frame geometry
//! - [`LoggingConfig`] - Log filter directive and optional log file

use crate::data::StreamingMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default log filter directive
pub const DEFAULT_LOG_FILTER: &str = "info,framestream=debug";

/// Execution device registry configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Accelerator names registered after the host device
    #[serde(default)]
    pub accelerators: Vec<String>,

    /// Name of the default computation device (host when unset)
    #[serde(default)]
    pub default_device: Option<String>,
}

/// Image streamer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamerConfig {
    /// Identifier template with a single `#` marker
    #[serde(default)]
    pub source_format: Option<String>,

    /// How downstream nodes advance through the stream
    #[serde(default)]
    pub streaming_mode: StreamingMode,

    /// Minimum time between produced frames (unpaced when unset)
    #[serde(default)]
    pub frame_interval_ms: Option<u64>,

    /// Width of raw frame files
    #[serde(default = "default_raw_width")]
    pub raw_width: u32,

    /// Height of raw frame files
    #[serde(default = "default_raw_height")]
    pub raw_height: u32,

    /// Channels per pixel of raw frame files
    #[serde(default = "default_raw_channels")]
    pub raw_channels: u8,
}

fn default_raw_width() -> u32 {
    256
}

fn default_raw_height() -> u32 {
    256
}

fn default_raw_channels() -> u8 {
    1
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            source_format: None,
            streaming_mode: StreamingMode::default(),
            frame_interval_ms: None,
            raw_width: default_raw_width(),
            raw_height: default_raw_height(),
            raw_channels: default_raw_channels(),
        }
    }
}

impl StreamerConfig {
    pub fn frame_interval(&self) -> Option<Duration> {
        self.frame_interval_ms.map(Duration::from_millis)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Also write logs to this file
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streamer_defaults() {
        let config = StreamerConfig::default();
        assert!(config.source_format.is_none());
        assert!(config.frame_interval().is_none());
        assert_eq!((config.raw_width, config.raw_height, config.raw_channels), (256, 256, 1));
    }

    #[test]
    fn test_frame_interval() {
        let config = StreamerConfig {
            frame_interval_ms: Some(40),
            ..Default::default()
        };
        assert_eq!(config.frame_interval(), Some(Duration::from_millis(40)));
    }

    #[test]
    fn test_logging_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.filter, DEFAULT_LOG_FILTER);
        assert!(config.file.is_none());
    }
}
