//! Headerless raw pixel files.

use super::{ImageImporter, ImportError};
use crate::data::Image;
use crate::device::ExecutionDevice;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Reads files of exactly `width * height * channels` bytes of 8-bit
/// interleaved pixel data. Identifiers are paths, optionally resolved
/// against a base directory.
#[derive(Debug, Clone)]
pub struct RawFileImporter {
    width: u32,
    height: u32,
    channels: u8,
    base_dir: Option<PathBuf>,
}

impl RawFileImporter {
    pub fn new(width: u32, height: u32, channels: u8) -> Self {
        Self {
            width,
            height,
            channels,
            base_dir: None,
        }
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    fn resolve(&self, identifier: &str) -> PathBuf {
        match &self.base_dir {
            Some(dir) => dir.join(identifier),
            None => Path::new(identifier).to_path_buf(),
        }
    }
}

impl ImageImporter for RawFileImporter {
    fn import(&mut self, identifier: &str, device: &ExecutionDevice) -> Result<Image, ImportError> {
        let path = self.resolve(identifier);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ImportError::not_found(identifier));
            }
            Err(e) => {
                return Err(ImportError::Io {
                    identifier: identifier.to_string(),
                    source: e,
                });
            }
        };
        trace!(
            "Read {} bytes from {} for device {}",
            data.len(),
            path.display(),
            device.name()
        );
        Image::new(self.width, self.height, self.channels, data)
            .map_err(|e| ImportError::decode(identifier, e))
    }
}
