//! Item sources feeding the image streamer.
//!
//! An [`ImageImporter`] turns an item identifier (usually a filename built
//! from a [`FilenameFormat`]) into one decoded [`Image`]. Reporting
//! [`ImportError::NotFound`] is how a source says "no more items"; the
//! streamer treats it as the normal end of the stream.
//!
//! # Implementations
//!
//! - [`RawFileImporter`] - Headerless 8-bit pixel files on disk
//! - [`MemoryImporter`] - Images registered in memory by identifier
//! - [`SyntheticImporter`] - Generated gradient frames, optionally endless

pub mod format;
pub mod memory;
pub mod raw_file;
pub mod synthetic;

pub use format::{FilenameFormat, FORMAT_MARKER};
pub use memory::MemoryImporter;
pub use raw_file::RawFileImporter;
pub use synthetic::SyntheticImporter;

use crate::data::{Image, ImageError};
use crate::device::ExecutionDevice;
use thiserror::Error;

/// Errors an item source can report
#[derive(Error, Debug)]
pub enum ImportError {
    /// The item does not exist. Marks the end of the source.
    #[error("Item '{identifier}' not found")]
    NotFound { identifier: String },

    /// The item exists but could not be decoded
    #[error("Failed to decode '{identifier}': {message}")]
    Decode { identifier: String, message: String },

    /// The item could not be read
    #[error("Failed to read '{identifier}': {source}")]
    Io {
        identifier: String,
        #[source]
        source: std::io::Error,
    },
}

impl ImportError {
    pub fn not_found(identifier: impl Into<String>) -> Self {
        ImportError::NotFound {
            identifier: identifier.into(),
        }
    }

    pub fn decode(identifier: impl Into<String>, err: ImageError) -> Self {
        ImportError::Decode {
            identifier: identifier.into(),
            message: err.to_string(),
        }
    }

    /// True for the end-of-source condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, ImportError::NotFound { .. })
    }
}

/// Source of images addressed by identifier.
///
/// Importers run on the streamer's producer thread, hence `Send`.
#[cfg_attr(test, mockall::automock)]
pub trait ImageImporter: Send {
    /// Import the item named `identifier` on `device`.
    fn import(&mut self, identifier: &str, device: &ExecutionDevice) -> Result<Image, ImportError>;
}

impl<F> ImageImporter for F
where
    F: FnMut(&str, &ExecutionDevice) -> Result<Image, ImportError> + Send,
{
    fn import(&mut self, identifier: &str, device: &ExecutionDevice) -> Result<Image, ImportError> {
        self(identifier, device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceManager;

    #[test]
    fn test_not_found_is_distinguished() {
        assert!(ImportError::not_found("a").is_not_found());
        let decode = ImportError::decode("a", ImageError::NoChannels);
        assert!(!decode.is_not_found());
        assert!(decode.to_string().contains("at least one channel"));
    }

    #[test]
    fn test_closure_importer() {
        let device = DeviceManager::new().default_computation_device();
        let mut importer = |identifier: &str, _device: &ExecutionDevice| {
            if identifier == "ok" {
                Image::filled(1, 1, 1, 1).map_err(|e| ImportError::decode(identifier, e))
            } else {
                Err(ImportError::not_found(identifier))
            }
        };
        assert!(importer.import("ok", &device).is_ok());
        assert!(importer.import("nope", &device).unwrap_err().is_not_found());
    }
}
