//! In-memory item source.

use super::{FilenameFormat, ImageImporter, ImportError};
use crate::data::Image;
use crate::device::ExecutionDevice;
use std::collections::HashMap;
use std::time::Duration;

/// Serves images registered under fixed identifiers. Unknown identifiers
/// report [`ImportError::NotFound`].
#[derive(Debug, Clone, Default)]
pub struct MemoryImporter {
    images: HashMap<String, Image>,
    delay: Option<Duration>,
    imported: Vec<String>,
}

impl MemoryImporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `images` under consecutive identifiers of `format`,
    /// starting at index 0.
    pub fn from_sequence(format: &FilenameFormat, images: impl IntoIterator<Item = Image>) -> Self {
        let images = images
            .into_iter()
            .enumerate()
            .map(|(i, image)| (format.identifier(i as u64), image))
            .collect();
        Self {
            images,
            ..Self::default()
        }
    }

    pub fn with_image(mut self, identifier: impl Into<String>, image: Image) -> Self {
        self.insert(identifier, image);
        self
    }

    /// Sleep this long before every import.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn insert(&mut self, identifier: impl Into<String>, image: Image) {
        self.images.insert(identifier.into(), image);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Identifiers requested so far, found or not.
    pub fn imported(&self) -> &[String] {
        &self.imported
    }
}

impl ImageImporter for MemoryImporter {
    fn import(&mut self, identifier: &str, _device: &ExecutionDevice) -> Result<Image, ImportError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.imported.push(identifier.to_string());
        self.images
            .get(identifier)
            .cloned()
            .ok_or_else(|| ImportError::not_found(identifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceManager;

    #[test]
    fn test_sequence_registration() {
        let format = FilenameFormat::parse("f_#.raw").unwrap();
        let images = (0..3).map(|v| Image::filled(1, 1, 1, v).unwrap());
        let mut importer = MemoryImporter::from_sequence(&format, images);
        let device = DeviceManager::new().default_computation_device();

        assert_eq!(importer.len(), 3);
        assert_eq!(importer.import("f_2.raw", &device).unwrap().data(), &[2]);
        assert!(importer.import("f_3.raw", &device).unwrap_err().is_not_found());
        assert_eq!(importer.imported(), &["f_2.raw", "f_3.raw"]);
    }
}
