//! Generated test pattern source.

use super::{ImageImporter, ImportError};
use crate::data::Image;
use crate::device::ExecutionDevice;
use std::time::Duration;

/// Produces single-channel gradient images whose intensity is offset by the
/// import count. Identifiers are not interpreted.
///
/// With a limit, the first `limit` imports succeed and the rest report
/// not-found. Without one the source never ends.
#[derive(Debug, Clone)]
pub struct SyntheticImporter {
    width: u32,
    height: u32,
    limit: Option<u64>,
    delay: Option<Duration>,
    produced: u64,
}

impl SyntheticImporter {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            limit: None,
            delay: None,
            produced: 0,
        }
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn produced(&self) -> u64 {
        self.produced
    }

    fn pattern(&self, offset: u64) -> Vec<u8> {
        let mut data = Vec::with_capacity(Image::byte_len(self.width, self.height, 1));
        for y in 0..self.height {
            for x in 0..self.width {
                data.push((x as u64 + y as u64 + offset) as u8);
            }
        }
        data
    }
}

impl ImageImporter for SyntheticImporter {
    fn import(&mut self, identifier: &str, _device: &ExecutionDevice) -> Result<Image, ImportError> {
        if self.limit.is_some_and(|limit| self.produced >= limit) {
            return Err(ImportError::not_found(identifier));
        }
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        let image = Image::new(self.width, self.height, 1, self.pattern(self.produced))
            .map_err(|e| ImportError::decode(identifier, e))?;
        self.produced += 1;
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceManager;

    #[test]
    fn test_limit_ends_source() {
        let device = DeviceManager::new().default_computation_device();
        let mut importer = SyntheticImporter::new(4, 2).with_limit(2);

        let first = importer.import("0", &device).unwrap();
        assert_eq!(first.pixel(3, 1, 0), Some(4));
        let second = importer.import("1", &device).unwrap();
        assert_eq!(second.pixel(0, 0, 0), Some(1));
        assert!(importer.import("2", &device).unwrap_err().is_not_found());
        assert_eq!(importer.produced(), 2);
    }
}
