//! Image payload.

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("Image data has {actual} bytes, expected {expected} ({width}x{height}x{channels})")]
    SizeMismatch {
        width: u32,
        height: u32,
        channels: u8,
        expected: usize,
        actual: usize,
    },

    #[error("Image must have at least one channel")]
    NoChannels,
}

/// 8-bit interleaved pixel data.
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl Image {
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self, ImageError> {
        if channels == 0 {
            return Err(ImageError::NoChannels);
        }
        let expected = Self::byte_len(width, height, channels);
        if data.len() != expected {
            return Err(ImageError::SizeMismatch {
                width,
                height,
                channels,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// An image with every byte set to `value`.
    pub fn filled(width: u32, height: u32, channels: u8, value: u8) -> Result<Self, ImageError> {
        Self::new(
            width,
            height,
            channels,
            vec![value; Self::byte_len(width, height, channels)],
        )
    }

    /// Number of bytes an image of this geometry occupies.
    pub fn byte_len(width: u32, height: u32, channels: u8) -> usize {
        width as usize * height as usize * channels as usize
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixel value at (x, y, channel), if in bounds.
    pub fn pixel(&self, x: u32, y: u32, channel: u8) -> Option<u8> {
        if x >= self.width || y >= self.height || channel >= self.channels {
            return None;
        }
        let index = (y as usize * self.width as usize + x as usize) * self.channels as usize
            + channel as usize;
        self.data.get(index).copied()
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_length() {
        assert!(Image::new(2, 2, 1, vec![0; 4]).is_ok());
        let err = Image::new(2, 2, 3, vec![0; 4]).unwrap_err();
        assert!(matches!(
            err,
            ImageError::SizeMismatch {
                expected: 12,
                actual: 4,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_channels_rejected() {
        assert_eq!(Image::new(1, 1, 0, Vec::new()), Err(ImageError::NoChannels));
    }

    #[test]
    fn test_pixel_access() {
        let image = Image::new(2, 2, 2, vec![0, 1, 2, 3, 4, 5, 6, 7]).unwrap();
        assert_eq!(image.pixel(1, 0, 1), Some(3));
        assert_eq!(image.pixel(0, 1, 0), Some(4));
        assert_eq!(image.pixel(2, 0, 0), None);
        assert_eq!(image.pixel(0, 0, 2), None);
    }
}
