//! Test data builders for creating test objects

use framestream::data::{Frame, FrameRef, Image};
use framestream::source::{FilenameFormat, MemoryImporter};
use framestream::streamer::ImageStreamer;
use std::time::Duration;

/// Builder for creating test images
pub struct ImageBuilder {
    width: u32,
    height: u32,
    channels: u8,
    value: u8,
}

impl ImageBuilder {
    pub fn new() -> Self {
        Self {
            width: 4,
            height: 4,
            channels: 1,
            value: 0,
        }
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn channels(mut self, channels: u8) -> Self {
        self.channels = channels;
        self
    }

    pub fn value(mut self, value: u8) -> Self {
        self.value = value;
        self
    }

    pub fn build(self) -> Image {
        Image::filled(self.width, self.height, self.channels, self.value)
            .expect("valid test image")
    }

    pub fn frame(self) -> FrameRef {
        Frame::new(self.build())
    }
}

/// Builder for streamers backed by an in-memory source
pub struct StreamerBuilder {
    template: String,
    frames: u8,
    delay: Option<Duration>,
    interval: Option<Duration>,
}

impl StreamerBuilder {
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
            frames: 3,
            delay: None,
            interval: None,
        }
    }

    /// Number of items the source holds (indices `0..frames`)
    pub fn frames(mut self, frames: u8) -> Self {
        self.frames = frames;
        self
    }

    /// Delay applied to every import
    pub fn import_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn frame_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn importer(&self) -> MemoryImporter {
        let format = FilenameFormat::parse(&self.template).expect("valid template");
        let images = (0..self.frames).map(|v| ImageBuilder::new().value(v).build());
        let importer = MemoryImporter::from_sequence(&format, images);
        match self.delay {
            Some(delay) => importer.with_delay(delay),
            None => importer,
        }
    }

    pub fn build(self) -> ImageStreamer {
        let mut streamer = ImageStreamer::new();
        streamer
            .set_source_format(&self.template)
            .expect("valid template");
        streamer
            .set_importer(self.importer())
            .expect("streamer not started");
        if let Some(interval) = self.interval {
            streamer
                .set_frame_interval(interval)
                .expect("streamer not started");
        }
        streamer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_builder() {
        let image = ImageBuilder::new().size(2, 3).channels(2).value(9).build();
        assert_eq!(image.width(), 2);
        assert_eq!(image.height(), 3);
        assert_eq!(image.data().len(), 12);
        assert_eq!(image.pixel(1, 2, 1), Some(9));
    }
}
