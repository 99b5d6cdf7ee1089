//! Importer helpers for streamer tests

use framestream::data::Image;
use framestream::device::ExecutionDevice;
use framestream::source::{ImageImporter, ImportError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Identifier and device name of every import call
pub type ImportLog = Arc<Mutex<Vec<(String, String)>>>;

/// Endless importer that records its calls and sleeps `delay` per item
pub struct RecordingImporter {
    log: ImportLog,
    delay: Duration,
}

impl RecordingImporter {
    pub fn new(delay: Duration) -> (Self, ImportLog) {
        let log = ImportLog::default();
        (
            Self {
                log: Arc::clone(&log),
                delay,
            },
            log,
        )
    }
}

impl ImageImporter for RecordingImporter {
    fn import(&mut self, identifier: &str, device: &ExecutionDevice) -> Result<Image, ImportError> {
        std::thread::sleep(self.delay);
        self.log
            .lock()
            .push((identifier.to_string(), device.name().to_string()));
        Image::filled(1, 1, 1, 0).map_err(|e| ImportError::decode(identifier, e))
    }
}

/// Importer that blocks on its first call until `release` is sent
pub fn gated_importer(
    frames: u8,
) -> (
    impl ImageImporter,
    crossbeam_channel::Sender<()>,
) {
    let (release, gate) = crossbeam_channel::bounded::<()>(1);
    let mut released = false;
    let importer = move |identifier: &str, _device: &ExecutionDevice| -> Result<Image, ImportError> {
        if !released {
            let _ = gate.recv();
            released = true;
        }
        let index: u8 = identifier
            .trim_start_matches("gate_")
            .parse()
            .map_err(|_| ImportError::not_found(identifier))?;
        if index >= frames {
            return Err(ImportError::not_found(identifier));
        }
        Image::filled(1, 1, 1, index).map_err(|e| ImportError::decode(identifier, e))
    };
    (importer, release)
}
