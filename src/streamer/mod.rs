//! Image streamer: bridges an open-ended item source into a dynamic sequence.
//!
//! ```text
//!  importer ──► [producer thread] ──append──► DynamicSequence ──► consumers
//!                      │                            ▲
//!                      └──── observing handle ──────┘
//! ```
//!
//! # Lifecycle
//!
//! `NotStarted → Running → Exhausted | Aborted | Failed`
//!
//! The first `execute` or `get_output` launches exactly one producer thread.
//! `get_output` then blocks until the first frame exists. The first caller
//! receives the streamer's owning handle; from then on the streamer only
//! observes, and later callers get a handle derived from that observation.
//! When every consumer handle is gone the producer notices on its next
//! iteration and stops.
//!
//! Dropping the streamer requests a stop and joins the producer thread, so
//! no production outlives the node.

mod producer;

use crate::config::StreamerConfig;
use crate::data::{DataObject, DynamicSequence, SequenceObserver, StreamEnd};
use crate::device::{DeviceHandle, DeviceManager};
use crate::pipeline::{NodeContext, PipelineError, PipelineResult, PortDescriptor, PortKind};
use crate::source::{FilenameFormat, ImageImporter};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use producer::Producer;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

/// Capacity of the event channel. Progress events are dropped when it is
/// nearly full; the last slot is kept for `Finished`.
const EVENT_CHANNEL_CAPACITY: usize = 256;

static PORTS: &[PortDescriptor] = &[PortDescriptor::output("out", PortKind::Image)];

/// Producer state as seen from the streamer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StreamerState {
    NotStarted,
    Running,
    /// The source ran out of items.
    Exhausted,
    /// Production stopped before the source ran out.
    Aborted,
    /// The source failed with something other than not-found.
    Failed(String),
}

impl StreamerState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamerState::Exhausted | StreamerState::Aborted | StreamerState::Failed(_)
        )
    }
}

impl fmt::Display for StreamerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamerState::NotStarted => write!(f, "not started"),
            StreamerState::Running => write!(f, "running"),
            StreamerState::Exhausted => write!(f, "exhausted"),
            StreamerState::Aborted => write!(f, "aborted"),
            StreamerState::Failed(message) => write!(f, "failed: {}", message),
        }
    }
}

/// Progress notifications from the producer thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamerEvent {
    Started,
    FrameProduced { index: u64, identifier: String },
    Finished { state: StreamerState, frames: u64 },
}

/// State shared between the streamer and its producer thread.
pub(crate) struct StreamerShared {
    state: Mutex<StreamerState>,
    frames_produced: AtomicU64,
    device: RwLock<DeviceHandle>,
}

impl StreamerShared {
    fn new(device: DeviceHandle) -> Self {
        Self {
            state: Mutex::new(StreamerState::NotStarted),
            frames_produced: AtomicU64::new(0),
            device: RwLock::new(device),
        }
    }

    pub(crate) fn device(&self) -> DeviceHandle {
        self.device.read().clone()
    }

    pub(crate) fn set_state(&self, state: StreamerState) {
        *self.state.lock() = state;
    }
}

/// Streamer node producing frames from `source_format` identifiers.
pub struct ImageStreamer {
    format: Option<FilenameFormat>,
    importer: Option<Box<dyn ImageImporter>>,
    frame_interval: Option<Duration>,
    /// Owning handle, held until the first consumer takes it.
    owned: Option<DynamicSequence>,
    observer: SequenceObserver,
    shared: Arc<StreamerShared>,
    producer: Option<JoinHandle<()>>,
    /// Dropping the sender tells the producer to stop.
    stop_tx: Option<Sender<()>>,
    event_tx: Sender<StreamerEvent>,
    event_rx: Receiver<StreamerEvent>,
}

impl ImageStreamer {
    /// A streamer on the registry's default computation device.
    pub fn new() -> Self {
        Self::with_device(DeviceManager::global().default_computation_device())
    }

    pub fn with_device(device: DeviceHandle) -> Self {
        let sequence = DynamicSequence::new();
        let observer = sequence.observe();
        let (event_tx, event_rx) = bounded(EVENT_CHANNEL_CAPACITY);
        Self {
            format: None,
            importer: None,
            frame_interval: None,
            owned: Some(sequence),
            observer,
            shared: Arc::new(StreamerShared::new(device)),
            producer: None,
            stop_tx: None,
            event_tx,
            event_rx,
        }
    }

    /// Build a streamer from configuration with the given item source.
    pub fn from_config(
        config: &StreamerConfig,
        importer: impl ImageImporter + 'static,
    ) -> PipelineResult<Self> {
        let mut streamer = Self::new();
        if let Some(template) = &config.source_format {
            streamer.set_source_format(template)?;
        }
        if let Some(interval) = config.frame_interval() {
            streamer.set_frame_interval(interval)?;
        }
        streamer.set_importer(importer)?;
        Ok(streamer)
    }

    pub fn name(&self) -> &str {
        "ImageStreamer"
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        PORTS
    }

    /// Set the identifier template. It must contain exactly one `#`.
    pub fn set_source_format(&mut self, template: &str) -> PipelineResult<()> {
        self.ensure_not_started()?;
        self.format = Some(FilenameFormat::parse(template)?);
        Ok(())
    }

    pub fn source_format(&self) -> Option<&FilenameFormat> {
        self.format.as_ref()
    }

    pub fn set_importer(&mut self, importer: impl ImageImporter + 'static) -> PipelineResult<()> {
        self.ensure_not_started()?;
        self.importer = Some(Box::new(importer));
        Ok(())
    }

    /// Minimum time between two produced frames. Fixed once running.
    pub fn set_frame_interval(&mut self, interval: Duration) -> PipelineResult<()> {
        self.ensure_not_started()?;
        self.frame_interval = Some(interval);
        Ok(())
    }

    /// Device used for subsequent imports. Takes effect on the producer's
    /// next item.
    pub fn set_device(&mut self, device: DeviceHandle) {
        debug!("ImageStreamer moved to device {}", device);
        *self.shared.device.write() = device;
    }

    pub fn device(&self) -> DeviceHandle {
        self.shared.device()
    }

    pub fn state(&self) -> StreamerState {
        self.shared.state.lock().clone()
    }

    pub fn frames_produced(&self) -> u64 {
        self.shared.frames_produced.load(Ordering::Relaxed)
    }

    /// Receiver for producer progress events.
    pub fn events(&self) -> Receiver<StreamerEvent> {
        self.event_rx.clone()
    }

    /// Whether the streamer still holds the owning handle.
    pub fn owns_output(&self) -> bool {
        self.owned.is_some()
    }

    /// Launch the producer if it has not been launched yet.
    pub fn execute(&mut self) -> PipelineResult<()> {
        self.start_if_needed()
    }

    /// The stream, blocking until its first frame exists.
    ///
    /// The first successful call transfers the owning handle to the caller.
    /// Later calls return immediately with a handle derived from the
    /// streamer's observation, or `StreamGone` if every handle was dropped.
    pub fn get_output(&mut self) -> PipelineResult<DynamicSequence> {
        self.start_if_needed()?;

        if let Some(owned) = self.owned.take() {
            if owned.wait_for_first_frame().is_none() {
                let end = owned.end().unwrap_or(StreamEnd::Aborted);
                self.owned = Some(owned);
                return Err(PipelineError::EmptyStream(end));
            }
            debug!("Handing stream off to its first consumer");
            return Ok(owned);
        }

        self.observer.upgrade().ok_or(PipelineError::StreamGone)
    }

    /// Stop the producer and wait for it to finish. The stream closes as
    /// aborted unless it already ended.
    pub fn stop(&mut self) {
        self.stop_tx.take();
        if let Some(handle) = self.producer.take() {
            debug!("Waiting for producer thread to stop");
            if handle.join().is_err() {
                error!("Producer thread panicked");
                self.shared
                    .set_state(StreamerState::Failed("producer panicked".to_string()));
                if let Some(sequence) = self.observer.upgrade() {
                    sequence.close(StreamEnd::Failed);
                }
            }
        }
    }

    fn ensure_not_started(&self) -> PipelineResult<()> {
        if self.producer.is_some() || *self.shared.state.lock() != StreamerState::NotStarted {
            return Err(PipelineError::AlreadyStarted);
        }
        Ok(())
    }

    fn start_if_needed(&mut self) -> PipelineResult<()> {
        if self.producer.is_some() || *self.shared.state.lock() != StreamerState::NotStarted {
            return Ok(());
        }

        let format = self.format.clone().ok_or(PipelineError::MissingSourceFormat)?;
        let importer = self.importer.take().ok_or(PipelineError::MissingImporter)?;
        let (stop_tx, stop_rx) = bounded(1);
        let producer = Producer {
            format: format.clone(),
            importer,
            sink: self.observer.clone(),
            shared: Arc::clone(&self.shared),
            events: self.event_tx.clone(),
            stop_rx,
            frame_interval: self.frame_interval,
        };

        self.shared.set_state(StreamerState::Running);
        let spawned = thread::Builder::new()
            .name("image-streamer".to_string())
            .spawn(move || producer.run());

        match spawned {
            Ok(handle) => {
                info!("ImageStreamer started for '{}'", format);
                self.producer = Some(handle);
                self.stop_tx = Some(stop_tx);
                Ok(())
            }
            Err(e) => {
                error!("Failed to spawn producer thread: {}", e);
                self.shared.set_state(StreamerState::Failed(e.to_string()));
                if let Some(sequence) = self.observer.upgrade() {
                    sequence.close(StreamEnd::Failed);
                }
                Err(PipelineError::Io(e))
            }
        }
    }

    // ── Node interface ──

    pub fn execute_node(&mut self, _ctx: &mut NodeContext) -> PipelineResult<()> {
        self.start_if_needed()
    }

    pub fn output(&mut self, port: usize) -> PipelineResult<DataObject> {
        if port != 0 {
            return Err(PipelineError::PortMismatch(format!(
                "{} has no output {}",
                self.name(),
                port
            )));
        }
        self.get_output().map(DataObject::Sequence)
    }
}

impl Default for ImageStreamer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ImageStreamer {
    fn drop(&mut self) {
        self.owned.take();
        self.stop();
    }
}
