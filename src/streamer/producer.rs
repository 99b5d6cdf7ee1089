//! Background producer loop of the image streamer.
//!
//! Runs on its own thread. Each iteration checks for a stop request and
//! for a live sequence, imports the next item, and appends it. The loop
//! only ever holds an observing handle; it upgrades it just long enough to
//! append.

use super::{StreamerEvent, StreamerShared, StreamerState};
use crate::data::{Frame, SequenceObserver, StreamEnd};
use crate::source::{FilenameFormat, ImageImporter};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Why the loop stopped.
#[derive(Debug)]
enum LoopExit {
    /// The source reported not-found.
    Exhausted,
    /// Every handle to the sequence was released.
    DownstreamGone,
    /// The streamer asked us to stop.
    StopRequested,
    Failed(String),
}

pub(crate) struct Producer {
    pub(crate) format: FilenameFormat,
    pub(crate) importer: Box<dyn ImageImporter>,
    pub(crate) sink: SequenceObserver,
    pub(crate) shared: Arc<StreamerShared>,
    pub(crate) events: Sender<StreamerEvent>,
    pub(crate) stop_rx: Receiver<()>,
    pub(crate) frame_interval: Option<Duration>,
}

impl Producer {
    pub(crate) fn run(mut self) {
        info!("Producer started for '{}'", self.format);
        let _ = self.events.try_send(StreamerEvent::Started);

        let exit = self.produce();
        self.finish(exit);
    }

    fn produce(&mut self) -> LoopExit {
        let mut index: u64 = 0;

        loop {
            if self.stop_requested() {
                return LoopExit::StopRequested;
            }
            if !self.sink.is_valid() {
                return LoopExit::DownstreamGone;
            }

            let identifier = self.format.identifier(index);
            let device = self.shared.device();
            let image = match self.importer.import(&identifier, &device) {
                Ok(image) => image,
                Err(e) if e.is_not_found() => {
                    info!("Reached end of stream at '{}'", identifier);
                    return LoopExit::Exhausted;
                }
                Err(e) => return LoopExit::Failed(e.to_string()),
            };

            let frame = Frame::imported(image, identifier.clone(), device);
            let Some(sequence) = self.sink.upgrade() else {
                return LoopExit::DownstreamGone;
            };
            let len = match sequence.append(frame) {
                Ok(len) => len,
                Err(closed) => {
                    debug!("Sequence closed externally: {}", closed);
                    return LoopExit::DownstreamGone;
                }
            };
            drop(sequence);

            self.shared.frames_produced.fetch_add(1, Ordering::Relaxed);
            debug!("Appended '{}' ({} frames)", identifier, len);
            self.emit_progress(StreamerEvent::FrameProduced { index, identifier });
            index += 1;

            if let Some(interval) = self.frame_interval {
                match self.stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                        return LoopExit::StopRequested;
                    }
                }
            }
        }
    }

    /// Send a progress event unless only the slot reserved for `Finished`
    /// is left.
    fn emit_progress(&self, event: StreamerEvent) {
        let reserved = self
            .events
            .capacity()
            .is_some_and(|capacity| self.events.len() + 1 >= capacity);
        if !reserved {
            let _ = self.events.try_send(event);
        }
    }

    /// A message or a dropped sender both mean stop.
    fn stop_requested(&self) -> bool {
        !matches!(self.stop_rx.try_recv(), Err(TryRecvError::Empty))
    }

    fn finish(self, exit: LoopExit) {
        let frames = self.shared.frames_produced.load(Ordering::Relaxed);
        let (state, end) = match exit {
            LoopExit::Exhausted => {
                info!("Stream '{}' exhausted after {} frames", self.format, frames);
                (StreamerState::Exhausted, StreamEnd::Exhausted)
            }
            LoopExit::DownstreamGone => {
                warn!(
                    "Sequence released by all consumers, stream '{}' can stop",
                    self.format
                );
                (StreamerState::Aborted, StreamEnd::Aborted)
            }
            LoopExit::StopRequested => {
                warn!("Stream '{}' stopped after {} frames", self.format, frames);
                (StreamerState::Aborted, StreamEnd::Aborted)
            }
            LoopExit::Failed(message) => {
                error!("Stream '{}' failed: {}", self.format, message);
                (StreamerState::Failed(message), StreamEnd::Failed)
            }
        };

        // State first, so anyone woken by the close sees the final state.
        self.shared.set_state(state.clone());
        if let Some(sequence) = self.sink.upgrade() {
            sequence.close(end);
        }
        let _ = self
            .events
            .try_send(StreamerEvent::Finished { state, frames });
    }
}
