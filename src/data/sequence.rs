//! Dynamic (streaming) sequences of frames.
//!
//! A [`DynamicSequence`] is built by exactly one producer and read by any
//! number of consumers. Frames are only ever appended, so a reader that
//! observed `n` frames will never later observe fewer.
//!
//! Two handle types share one allocation:
//!
//! - [`DynamicSequence`]: strong. Every live handle keeps the frames alive.
//! - [`SequenceObserver`]: weak. Used by the producer and by a streamer that
//!   has handed its stream off; it can check liveness and upgrade, never
//!   extend the lifetime on its own.
//!
//! State is guarded by one mutex; appends and `close` notify a condvar so
//! readers can wait for the first frame or for the end of the stream.

use crate::data::frame::FrameRef;
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use thiserror::Error;

static NEXT_SEQUENCE_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SequenceId(pub u64);

/// Why a stream stopped growing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamEnd {
    /// The source had no more items.
    Exhausted,
    /// Production stopped early (all consumers gone, or the streamer was dropped).
    Aborted,
    /// The source failed with something other than "not found".
    Failed,
}

impl fmt::Display for StreamEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamEnd::Exhausted => write!(f, "exhausted"),
            StreamEnd::Aborted => write!(f, "aborted"),
            StreamEnd::Failed => write!(f, "failed"),
        }
    }
}

/// Returned by [`DynamicSequence::append`] once the stream has been closed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Sequence is closed ({0})")]
pub struct SequenceClosed(pub StreamEnd);

struct SequenceState {
    frames: Vec<FrameRef>,
    end: Option<StreamEnd>,
}

struct SequenceInner {
    id: SequenceId,
    state: Mutex<SequenceState>,
    changed: Condvar,
}

/// Strong handle to an append-only frame stream.
#[derive(Clone)]
pub struct DynamicSequence {
    inner: Arc<SequenceInner>,
}

impl DynamicSequence {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SequenceInner {
                id: SequenceId(NEXT_SEQUENCE_ID.fetch_add(1, Ordering::Relaxed)),
                state: Mutex::new(SequenceState {
                    frames: Vec::new(),
                    end: None,
                }),
                changed: Condvar::new(),
            }),
        }
    }

    pub fn id(&self) -> SequenceId {
        self.inner.id
    }

    /// Derive an observing handle.
    pub fn observe(&self) -> SequenceObserver {
        SequenceObserver {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Append a frame. Returns the new length.
    pub fn append(&self, frame: FrameRef) -> Result<usize, SequenceClosed> {
        let mut state = self.inner.state.lock();
        if let Some(end) = state.end {
            return Err(SequenceClosed(end));
        }
        state.frames.push(frame);
        let len = state.frames.len();
        drop(state);
        self.inner.changed.notify_all();
        Ok(len)
    }

    /// Mark the stream as finished. The first close wins; returns whether
    /// this call closed it.
    pub fn close(&self, end: StreamEnd) -> bool {
        let mut state = self.inner.state.lock();
        if state.end.is_some() {
            return false;
        }
        state.end = Some(end);
        drop(state);
        self.inner.changed.notify_all();
        true
    }

    pub fn end(&self) -> Option<StreamEnd> {
        self.inner.state.lock().end
    }

    pub fn is_closed(&self) -> bool {
        self.end().is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn frame(&self, index: usize) -> Option<FrameRef> {
        self.inner.state.lock().frames.get(index).cloned()
    }

    pub fn latest(&self) -> Option<FrameRef> {
        self.inner.state.lock().frames.last().cloned()
    }

    /// All frames appended so far, in production order.
    pub fn snapshot(&self) -> Vec<FrameRef> {
        self.inner.state.lock().frames.clone()
    }

    /// Block until the first frame exists or the stream closes empty.
    /// Returns the first frame, or `None` if the stream ended without one.
    pub fn wait_for_first_frame(&self) -> Option<FrameRef> {
        let mut state = self.inner.state.lock();
        while state.frames.is_empty() && state.end.is_none() {
            self.inner.changed.wait(&mut state);
        }
        state.frames.first().cloned()
    }

    /// Block until the stream closes or `timeout` passes.
    pub fn wait_for_end(&self, timeout: Duration) -> Option<StreamEnd> {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.state.lock();
        while state.end.is_none() {
            if self.inner.changed.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        state.end
    }

    /// Number of strong handles currently alive.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    pub fn ptr_eq(&self, other: &DynamicSequence) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for DynamicSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DynamicSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("DynamicSequence")
            .field("id", &self.inner.id)
            .field("frames", &state.frames.len())
            .field("end", &state.end)
            .finish()
    }
}

/// Weak handle to a [`DynamicSequence`].
#[derive(Clone)]
pub struct SequenceObserver {
    inner: Weak<SequenceInner>,
}

impl SequenceObserver {
    /// Does the sequence still exist?
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.inner.strong_count() > 0
    }

    pub fn upgrade(&self) -> Option<DynamicSequence> {
        self.inner.upgrade().map(|inner| DynamicSequence { inner })
    }
}

impl fmt::Debug for SequenceObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceObserver")
            .field("valid", &self.is_valid())
            .finish()
    }
}

/// How a consumer advances through a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StreamingMode {
    /// Visit every frame in order.
    #[default]
    ProcessAllFrames,
    /// Always jump to the most recent frame.
    NewestFrameOnly,
}

/// A consumer's read position in one sequence. Reads never block.
///
/// When no unseen frame exists the cursor returns the last frame again, so a
/// consumer that re-executes without new input sees the same instance.
#[derive(Debug, Clone, Default)]
pub struct FrameCursor {
    mode: StreamingMode,
    sequence: Option<SequenceId>,
    next: usize,
}

impl FrameCursor {
    pub fn new(mode: StreamingMode) -> Self {
        Self {
            mode,
            sequence: None,
            next: 0,
        }
    }

    pub fn mode(&self) -> StreamingMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: StreamingMode) {
        self.mode = mode;
    }

    /// Index of the next unseen frame.
    pub fn position(&self) -> usize {
        self.next
    }

    pub fn reset(&mut self) {
        self.sequence = None;
        self.next = 0;
    }

    fn track(&mut self, sequence: &DynamicSequence) {
        if self.sequence != Some(sequence.id()) {
            self.sequence = Some(sequence.id());
            self.next = 0;
        }
    }

    /// Frame to process now, or `None` while the sequence is empty.
    pub fn next_frame(&mut self, sequence: &DynamicSequence) -> Option<FrameRef> {
        self.track(sequence);
        let state = sequence.inner.state.lock();
        let len = state.frames.len();
        if len == 0 {
            return None;
        }
        let index = match self.mode {
            StreamingMode::ProcessAllFrames => self.next.min(len - 1),
            StreamingMode::NewestFrameOnly => len - 1,
        };
        self.next = index + 1;
        Some(Arc::clone(&state.frames[index]))
    }

    /// True once the sequence is closed and every frame has been handed out.
    pub fn is_drained(&mut self, sequence: &DynamicSequence) -> bool {
        self.track(sequence);
        let state = sequence.inner.state.lock();
        state.end.is_some() && self.next >= state.frames.len()
    }
}
