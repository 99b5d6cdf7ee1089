//! Pipeline-specific error types.

use crate::data::{SequenceClosed, StreamEnd};
use crate::pipeline::id::NodeId;
use crate::pipeline::port::{PortDirection, PortKind};
use thiserror::Error;

/// Errors that can occur within the pipeline system.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid edge: {0}")]
    InvalidEdge(String),

    #[error("Cycle detected in pipeline graph at {0:?}")]
    CycleDetected(NodeId),

    #[error("Port mismatch: {0}")]
    PortMismatch(String),

    #[error("Node {node_id:?} has no {direction:?} port {index}")]
    InvalidPort {
        node_id: NodeId,
        direction: PortDirection,
        index: usize,
    },

    #[error("Node {node_id:?} input {port} is not connected")]
    MissingInput { node_id: NodeId, port: usize },

    #[error("Expected {expected:?} data, found {found}")]
    UnexpectedData {
        expected: PortKind,
        found: &'static str,
    },

    /// A data/transform combination with no implementation. Never retried.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Invalid source format '{template}': {reason}")]
    InvalidSourceFormat { template: String, reason: String },

    #[error("No source format set")]
    MissingSourceFormat,

    #[error("No importer set")]
    MissingImporter,

    #[error("Streamer already started")]
    AlreadyStarted,

    /// Every handle to the stream has been released.
    #[error("Stream is gone")]
    StreamGone,

    /// The source ended before producing a single frame.
    #[error("Stream ended before its first frame ({0})")]
    EmptyStream(StreamEnd),

    #[error(transparent)]
    SequenceClosed(#[from] SequenceClosed),

    #[error("Output {0} is not ready")]
    OutputNotReady(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// True for failures that re-running cannot fix.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, PipelineError::NotImplemented(_))
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
