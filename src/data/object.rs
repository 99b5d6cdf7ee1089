//! Values carried by pipeline ports.

use crate::data::frame::FrameRef;
use crate::data::sequence::DynamicSequence;
use crate::data::transform::LinearTransformation;
use crate::pipeline::port::PortKind;

/// Data published on an output port.
#[derive(Debug, Clone)]
pub enum DataObject {
    /// A single, static frame.
    Frame(FrameRef),
    /// A growing stream of frames.
    Sequence(DynamicSequence),
    /// A spatial transform.
    Transformation(LinearTransformation),
}

impl DataObject {
    /// Port kind this value can travel on.
    pub fn port_kind(&self) -> PortKind {
        match self {
            DataObject::Frame(_) | DataObject::Sequence(_) => PortKind::Image,
            DataObject::Transformation(_) => PortKind::Transformation,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, DataObject::Sequence(_))
    }

    pub fn as_frame(&self) -> Option<&FrameRef> {
        match self {
            DataObject::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&DynamicSequence> {
        match self {
            DataObject::Sequence(sequence) => Some(sequence),
            _ => None,
        }
    }

    pub fn as_transformation(&self) -> Option<&LinearTransformation> {
        match self {
            DataObject::Transformation(transform) => Some(transform),
            _ => None,
        }
    }

    /// Short name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            DataObject::Frame(_) => "Frame",
            DataObject::Sequence(_) => "Sequence",
            DataObject::Transformation(_) => "Transformation",
        }
    }
}
