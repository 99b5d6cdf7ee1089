//! Data objects flowing through the pipeline.
//!
//! - [`Image`]: the intrinsic payload of one frame.
//! - [`Frame`] / [`FrameRef`]: one unit of data plus its scene-graph slot.
//!   Identity matters: two `FrameRef`s are the same frame only if they point
//!   at the same allocation.
//! - [`DynamicSequence`] / [`SequenceObserver`]: an append-only stream of
//!   frames. `DynamicSequence` keeps the stream alive; `SequenceObserver`
//!   never does.
//! - [`FrameCursor`]: a consumer's position in a stream.
//! - [`LinearTransformation`]: a spatial transform value.
//! - [`DataObject`]: what a port carries.

pub mod frame;
pub mod image;
pub mod object;
pub mod sequence;
pub mod transform;

pub use frame::{Frame, FrameId, FrameRef};
pub use image::{Image, ImageError};
pub use object::DataObject;
pub use sequence::{
    DynamicSequence, FrameCursor, SequenceClosed, SequenceId, SequenceObserver, StreamEnd,
    StreamingMode,
};
pub use transform::LinearTransformation;
