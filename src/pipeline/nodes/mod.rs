//! Built-in pipeline node implementations.

pub mod add_transformation;
pub mod frame_source;
pub mod transformation_source;

pub use add_transformation::AddTransformationNode;
pub use frame_source::FrameSourceNode;
pub use transformation_source::TransformationSourceNode;
