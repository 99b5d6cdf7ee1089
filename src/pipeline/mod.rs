//! Pull-driven processing pipeline.
//!
//! Nodes expose typed input and output ports and run only when their output
//! is requested. Static data (a single frame, a transform) is recomputed on
//! every pull; dynamic data (a growing frame sequence) is handed downstream
//! as a shared handle that keeps growing in the background.
//!
//! # Architecture
//!
//! ```text
//! [ImageStreamer] ──► [AddTransformation] ──► consumer
//!                            ▲
//! [TransformationSource] ────┘
//! ```
//!
//! # Design
//!
//! - **Enum dispatch**: `BuiltinNode` enum for all built-in nodes, `NodePlugin`
//!   trait objects for everything else.
//! - **Arena storage**: nodes and edges live in `Vec`s indexed by `NodeId`
//!   and `EdgeId`.
//! - **Dynamic dependencies**: a node declares which outputs follow the
//!   cadence of which inputs; `NodeContext::output_is_dynamic` answers it.

pub mod error;
pub mod executor;
pub mod id;
pub mod node;
pub mod nodes;
pub mod port;
pub mod snapshot;

pub use error::{PipelineError, PipelineResult};
pub use executor::{Edge, Pipeline};
pub use id::{EdgeId, NodeId, PortId};
pub use node::{AnyNode, BuiltinNode, DynamicDependency, NodeContext, NodePlugin};
pub use nodes::{AddTransformationNode, FrameSourceNode, TransformationSourceNode};
pub use port::{PortDescriptor, PortDirection, PortKind};
pub use snapshot::{EdgeSnapshot, NodeSnapshot, TopologySnapshot};
