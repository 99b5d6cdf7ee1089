//! # framestream: streaming frame pipelines
//!
//! A data-flow engine for pushing sequences of images through a small graph
//! of processing nodes. Nodes are executed on demand; a streamer node runs
//! its own producer thread so a source can deliver frames at its own pace
//! while consumers work at theirs.
//!
//! ## Architecture
//!
//! - **Data**: frames, growing frame sequences with owning and observing
//!   handles, spatial transforms
//! - **Scene graph**: transform chains attached to frames
//! - **Pipeline**: pull-driven node graph with per-node device affinity
//! - **Streamer**: background producer bridging an item source into a
//!   sequence
//! - **Devices**: process-wide registry of execution devices
//!
//! ## Example
//!
//! ```ignore
//! use framestream::{
//!     data::LinearTransformation,
//!     pipeline::{AddTransformationNode, Pipeline, TransformationSourceNode},
//!     source::RawFileImporter,
//!     streamer::ImageStreamer,
//! };
//!
//! let mut streamer = ImageStreamer::new();
//! streamer.set_source_format("frames/frame_#.raw")?;
//! streamer.set_importer(RawFileImporter::new(640, 480, 1))?;
//!
//! let mut pipeline = Pipeline::new();
//! let frames = pipeline.add_node(streamer);
//! let transform = pipeline.add_node(TransformationSourceNode::new(
//!     LinearTransformation::identity(),
//! ));
//! let add = pipeline.add_node(AddTransformationNode::new());
//! pipeline.set_input_connection(add, 0, pipeline.output_port(frames, 0)?)?;
//! pipeline.set_input_connection(add, 1, pipeline.output_port(transform, 0)?)?;
//!
//! // Blocks until the first frame has been imported.
//! let output = pipeline.output_data(pipeline.output_port(add, 0)?)?;
//! ```

pub mod config;
pub mod data;
pub mod device;
pub mod error;
pub mod pipeline;
pub mod scene;
pub mod source;
pub mod streamer;

// Re-export commonly used types
pub use config::EngineConfig;
pub use data::{DataObject, DynamicSequence, Frame, FrameRef, LinearTransformation};
pub use device::{DeviceHandle, DeviceManager};
pub use error::{FrameStreamError, Result};
pub use pipeline::{Pipeline, PipelineError};
pub use streamer::{ImageStreamer, StreamerState};
