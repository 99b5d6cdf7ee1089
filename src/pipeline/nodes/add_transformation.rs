//! AddTransformationNode: attaches a transform to each frame of its input.
//!
//! Input 0 carries frames, input 1 a transform. Each frame seen for the
//! first time gets a new scene-graph node inserted above its current one
//! and is appended to this node's dynamic output. When the same frame
//! instance comes back (re-execution without new input) the transform of
//! the node inserted last time is overwritten instead, so the chain never
//! grows from redundant execution.
//!
//! Only the dynamic path exists; a static frame on input 0 fails with
//! `NotImplemented` before anything is touched.

use crate::data::{DataObject, DynamicSequence, Frame, FrameRef, SequenceId, StreamEnd};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::node::{DynamicDependency, NodeContext};
use crate::pipeline::port::{PortDescriptor, PortKind};
use crate::scene::{SceneGraph, SceneGraphNodeRef};
use tracing::{debug, info, trace};

static PORTS: &[PortDescriptor] = &[
    PortDescriptor::input("data", PortKind::Image),
    PortDescriptor::input("transformation", PortKind::Transformation),
    PortDescriptor::output("out", PortKind::Image),
];

static DEPENDENCIES: &[DynamicDependency] = &[DynamicDependency { input: 0, output: 0 }];

#[derive(Default)]
pub struct AddTransformationNode {
    /// Last frame processed and the node inserted for it.
    previous: Option<(FrameRef, SceneGraphNodeRef)>,
    output: Option<DynamicSequence>,
    /// Input sequence the current output follows.
    source: Option<SequenceId>,
}

impl AddTransformationNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        "AddTransformation"
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        PORTS
    }

    pub fn dynamic_dependencies(&self) -> &'static [DynamicDependency] {
        DEPENDENCIES
    }

    /// The last frame processed, if any.
    pub fn previous_frame(&self) -> Option<&FrameRef> {
        self.previous.as_ref().map(|(frame, _)| frame)
    }

    /// The dynamic output, once the first dynamic input has been seen.
    pub fn output_sequence(&self) -> Option<&DynamicSequence> {
        self.output.as_ref()
    }

    pub fn execute(&mut self, ctx: &mut NodeContext) -> PipelineResult<()> {
        ctx.input(0)?;
        let transformation = ctx.input_transformation(1)?;

        if !ctx.output_is_dynamic(0) {
            return Err(PipelineError::NotImplemented(
                "adding a transformation to a static output".to_string(),
            ));
        }

        let source = ctx.dynamic_input(0).map(DynamicSequence::id);
        if self.output.is_none() || self.source != source {
            debug!("AddTransformation following new input sequence {:?}", source);
            self.output = Some(DynamicSequence::new());
            self.source = source;
            self.previous = None;
        }
        let output = match &self.output {
            Some(output) => output.clone(),
            None => return Err(PipelineError::OutputNotReady("AddTransformation".to_string())),
        };

        let Some(frame) = ctx.static_input_frame(0)? else {
            return Ok(());
        };

        match &self.previous {
            Some((previous, node)) if Frame::same_instance(previous, &frame) => {
                trace!("Frame {} seen again, replacing its transform", frame.id());
                SceneGraph::set_transformation(node, transformation);
            }
            _ => {
                let node = SceneGraph::insert_parent_node(&frame, transformation);
                let len = output.append(frame.clone())?;
                trace!("Frame {} transformed, output has {} frames", frame.id(), len);
                self.previous = Some((frame, node));
            }
        }

        if ctx.input_drained(0) {
            let end = ctx
                .dynamic_input(0)
                .and_then(DynamicSequence::end)
                .unwrap_or(StreamEnd::Exhausted);
            if output.close(end) {
                info!("AddTransformation output closed ({}) after {} frames", end, output.len());
            }
        }

        Ok(())
    }

    pub fn output(&mut self, port: usize) -> PipelineResult<DataObject> {
        if port != 0 {
            return Err(PipelineError::PortMismatch(format!(
                "{} has no output {}",
                self.name(),
                port
            )));
        }
        self.output
            .clone()
            .map(DataObject::Sequence)
            .ok_or_else(|| PipelineError::OutputNotReady(self.name().to_string()))
    }
}
