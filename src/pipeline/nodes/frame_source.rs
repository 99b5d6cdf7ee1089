//! FrameSourceNode: publishes a single static frame.

use crate::data::{DataObject, FrameRef};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::node::NodeContext;
use crate::pipeline::port::{PortDescriptor, PortKind};

static PORTS: &[PortDescriptor] = &[PortDescriptor::output("out", PortKind::Image)];

#[derive(Debug, Clone, Default)]
pub struct FrameSourceNode {
    frame: Option<FrameRef>,
}

impl FrameSourceNode {
    pub fn new(frame: FrameRef) -> Self {
        Self { frame: Some(frame) }
    }

    pub fn name(&self) -> &str {
        "FrameSource"
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        PORTS
    }

    pub fn set_frame(&mut self, frame: FrameRef) {
        self.frame = Some(frame);
    }

    pub fn execute(&mut self, _ctx: &mut NodeContext) -> PipelineResult<()> {
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
        self.frame
            .clone()
            .map(DataObject::Frame)
            .ok_or_else(|| PipelineError::OutputNotReady(self.name().to_string()))
    }
}
