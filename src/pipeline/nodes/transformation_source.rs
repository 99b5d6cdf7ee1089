//! TransformationSourceNode: publishes a constant transform.

use crate::data::{DataObject, LinearTransformation};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::node::NodeContext;
use crate::pipeline::port::{PortDescriptor, PortKind};

static PORTS: &[PortDescriptor] = &[PortDescriptor::output(
    "transformation",
    PortKind::Transformation,
)];

#[derive(Debug, Clone, Default)]
pub struct TransformationSourceNode {
    transformation: LinearTransformation,
}

impl TransformationSourceNode {
    pub fn new(transformation: LinearTransformation) -> Self {
        Self { transformation }
    }

    pub fn name(&self) -> &str {
        "TransformationSource"
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        PORTS
    }

    pub fn transformation(&self) -> LinearTransformation {
        self.transformation
    }

    /// Picked up by downstream nodes on their next execution.
    pub fn set_transformation(&mut self, transformation: LinearTransformation) {
        self.transformation = transformation;
    }

    pub fn execute(&mut self, _ctx: &mut NodeContext) -> PipelineResult<()> {
        Ok(())
    }

    pub fn output(&mut self, port: usize) -> PipelineResult<DataObject> {
        match port {
            0 => Ok(DataObject::Transformation(self.transformation)),
            _ => Err(PipelineError::PortMismatch(format!(
                "{} has no output {}",
                self.name(),
                port
            ))),
        }
    }
}
