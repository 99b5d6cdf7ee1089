//! Node abstraction for the pipeline.
//!
//! Two-layer design:
//! - **`NodePlugin` trait**: for user-defined nodes.
//! - **`BuiltinNode` enum**: for all built-in nodes, dispatched with a
//!   `match` instead of a vtable.
//!
//! `AnyNode` wraps either variant so the pipeline can handle both uniformly.
//!
//! Nodes are pull-driven. Before `execute` runs, the pipeline executes every
//! connected upstream node and collects its output into the node's input
//! slots. `output` is called afterwards by whoever pulls from the node.

use crate::data::{DataObject, DynamicSequence, FrameCursor, FrameRef, LinearTransformation};
use crate::device::DeviceHandle;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::id::NodeId;
use crate::pipeline::port::{PortDescriptor, PortKind};

/// Declares that output `output` is re-produced at the cadence of input
/// `input`: when that input carries a dynamic sequence, so does the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicDependency {
    pub input: usize,
    pub output: usize,
}

/// Context passed to a node's `execute`.
pub struct NodeContext<'a> {
    /// The node being executed.
    pub node_id: NodeId,
    inputs: &'a [Option<DataObject>],
    cursors: &'a mut [FrameCursor],
    dynamic_dependencies: &'a [DynamicDependency],
    device: &'a DeviceHandle,
}

impl<'a> NodeContext<'a> {
    pub fn new(
        node_id: NodeId,
        inputs: &'a [Option<DataObject>],
        cursors: &'a mut [FrameCursor],
        dynamic_dependencies: &'a [DynamicDependency],
        device: &'a DeviceHandle,
    ) -> Self {
        Self {
            node_id,
            inputs,
            cursors,
            dynamic_dependencies,
            device,
        }
    }

    /// Data currently on input `port`.
    pub fn input(&self, port: usize) -> PipelineResult<&DataObject> {
        self.inputs
            .get(port)
            .and_then(|slot| slot.as_ref())
            .ok_or(PipelineError::MissingInput {
                node_id: self.node_id,
                port,
            })
    }

    pub fn has_input(&self, port: usize) -> bool {
        self.inputs.get(port).is_some_and(|slot| slot.is_some())
    }

    /// The frame to process from input `port`.
    ///
    /// A static frame is returned as is. A dynamic sequence is read through
    /// the port's cursor, so repeated executions without new frames see the
    /// same frame instance again. `None` while the sequence is still empty.
    pub fn static_input_frame(&mut self, port: usize) -> PipelineResult<Option<FrameRef>> {
        let input = self
            .inputs
            .get(port)
            .and_then(|slot| slot.as_ref())
            .ok_or(PipelineError::MissingInput {
                node_id: self.node_id,
                port,
            })?;
        match input {
            DataObject::Frame(frame) => Ok(Some(frame.clone())),
            DataObject::Sequence(sequence) => {
                let cursor = self.cursors.get_mut(port).ok_or(PipelineError::MissingInput {
                    node_id: self.node_id,
                    port,
                })?;
                Ok(cursor.next_frame(sequence))
            }
            other => Err(PipelineError::UnexpectedData {
                expected: PortKind::Image,
                found: other.type_name(),
            }),
        }
    }

    pub fn input_transformation(&self, port: usize) -> PipelineResult<LinearTransformation> {
        let input = self.input(port)?;
        input
            .as_transformation()
            .copied()
            .ok_or(PipelineError::UnexpectedData {
                expected: PortKind::Transformation,
                found: input.type_name(),
            })
    }

    /// The sequence on input `port`, if that input is dynamic.
    pub fn dynamic_input(&self, port: usize) -> Option<&DynamicSequence> {
        self.inputs
            .get(port)
            .and_then(|slot| slot.as_ref())
            .and_then(DataObject::as_sequence)
    }

    /// True once the dynamic sequence on `port` has closed and every frame
    /// has been handed to this node. Always false for static inputs.
    pub fn input_drained(&mut self, port: usize) -> bool {
        let Some(sequence) = self
            .inputs
            .get(port)
            .and_then(|slot| slot.as_ref())
            .and_then(DataObject::as_sequence)
        else {
            return false;
        };
        match self.cursors.get_mut(port) {
            Some(cursor) => cursor.is_drained(sequence),
            None => false,
        }
    }

    /// Whether output `output` must be published as a dynamic sequence.
    pub fn output_is_dynamic(&self, output: usize) -> bool {
        self.dynamic_dependencies
            .iter()
            .filter(|dep| dep.output == output)
            .any(|dep| self.dynamic_input(dep.input).is_some())
    }

    /// Device this node runs on.
    pub fn device(&self) -> &DeviceHandle {
        self.device
    }
}

/// Trait for pluggable/user-defined nodes.
pub trait NodePlugin: Send {
    /// Human-readable name of this node.
    fn name(&self) -> &str;

    /// Port descriptors for this node.
    fn ports(&self) -> &[PortDescriptor];

    /// Outputs that follow the cadence of an input.
    fn dynamic_dependencies(&self) -> &[DynamicDependency] {
        &[]
    }

    /// Process the current inputs.
    fn execute(&mut self, ctx: &mut NodeContext) -> PipelineResult<()>;

    /// Data on output `port`. Called after `execute`.
    fn output(&mut self, port: usize) -> PipelineResult<DataObject>;

    /// Device the node carries on its own, used when the pipeline has no
    /// explicit assignment for it.
    fn device(&self) -> Option<DeviceHandle> {
        None
    }

    /// Called when the node is assigned a different device.
    fn on_device_change(&mut self, _device: &DeviceHandle) {}
}

// Built-in node types (defined in nodes/ and streamer/).
use crate::pipeline::nodes::{AddTransformationNode, FrameSourceNode, TransformationSourceNode};
use crate::streamer::ImageStreamer;

/// Enum dispatch for built-in nodes.
pub enum BuiltinNode {
    ImageStreamer(ImageStreamer),
    AddTransformation(AddTransformationNode),
    TransformationSource(TransformationSourceNode),
    FrameSource(FrameSourceNode),
}

impl BuiltinNode {
    pub fn name(&self) -> &str {
        match self {
            BuiltinNode::ImageStreamer(n) => n.name(),
            BuiltinNode::AddTransformation(n) => n.name(),
            BuiltinNode::TransformationSource(n) => n.name(),
            BuiltinNode::FrameSource(n) => n.name(),
        }
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        match self {
            BuiltinNode::ImageStreamer(n) => n.ports(),
            BuiltinNode::AddTransformation(n) => n.ports(),
            BuiltinNode::TransformationSource(n) => n.ports(),
            BuiltinNode::FrameSource(n) => n.ports(),
        }
    }

    pub fn dynamic_dependencies(&self) -> &[DynamicDependency] {
        match self {
            BuiltinNode::AddTransformation(n) => n.dynamic_dependencies(),
            BuiltinNode::ImageStreamer(_)
            | BuiltinNode::TransformationSource(_)
            | BuiltinNode::FrameSource(_) => &[],
        }
    }

    pub fn execute(&mut self, ctx: &mut NodeContext) -> PipelineResult<()> {
        match self {
            BuiltinNode::ImageStreamer(n) => n.execute_node(ctx),
            BuiltinNode::AddTransformation(n) => n.execute(ctx),
            BuiltinNode::TransformationSource(n) => n.execute(ctx),
            BuiltinNode::FrameSource(n) => n.execute(ctx),
        }
    }

    pub fn output(&mut self, port: usize) -> PipelineResult<DataObject> {
        match self {
            BuiltinNode::ImageStreamer(n) => n.output(port),
            BuiltinNode::AddTransformation(n) => n.output(port),
            BuiltinNode::TransformationSource(n) => n.output(port),
            BuiltinNode::FrameSource(n) => n.output(port),
        }
    }

    pub fn device(&self) -> Option<DeviceHandle> {
        match self {
            BuiltinNode::ImageStreamer(n) => Some(n.device()),
            BuiltinNode::AddTransformation(_)
            | BuiltinNode::TransformationSource(_)
            | BuiltinNode::FrameSource(_) => None,
        }
    }

    pub fn on_device_change(&mut self, device: &DeviceHandle) {
        match self {
            BuiltinNode::ImageStreamer(n) => n.set_device(device.clone()),
            BuiltinNode::AddTransformation(_)
            | BuiltinNode::TransformationSource(_)
            | BuiltinNode::FrameSource(_) => {}
        }
    }
}

/// Wrapper that holds either a built-in node (enum dispatch) or a plugin (trait object).
pub enum AnyNode {
    Builtin(BuiltinNode),
    Plugin(Box<dyn NodePlugin>),
}

impl AnyNode {
    pub fn name(&self) -> &str {
        match self {
            AnyNode::Builtin(n) => n.name(),
            AnyNode::Plugin(n) => n.name(),
        }
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        match self {
            AnyNode::Builtin(n) => n.ports(),
            AnyNode::Plugin(n) => n.ports(),
        }
    }

    pub fn dynamic_dependencies(&self) -> &[DynamicDependency] {
        match self {
            AnyNode::Builtin(n) => n.dynamic_dependencies(),
            AnyNode::Plugin(n) => n.dynamic_dependencies(),
        }
    }

    pub fn execute(&mut self, ctx: &mut NodeContext) -> PipelineResult<()> {
        match self {
            AnyNode::Builtin(n) => n.execute(ctx),
            AnyNode::Plugin(n) => n.execute(ctx),
        }
    }

    pub fn output(&mut self, port: usize) -> PipelineResult<DataObject> {
        match self {
            AnyNode::Builtin(n) => n.output(port),
            AnyNode::Plugin(n) => n.output(port),
        }
    }

    pub fn device(&self) -> Option<DeviceHandle> {
        match self {
            AnyNode::Builtin(n) => n.device(),
            AnyNode::Plugin(n) => n.device(),
        }
    }

    pub fn on_device_change(&mut self, device: &DeviceHandle) {
        match self {
            AnyNode::Builtin(n) => n.on_device_change(device),
            AnyNode::Plugin(n) => n.on_device_change(device),
        }
    }

    pub fn as_image_streamer(&self) -> Option<&ImageStreamer> {
        match self {
            AnyNode::Builtin(BuiltinNode::ImageStreamer(n)) => Some(n),
            _ => None,
        }
    }

    pub fn as_image_streamer_mut(&mut self) -> Option<&mut ImageStreamer> {
        match self {
            AnyNode::Builtin(BuiltinNode::ImageStreamer(n)) => Some(n),
            _ => None,
        }
    }

    pub fn as_add_transformation(&self) -> Option<&AddTransformationNode> {
        match self {
            AnyNode::Builtin(BuiltinNode::AddTransformation(n)) => Some(n),
            _ => None,
        }
    }

    pub fn as_transformation_source_mut(&mut self) -> Option<&mut TransformationSourceNode> {
        match self {
            AnyNode::Builtin(BuiltinNode::TransformationSource(n)) => Some(n),
            _ => None,
        }
    }
}

impl From<ImageStreamer> for AnyNode {
    fn from(node: ImageStreamer) -> Self {
        AnyNode::Builtin(BuiltinNode::ImageStreamer(node))
    }
}

impl From<AddTransformationNode> for AnyNode {
    fn from(node: AddTransformationNode) -> Self {
        AnyNode::Builtin(BuiltinNode::AddTransformation(node))
    }
}

impl From<TransformationSourceNode> for AnyNode {
    fn from(node: TransformationSourceNode) -> Self {
        AnyNode::Builtin(BuiltinNode::TransformationSource(node))
    }
}

impl From<FrameSourceNode> for AnyNode {
    fn from(node: FrameSourceNode) -> Self {
        AnyNode::Builtin(BuiltinNode::FrameSource(node))
    }
}

impl From<Box<dyn NodePlugin>> for AnyNode {
    fn from(node: Box<dyn NodePlugin>) -> Self {
        AnyNode::Plugin(node)
    }
}
