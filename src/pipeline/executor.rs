//! Pipeline graph and pull-driven executor.
//!
//! Nothing runs until someone asks for data. `execute(node)` walks the
//! node's connections depth-first:
//! 1. Execute every connected upstream node (each at most once per pull).
//! 2. Collect the upstream outputs into the node's input slots.
//! 3. Run the node with a [`NodeContext`] over those inputs.
//!
//! Only streamer nodes run work in the background; everything else runs on
//! the calling thread.

use crate::data::{DataObject, FrameCursor, StreamingMode};
use crate::device::{DeviceHandle, DeviceManager};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::id::{EdgeId, NodeId, PortId};
use crate::pipeline::node::{AnyNode, DynamicDependency, NodeContext};
use crate::pipeline::port::{count_ports, find_port, PortDirection};
use crate::pipeline::snapshot::{EdgeSnapshot, NodeSnapshot, TopologySnapshot};

/// A connection from an output port to one input of another node.
#[derive(Debug, Clone)]
pub struct Edge {
    pub id: EdgeId,
    pub from: PortId,
    pub to_node: NodeId,
    pub to_port: usize,
}

/// A node plus its input connections and per-input state.
pub struct NodeSlot {
    pub node: AnyNode,
    /// Edge feeding each input port.
    pub inputs: Vec<Option<EdgeId>>,
    /// Data collected from upstream on the last pull.
    pub input_data: Vec<Option<DataObject>>,
    /// Read position for dynamic inputs.
    pub cursors: Vec<FrameCursor>,
    /// Explicit device assignment.
    pub device: Option<DeviceHandle>,
    pub executions: u64,
}

impl NodeSlot {
    pub fn new(node: AnyNode) -> Self {
        let inputs = count_ports(node.ports(), PortDirection::Input);
        Self {
            node,
            inputs: vec![None; inputs],
            input_data: vec![None; inputs],
            cursors: vec![FrameCursor::default(); inputs],
            device: None,
            executions: 0,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Pending,
    InProgress,
    Done,
}

/// The pipeline graph.
#[derive(Default)]
pub struct Pipeline {
    nodes: Vec<NodeSlot>,
    edges: Vec<Edge>,
    default_device: Option<DeviceHandle>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pipeline whose unassigned nodes run on `device` instead of the
    /// registry default.
    pub fn with_default_device(device: DeviceHandle) -> Self {
        Self {
            default_device: Some(device),
            ..Self::default()
        }
    }

    // ── Graph building ──

    /// Add a node to the pipeline. Returns its NodeId.
    pub fn add_node(&mut self, node: impl Into<AnyNode>) -> NodeId {
        let node = node.into();
        let id = NodeId(self.nodes.len() as u32);
        tracing::debug!("Added node {} '{}'", id, node.name());
        self.nodes.push(NodeSlot::new(node));
        id
    }

    /// Output port `index` of `node`.
    pub fn output_port(&self, node: NodeId, index: usize) -> PipelineResult<PortId> {
        let slot = self.slot(node)?;
        find_port(slot.node.ports(), PortDirection::Output, index).ok_or(
            PipelineError::InvalidPort {
                node_id: node,
                direction: PortDirection::Output,
                index,
            },
        )?;
        Ok(PortId::new(node, index as u16))
    }

    /// Feed input `port` of `node` from `source`. Replaces any existing
    /// connection on that input.
    pub fn set_input_connection(
        &mut self,
        node: NodeId,
        port: usize,
        source: PortId,
    ) -> PipelineResult<EdgeId> {
        let target_kind = find_port(self.slot(node)?.node.ports(), PortDirection::Input, port)
            .ok_or(PipelineError::InvalidPort {
                node_id: node,
                direction: PortDirection::Input,
                index: port,
            })?
            .kind;

        let source_node = source.node();
        let source_index = source.port_index() as usize;
        let source_kind = find_port(
            self.slot(source_node)?.node.ports(),
            PortDirection::Output,
            source_index,
        )
        .ok_or(PipelineError::InvalidPort {
            node_id: source_node,
            direction: PortDirection::Output,
            index: source_index,
        })?
        .kind;

        if source_node == node {
            return Err(PipelineError::InvalidEdge(format!(
                "{} cannot feed itself",
                node
            )));
        }
        if source_kind != target_kind {
            return Err(PipelineError::PortMismatch(format!(
                "{} carries {:?}, input {} of {} expects {:?}",
                source, source_kind, port, node, target_kind
            )));
        }

        let slot = &mut self.nodes[node.index()];
        slot.input_data[port] = None;
        slot.cursors[port].reset();

        let id = match slot.inputs[port] {
            Some(existing) => {
                self.edges[existing.index()].from = source;
                existing
            }
            None => {
                let id = EdgeId(self.edges.len() as u32);
                self.edges.push(Edge {
                    id,
                    from: source,
                    to_node: node,
                    to_port: port,
                });
                slot.inputs[port] = Some(id);
                id
            }
        };
        tracing::debug!("Connected {} to input {} of {}", source, port, node);
        Ok(id)
    }

    /// How input `port` of `node` advances through dynamic sequences.
    pub fn set_streaming_mode(
        &mut self,
        node: NodeId,
        port: usize,
        mode: StreamingMode,
    ) -> PipelineResult<()> {
        let slot = self.slot_mut(node)?;
        let cursor = slot
            .cursors
            .get_mut(port)
            .ok_or(PipelineError::InvalidPort {
                node_id: node,
                direction: PortDirection::Input,
                index: port,
            })?;
        cursor.set_mode(mode);
        Ok(())
    }

    // ── Devices ──

    /// Assign `node` to `device`.
    pub fn set_device(&mut self, node: NodeId, device: DeviceHandle) -> PipelineResult<()> {
        let slot = self.slot_mut(node)?;
        slot.node.on_device_change(&device);
        tracing::debug!("Node {} '{}' assigned to {}", node, slot.node.name(), device);
        slot.device = Some(device);
        Ok(())
    }

    /// The device `node` runs on: its explicit assignment, else the device
    /// the node carries itself, else the pipeline or registry default.
    pub fn device(&self, node: NodeId) -> PipelineResult<DeviceHandle> {
        let slot = self.slot(node)?;
        Ok(self.resolve_device(slot))
    }

    fn resolve_device(&self, slot: &NodeSlot) -> DeviceHandle {
        slot.device
            .clone()
            .or_else(|| slot.node.device())
            .or_else(|| self.default_device.clone())
            .unwrap_or_else(|| DeviceManager::global().default_computation_device())
    }

    // ── Execution ──

    /// Execute `node` and, first, everything it pulls from.
    pub fn execute(&mut self, node: NodeId) -> PipelineResult<()> {
        self.slot(node)?;
        let mut visits = vec![Visit::Pending; self.nodes.len()];
        self.execute_inner(node, &mut visits)
    }

    fn execute_inner(&mut self, node: NodeId, visits: &mut [Visit]) -> PipelineResult<()> {
        let idx = node.index();
        match visits[idx] {
            Visit::Done => return Ok(()),
            Visit::InProgress => return Err(PipelineError::CycleDetected(node)),
            Visit::Pending => {}
        }
        visits[idx] = Visit::InProgress;

        let connections: Vec<(usize, PortId)> = self.nodes[idx]
            .inputs
            .iter()
            .enumerate()
            .filter_map(|(port, edge)| edge.map(|e| (port, self.edges[e.index()].from)))
            .collect();

        for (port, from) in connections {
            self.execute_inner(from.node(), visits)?;
            let data = self.nodes[from.node().index()]
                .node
                .output(from.port_index() as usize)?;
            self.nodes[idx].input_data[port] = Some(data);
        }

        let device = self.resolve_device(&self.nodes[idx]);
        let NodeSlot {
            node: inner,
            input_data,
            cursors,
            executions,
            ..
        } = &mut self.nodes[idx];
        let dependencies: Vec<DynamicDependency> = inner.dynamic_dependencies().to_vec();
        let mut ctx = NodeContext::new(node, input_data, cursors, &dependencies, &device);
        let result = inner.execute(&mut ctx);
        *executions += 1;
        visits[idx] = Visit::Done;

        if let Err(e) = &result {
            tracing::error!("Node {} '{}' failed: {}", node, inner.name(), e);
        }
        result
    }

    /// Execute the node owning `port` and return the data on that port.
    pub fn output_data(&mut self, port: PortId) -> PipelineResult<DataObject> {
        let node = port.node();
        self.execute(node)?;
        self.nodes[node.index()]
            .node
            .output(port.port_index() as usize)
    }

    // ── Accessors ──

    pub fn node(&self, id: NodeId) -> Option<&AnyNode> {
        self.nodes.get(id.index()).map(|slot| &slot.node)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut AnyNode> {
        self.nodes.get_mut(id.index()).map(|slot| &mut slot.node)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// How many times `node` has executed.
    pub fn executions(&self, node: NodeId) -> u64 {
        self.nodes
            .get(node.index())
            .map(|slot| slot.executions)
            .unwrap_or(0)
    }

    /// Serializable view of the graph.
    pub fn topology(&self) -> TopologySnapshot {
        let nodes = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, slot)| NodeSnapshot {
                id: NodeId(i as u32),
                name: slot.node.name().to_string(),
                ports: slot.node.ports().to_vec(),
                device: self.resolve_device(slot).name().to_string(),
                executions: slot.executions,
            })
            .collect();
        let edges = self
            .edges
            .iter()
            .map(|edge| EdgeSnapshot {
                id: edge.id,
                from: edge.from,
                to_node: edge.to_node,
                to_port: edge.to_port,
            })
            .collect();
        TopologySnapshot { nodes, edges }
    }

    fn slot(&self, node: NodeId) -> PipelineResult<&NodeSlot> {
        self.nodes
            .get(node.index())
            .ok_or_else(|| PipelineError::InvalidEdge(format!("No node {}", node)))
    }

    fn slot_mut(&mut self, node: NodeId) -> PipelineResult<&mut NodeSlot> {
        self.nodes
            .get_mut(node.index())
            .ok_or_else(|| PipelineError::InvalidEdge(format!("No node {}", node)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Frame, Image, LinearTransformation};
    use crate::device::DeviceKind;
    use crate::pipeline::nodes::{
        AddTransformationNode, FrameSourceNode, TransformationSourceNode,
    };
    use crate::pipeline::port::{PortDescriptor, PortKind};
    use crate::pipeline::NodePlugin;

    /// Passes its image input through and counts executions.
    struct Passthrough {
        seen: usize,
        last: Option<DataObject>,
    }

    static PASSTHROUGH_PORTS: &[PortDescriptor] = &[
        PortDescriptor::input("in", PortKind::Image),
        PortDescriptor::output("out", PortKind::Image),
    ];

    impl NodePlugin for Passthrough {
        fn name(&self) -> &str {
            "Passthrough"
        }

        fn ports(&self) -> &[PortDescriptor] {
            PASSTHROUGH_PORTS
        }

        fn execute(&mut self, ctx: &mut NodeContext) -> PipelineResult<()> {
            self.seen += 1;
            self.last = Some(ctx.input(0)?.clone());
            Ok(())
        }

        fn output(&mut self, _port: usize) -> PipelineResult<DataObject> {
            self.last
                .clone()
                .ok_or_else(|| PipelineError::OutputNotReady("Passthrough".to_string()))
        }
    }

    fn passthrough() -> AnyNode {
        AnyNode::Plugin(Box::new(Passthrough {
            seen: 0,
            last: None,
        }))
    }

    fn frame_source() -> FrameSourceNode {
        FrameSourceNode::new(Frame::new(Image::filled(1, 1, 1, 3).unwrap()))
    }

    #[test]
    fn test_pull_executes_upstream_once() {
        let mut pipeline = Pipeline::new();
        let source = pipeline.add_node(frame_source());
        let a = pipeline.add_node(passthrough());
        let b = pipeline.add_node(passthrough());

        let out = pipeline.output_port(source, 0).unwrap();
        pipeline.set_input_connection(a, 0, out).unwrap();
        let a_out = pipeline.output_port(a, 0).unwrap();
        pipeline.set_input_connection(b, 0, a_out).unwrap();

        let b_out = pipeline.output_port(b, 0).unwrap();
        let data = pipeline.output_data(b_out).unwrap();
        assert!(data.as_frame().is_some());
        assert_eq!(pipeline.executions(source), 1);
        assert_eq!(pipeline.executions(a), 1);
        assert_eq!(pipeline.executions(b), 1);

        // Nothing is pushed: executing the source alone leaves downstream idle.
        pipeline.execute(source).unwrap();
        assert_eq!(pipeline.executions(b), 1);
    }

    #[test]
    fn test_connection_validation() {
        let mut pipeline = Pipeline::new();
        let frames = pipeline.add_node(frame_source());
        let transform =
            pipeline.add_node(TransformationSourceNode::new(LinearTransformation::identity()));
        let add = pipeline.add_node(AddTransformationNode::new());

        let frame_out = pipeline.output_port(frames, 0).unwrap();
        let transform_out = pipeline.output_port(transform, 0).unwrap();

        assert!(matches!(
            pipeline.output_port(frames, 1),
            Err(PipelineError::InvalidPort { .. })
        ));
        assert!(matches!(
            pipeline.set_input_connection(add, 0, transform_out),
            Err(PipelineError::PortMismatch(_))
        ));
        assert!(matches!(
            pipeline.set_input_connection(add, 2, frame_out),
            Err(PipelineError::InvalidPort { index: 2, .. })
        ));

        let edge = pipeline.set_input_connection(add, 0, frame_out).unwrap();
        let replaced = pipeline.set_input_connection(add, 0, frame_out).unwrap();
        assert_eq!(edge, replaced);
        assert_eq!(pipeline.edges().len(), 1);
    }

    #[test]
    fn test_cycle_detected() {
        let mut pipeline = Pipeline::new();
        let a = pipeline.add_node(passthrough());
        let b = pipeline.add_node(passthrough());
        let a_out = pipeline.output_port(a, 0).unwrap();
        let b_out = pipeline.output_port(b, 0).unwrap();
        pipeline.set_input_connection(b, 0, a_out).unwrap();
        pipeline.set_input_connection(a, 0, b_out).unwrap();

        assert!(matches!(
            pipeline.execute(a),
            Err(PipelineError::CycleDetected(_))
        ));
        assert!(matches!(
            pipeline.set_input_connection(a, 0, a_out),
            Err(PipelineError::InvalidEdge(_))
        ));
    }

    #[test]
    fn test_unconnected_input_is_reported() {
        let mut pipeline = Pipeline::new();
        let a = pipeline.add_node(passthrough());
        assert!(matches!(
            pipeline.execute(a),
            Err(PipelineError::MissingInput { port: 0, .. })
        ));
    }

    #[test]
    fn test_static_frame_through_add_transformation_fails() {
        let mut pipeline = Pipeline::new();
        let frames = pipeline.add_node(frame_source());
        let transform =
            pipeline.add_node(TransformationSourceNode::new(LinearTransformation::identity()));
        let add = pipeline.add_node(AddTransformationNode::new());
        let frame_out = pipeline.output_port(frames, 0).unwrap();
        let transform_out = pipeline.output_port(transform, 0).unwrap();
        pipeline.set_input_connection(add, 0, frame_out).unwrap();
        pipeline.set_input_connection(add, 1, transform_out).unwrap();

        let err = pipeline.execute(add).unwrap_err();
        assert!(err.is_not_implemented());
    }

    #[test]
    fn test_device_resolution() {
        let manager = DeviceManager::new();
        let host = manager.default_computation_device();
        let gpu = manager.register("gpu0", DeviceKind::Accelerator);

        let mut pipeline = Pipeline::with_default_device(host.clone());
        let a = pipeline.add_node(passthrough());
        assert_eq!(pipeline.device(a).unwrap().name(), host.name());

        pipeline.set_device(a, gpu.clone()).unwrap();
        assert_eq!(pipeline.device(a).unwrap().name(), "gpu0");

        let topology = pipeline.topology();
        assert_eq!(topology.nodes[0].device, "gpu0");
        assert_eq!(topology.nodes[0].name, "Passthrough");
    }
}
