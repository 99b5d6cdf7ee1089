//! Serializable views of the pipeline graph, for logging and tooling.

use crate::pipeline::id::{EdgeId, NodeId, PortId};
use crate::pipeline::port::PortDescriptor;
use serde::Serialize;

/// Snapshot of a single pipeline node.
#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub name: String,
    pub ports: Vec<PortDescriptor>,
    /// Name of the device the node resolves to.
    pub device: String,
    pub executions: u64,
}

/// Snapshot of a single pipeline edge.
#[derive(Debug, Clone, Serialize)]
pub struct EdgeSnapshot {
    pub id: EdgeId,
    pub from: PortId,
    pub to_node: NodeId,
    pub to_port: usize,
}

/// Complete topology snapshot of the pipeline graph.
#[derive(Debug, Clone, Serialize)]
pub struct TopologySnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
}

impl TopologySnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
