//! Port descriptors for the node system.
//!
//! Each node declares its ports via a static `PortDescriptor` array. Input
//! and output ports are numbered separately, in declaration order, so
//! `[input a, output x, input b]` has inputs 0 (`a`) and 1 (`b`) and output
//! 0 (`x`). The pipeline uses the descriptors to validate connections.

use serde::Serialize;

/// The kind of data flowing through a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PortKind {
    /// Frames, either one static frame or a dynamic sequence.
    Image,
    /// Spatial transform values.
    Transformation,
}

/// Whether a port is an input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PortDirection {
    Input,
    Output,
}

/// Static descriptor for a node's port.
#[derive(Debug, Clone, Serialize)]
pub struct PortDescriptor {
    pub name: &'static str,
    pub direction: PortDirection,
    pub kind: PortKind,
}

impl PortDescriptor {
    pub const fn input(name: &'static str, kind: PortKind) -> Self {
        Self {
            name,
            direction: PortDirection::Input,
            kind,
        }
    }

    pub const fn output(name: &'static str, kind: PortKind) -> Self {
        Self {
            name,
            direction: PortDirection::Output,
            kind,
        }
    }
}

/// The `index`-th port of the given direction.
pub fn find_port(
    ports: &[PortDescriptor],
    direction: PortDirection,
    index: usize,
) -> Option<&PortDescriptor> {
    ports
        .iter()
        .filter(|p| p.direction == direction)
        .nth(index)
}

/// Number of ports of the given direction.
pub fn count_ports(ports: &[PortDescriptor], direction: PortDirection) -> usize {
    ports.iter().filter(|p| p.direction == direction).count()
}
