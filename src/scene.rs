//! Scene graph of spatial transformations.
//!
//! Each [`Frame`] may reference one [`SceneGraphNode`]. A node holds its
//! transform relative to its parent, so the transform of a frame relative to
//! the root is the product of the chain from the root down to its node.
//!
//! ```text
//! root (T_a) ──► node (T_b) ──► frame's node (T_c)      full = T_a · T_b · T_c
//! ```
//!
//! Inserting a parent puts the new node above the current root of the
//! frame's chain, so its transform is applied last: `new · old chain`.
//!
//! Nodes are shared and reference counted; they go away with the last frame
//! or child that points at them.

use crate::data::{Frame, LinearTransformation};
use parking_lot::RwLock;
use std::sync::Arc;

pub type SceneGraphNodeRef = Arc<SceneGraphNode>;

/// A transform relative to an optional parent node.
#[derive(Debug)]
pub struct SceneGraphNode {
    transformation: RwLock<LinearTransformation>,
    parent: RwLock<Option<SceneGraphNodeRef>>,
}

impl SceneGraphNode {
    pub fn new(transformation: LinearTransformation) -> SceneGraphNodeRef {
        Arc::new(Self {
            transformation: RwLock::new(transformation),
            parent: RwLock::new(None),
        })
    }

    pub fn with_parent(
        transformation: LinearTransformation,
        parent: SceneGraphNodeRef,
    ) -> SceneGraphNodeRef {
        Arc::new(Self {
            transformation: RwLock::new(transformation),
            parent: RwLock::new(Some(parent)),
        })
    }

    pub fn transformation(&self) -> LinearTransformation {
        *self.transformation.read()
    }

    pub fn set_transformation(&self, transformation: LinearTransformation) {
        *self.transformation.write() = transformation;
    }

    pub fn parent(&self) -> Option<SceneGraphNodeRef> {
        self.parent.read().clone()
    }

    fn set_parent(&self, parent: Option<SceneGraphNodeRef>) {
        *self.parent.write() = parent;
    }

    pub fn is_root(&self) -> bool {
        self.parent.read().is_none()
    }

    /// The topmost ancestor, or this node if it has no parent.
    pub fn root(self: &Arc<Self>) -> SceneGraphNodeRef {
        let mut current = Arc::clone(self);
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// Number of ancestors above this node.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent();
        while let Some(node) = current {
            depth += 1;
            current = node.parent();
        }
        depth
    }

    /// Transform from this node's space to the root's space.
    pub fn full_transformation(&self) -> LinearTransformation {
        let mut result = self.transformation();
        let mut current = self.parent();
        while let Some(node) = current {
            result = node.transformation() * result;
            current = node.parent();
        }
        result
    }
}

/// Operations that attach and update transforms on frames.
pub struct SceneGraph;

impl SceneGraph {
    /// Insert a new node carrying `transformation` as the parent of the
    /// frame's chain. A frame without a node gets the new node as its own.
    ///
    /// Returns the inserted node.
    pub fn insert_parent_node(
        frame: &Frame,
        transformation: LinearTransformation,
    ) -> SceneGraphNodeRef {
        let node = SceneGraphNode::new(transformation);
        let mut slot = frame.scene_slot().write();
        match slot.as_ref() {
            Some(current) => {
                current.root().set_parent(Some(Arc::clone(&node)));
            }
            None => {
                *slot = Some(Arc::clone(&node));
            }
        }
        node
    }

    /// Overwrite a node's transform in place.
    pub fn set_transformation(node: &SceneGraphNode, transformation: LinearTransformation) {
        node.set_transformation(transformation);
    }

    /// Transform from the frame's space to the root's space (identity when
    /// the frame has no node).
    pub fn full_transformation(frame: &Frame) -> LinearTransformation {
        frame
            .scene_graph_node()
            .map(|node| node.full_transformation())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Image;
    use glam::Vec3;

    fn frame() -> crate::data::FrameRef {
        Frame::new(Image::filled(1, 1, 1, 0).unwrap())
    }

    fn translate(x: f32) -> LinearTransformation {
        LinearTransformation::translation(Vec3::new(x, 0.0, 0.0))
    }

    #[test]
    fn test_insert_on_unattached_frame_installs_root() {
        let f = frame();
        let node = SceneGraph::insert_parent_node(&f, translate(1.0));
        let attached = f.scene_graph_node().unwrap();
        assert!(Arc::ptr_eq(&node, &attached));
        assert!(attached.is_root());
        assert_eq!(SceneGraph::full_transformation(&f), translate(1.0));
    }

    #[test]
    fn test_insert_composes_as_prefix() {
        let f = frame();
        let first = SceneGraph::insert_parent_node(&f, translate(1.0));
        let scale = LinearTransformation::scaling(Vec3::splat(3.0));
        let second = SceneGraph::insert_parent_node(&f, scale);

        // The frame keeps its node; the new node sits above it.
        let attached = f.scene_graph_node().unwrap();
        assert!(Arc::ptr_eq(&attached, &first));
        assert!(Arc::ptr_eq(&attached.parent().unwrap(), &second));
        assert_eq!(attached.depth(), 1);
        assert_eq!(
            SceneGraph::full_transformation(&f),
            scale * translate(1.0)
        );
    }

    #[test]
    fn test_insert_goes_above_existing_root() {
        let root = SceneGraphNode::new(translate(100.0));
        let f = frame();
        let own = SceneGraphNode::with_parent(translate(1.0), Arc::clone(&root));
        *f.scene_slot().write() = Some(Arc::clone(&own));

        let scale = LinearTransformation::scaling(Vec3::splat(2.0));
        let inserted = SceneGraph::insert_parent_node(&f, scale);
        assert!(Arc::ptr_eq(&root.parent().unwrap(), &inserted));
        assert!(Arc::ptr_eq(&own.root(), &inserted));
        assert_eq!(own.depth(), 2);
        assert!(SceneGraph::full_transformation(&f)
            .abs_diff_eq(&(scale * translate(100.0) * translate(1.0)), 1e-5));
    }

    #[test]
    fn test_set_transformation_in_place() {
        let f = frame();
        let node = SceneGraph::insert_parent_node(&f, translate(1.0));
        SceneGraph::set_transformation(&node, translate(2.0));
        assert_eq!(f.scene_graph_node().unwrap().transformation(), translate(2.0));
        assert!(f.scene_graph_node().unwrap().is_root());
    }

    #[test]
    fn test_unattached_frame_is_identity() {
        assert_eq!(
            SceneGraph::full_transformation(&frame()),
            LinearTransformation::identity()
        );
    }
}
