//! A single frame and its scene-graph attachment slot.

use crate::data::image::Image;
use crate::device::DeviceHandle;
use crate::scene::SceneGraphNodeRef;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique frame number, for logs and diagnostics.
///
/// Identity checks compare [`FrameRef`]s with [`Frame::same_instance`], not ids.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u64);

impl fmt::Debug for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameId({})", self.0)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Shared handle to an immutable frame.
pub type FrameRef = Arc<Frame>;

/// One unit of data. The payload never changes after construction; only the
/// scene-graph slot is mutable.
pub struct Frame {
    id: FrameId,
    image: Image,
    source: Option<String>,
    device: Option<DeviceHandle>,
    created_at: DateTime<Utc>,
    scene_node: RwLock<Option<SceneGraphNodeRef>>,
}

impl Frame {
    fn build(
        image: Image,
        source: Option<String>,
        device: Option<DeviceHandle>,
        scene_node: Option<SceneGraphNodeRef>,
    ) -> FrameRef {
        Arc::new(Self {
            id: FrameId(NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed)),
            image,
            source,
            device,
            created_at: Utc::now(),
            scene_node: RwLock::new(scene_node),
        })
    }

    pub fn new(image: Image) -> FrameRef {
        Self::build(image, None, None, None)
    }

    /// A frame produced by an item source.
    pub fn imported(image: Image, source: impl Into<String>, device: DeviceHandle) -> FrameRef {
        Self::build(image, Some(source.into()), Some(device), None)
    }

    /// A new, distinct frame that lives in the same spatial frame of
    /// reference as `parent` (it shares the parent's scene-graph node).
    pub fn derive(parent: &Frame, image: Image) -> FrameRef {
        Self::build(
            image,
            parent.source.clone(),
            parent.device.clone(),
            parent.scene_graph_node(),
        )
    }

    pub fn id(&self) -> FrameId {
        self.id
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Identifier the frame was imported from, if any.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Device the frame was imported on, if any.
    pub fn device(&self) -> Option<&DeviceHandle> {
        self.device.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn scene_graph_node(&self) -> Option<SceneGraphNodeRef> {
        self.scene_node.read().clone()
    }

    pub(crate) fn scene_slot(&self) -> &RwLock<Option<SceneGraphNodeRef>> {
        &self.scene_node
    }

    /// True if both handles refer to the same frame instance.
    pub fn same_instance(a: &FrameRef, b: &FrameRef) -> bool {
        Arc::ptr_eq(a, b)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("id", &self.id)
            .field("image", &self.image)
            .field("source", &self.source)
            .field("device", &self.device.as_ref().map(|d| d.name()))
            .field("created_at", &self.created_at)
            .field("attached", &self.scene_node.read().is_some())
            .finish()
    }
}
