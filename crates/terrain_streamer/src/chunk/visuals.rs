//! Rendering collaborator seam.
//!
//! The manager never touches renderables directly. It asks a [`ChunkVisuals`]
//! implementation for one placeholder per segment, hands finished meshes over,
//! and releases the placeholders when a chunk is destroyed. All calls happen
//! on the thread that owns the [`ChunkManager`](super::ChunkManager).

use crate::mesh::MeshData;

use super::coord::SegmentCoord;

/// Opaque handle to a renderable owned by the visuals backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VisualHandle(pub u64);

/// Backend that creates, fills, and destroys per-segment renderables.
pub trait ChunkVisuals {
    /// Create an empty renderable for `segment` at its world-space origin.
    fn create_placeholder(&mut self, segment: SegmentCoord, world_position: [f32; 3]) -> VisualHandle;

    /// Destroy a renderable previously returned by `create_placeholder`.
    fn destroy_placeholder(&mut self, handle: VisualHandle);

    /// Upload finished geometry to a renderable.
    fn apply_mesh(&mut self, handle: VisualHandle, mesh: &MeshData);
}

/// Headless backend: hands out sequential handles and discards geometry.
#[derive(Clone, Debug, Default)]
pub struct NullVisuals {
    next_handle: u64,
    live: usize,
}

impl NullVisuals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Placeholders created and not yet destroyed.
    pub fn live_placeholders(&self) -> usize {
        self.live
    }
}

impl ChunkVisuals for NullVisuals {
    fn create_placeholder(&mut self, _segment: SegmentCoord, _world_position: [f32; 3]) -> VisualHandle {
        self.next_handle += 1;
        self.live += 1;
        VisualHandle(self.next_handle)
    }

    fn destroy_placeholder(&mut self, _handle: VisualHandle) {
        self.live = self.live.saturating_sub(1);
    }

    fn apply_mesh(&mut self, _handle: VisualHandle, _mesh: &MeshData) {}
}
