//! One 16³ vertical slice of a chunk column.

use crate::core::{
    cell_index, lattice_index, Voxel, CHUNK_SIZE, CORNER_COUNT, CORNER_OFFSETS, SEGMENT_VOLUME,
};
use crate::error::{Result, StreamError};
use crate::mesh::{IsosurfaceExtractor, MeshData};

use super::coord::{CoordinateSpace, SegmentCoord};
use super::visuals::{ChunkVisuals, VisualHandle};

/// Voxel grid and derived mesh for one segment.
///
/// The voxel array is allocated up front and holds [`Voxel::EMPTY`] until the
/// owning chunk synthesizes terrain. The mesh only exists after synthesis.
#[derive(Clone, Debug)]
pub struct ChunkSegment {
    coord: SegmentCoord,
    voxels: Box<[Voxel]>,
    mesh: Option<MeshData>,
    visual: Option<VisualHandle>,
}

impl ChunkSegment {
    pub fn new(coord: SegmentCoord) -> Self {
        Self {
            coord,
            voxels: vec![Voxel::EMPTY; SEGMENT_VOLUME].into_boxed_slice(),
            mesh: None,
            visual: None,
        }
    }

    pub fn coord(&self) -> SegmentCoord {
        self.coord
    }

    /// All 4096 voxels, x fastest, then z, then y.
    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    /// Voxel at local cell (x, y, z), each in 0..16.
    pub fn voxel(&self, x: usize, y: usize, z: usize) -> Voxel {
        self.voxels[cell_index(x, y, z)]
    }

    /// Voxel grid as raw bytes.
    pub fn voxel_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.voxels)
    }

    /// Mesh produced by the last synthesis.
    ///
    /// Fails with [`StreamError::MissingData`] before the segment has been
    /// synthesized.
    pub fn mesh(&self) -> Result<&MeshData> {
        self.mesh.as_ref().ok_or(StreamError::MissingData("segment mesh"))
    }

    pub fn has_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn visual(&self) -> Option<VisualHandle> {
        self.visual
    }

    /// Rasterize the column heightmap into this segment and extract its mesh.
    ///
    /// A corner is solid when its world height is at or below the heightmap
    /// sample at its (x, z) lattice position.
    pub(crate) fn synthesize(
        &mut self,
        heightmap: &[f32],
        extractor: &dyn IsosurfaceExtractor,
    ) -> Result<()> {
        let base_y = self.coord.y(CoordinateSpace::World);

        for y in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    let mut bits = 0u8;
                    for corner in 0..CORNER_COUNT {
                        let [cx, cy, cz] = CORNER_OFFSETS[corner];
                        let height = heightmap[lattice_index(x + cx as usize, z + cz as usize)];
                        let corner_y = (base_y + y as i32 + cy as i32) as f32;
                        if corner_y <= height {
                            bits |= 1 << corner;
                        }
                    }
                    self.voxels[cell_index(x, y, z)] = Voxel::from_bits(bits);
                }
            }
        }

        let mesh = extractor.extract(&self.voxels, [CHUNK_SIZE; 3])?;
        self.mesh = Some(mesh);
        Ok(())
    }

    /// Create the placeholder if this segment has none yet.
    pub(crate) fn ensure_placeholder(&mut self, visuals: &mut dyn ChunkVisuals) -> VisualHandle {
        match self.visual {
            Some(handle) => handle,
            None => {
                let handle = visuals.create_placeholder(self.coord, self.coord.world_origin());
                self.visual = Some(handle);
                handle
            }
        }
    }

    /// Hand the mesh to the placeholder. Returns false when either is missing.
    pub(crate) fn apply_mesh(&self, visuals: &mut dyn ChunkVisuals) -> bool {
        match (self.visual, self.mesh.as_ref()) {
            (Some(handle), Some(mesh)) => {
                visuals.apply_mesh(handle, mesh);
                true
            }
            _ => false,
        }
    }

    /// Destroy the placeholder and drop derived data.
    pub(crate) fn dispose(&mut self, visuals: &mut dyn ChunkVisuals) {
        if let Some(handle) = self.visual.take() {
            visuals.destroy_placeholder(handle);
        }
        self.mesh = None;
    }
}
