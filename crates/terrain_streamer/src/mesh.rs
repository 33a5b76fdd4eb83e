//! Mesh data and the isosurface-extraction seam.
//!
//! Terrain synthesis hands each segment's 16³ corner-occupancy grid to an
//! [`IsosurfaceExtractor`] and stores whatever [`MeshData`] comes back. The
//! bundled [`EdgeMidpointExtractor`] is a small table-free extractor good
//! enough for previews and tests; production callers plug in their own
//! marching-cubes implementation.

use glam::Vec3;

use crate::core::{Voxel, CORNER_COUNT, CORNER_OFFSETS, EDGE_COUNT, EDGE_OFFSETS};
use crate::error::{Result, StreamError};

/// Triangle mesh produced for one chunk segment.
///
/// Positions are local to the segment's world origin.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    /// Vertex positions.
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex normals.
    pub normals: Vec<[f32; 3]>,
    /// Triangle list indices into `positions`.
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Positions as raw bytes, ready for a vertex buffer upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Normals as raw bytes.
    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    /// Indices as raw bytes.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Approximate heap usage in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.position_bytes().len() + self.normal_bytes().len() + self.index_bytes().len()
    }
}

/// Converts a corner-occupancy grid into a triangle mesh.
///
/// Implementations run on generation worker threads.
pub trait IsosurfaceExtractor: Send + Sync {
    /// Extract a mesh from `voxels`, laid out x-fastest, then z, then y,
    /// with `dims = [x, y, z]`.
    fn extract(&self, voxels: &[Voxel], dims: [usize; 3]) -> Result<MeshData>;
}

/// Emits one fan polygon per mixed cell through the midpoints of its
/// sign-changing edges, facing from the solid corners toward the empty ones.
#[derive(Clone, Copy, Debug, Default)]
pub struct EdgeMidpointExtractor;

impl IsosurfaceExtractor for EdgeMidpointExtractor {
    fn extract(&self, voxels: &[Voxel], dims: [usize; 3]) -> Result<MeshData> {
        let [dx, dy, dz] = dims;
        let expected = dx * dy * dz;
        if voxels.len() != expected {
            return Err(StreamError::GridSize {
                expected,
                actual: voxels.len(),
            });
        }

        let mut mesh = MeshData::default();
        let mut ring: Vec<Vec3> = Vec::with_capacity(EDGE_COUNT);

        for y in 0..dy {
            for z in 0..dz {
                for x in 0..dx {
                    let voxel = voxels[x + z * dx + y * dx * dz];
                    if !voxel.is_mixed() {
                        continue;
                    }
                    let origin = Vec3::new(x as f32, y as f32, z as f32);
                    emit_cell(&mut mesh, &mut ring, voxel, origin);
                }
            }
        }

        Ok(mesh)
    }
}

/// Direction from the solid corners' centroid to the empty corners' centroid.
fn outward_normal(voxel: Voxel) -> Vec3 {
    let mut solid = Vec3::ZERO;
    let mut empty = Vec3::ZERO;
    for corner in 0..CORNER_COUNT {
        let p = Vec3::from(CORNER_OFFSETS[corner]);
        if voxel.bits() & (1 << corner) != 0 {
            solid += p;
        } else {
            empty += p;
        }
    }
    let solid_count = voxel.solid_corners() as f32;
    let empty_count = CORNER_COUNT as f32 - solid_count;
    let normal = (empty / empty_count - solid / solid_count).normalize_or_zero();
    if normal == Vec3::ZERO {
        // Symmetric configurations have no preferred side
        Vec3::Y
    } else {
        normal
    }
}

fn emit_cell(mesh: &mut MeshData, ring: &mut Vec<Vec3>, voxel: Voxel, origin: Vec3) {
    ring.clear();
    ring.extend(
        (0..EDGE_COUNT)
            .filter(|&edge| voxel.edge_crosses_surface(edge))
            .map(|edge| origin + Vec3::from(EDGE_OFFSETS[edge])),
    );
    if ring.len() < 3 {
        return;
    }

    let normal = outward_normal(voxel);
    let center = ring.iter().copied().sum::<Vec3>() / ring.len() as f32;
    let (u, v) = normal.any_orthonormal_pair();
    ring.sort_by(|a, b| {
        let angle_a = (*a - center).dot(v).atan2((*a - center).dot(u));
        let angle_b = (*b - center).dot(v).atan2((*b - center).dot(u));
        angle_a.total_cmp(&angle_b)
    });

    // Keep counter-clockwise winding around the outward normal
    let winding = (ring[1] - ring[0]).cross(ring[2] - ring[0]);
    if winding.dot(normal) < 0.0 {
        ring.reverse();
    }

    let base = mesh.positions.len() as u32;
    for point in ring.iter() {
        mesh.positions.push(point.to_array());
        mesh.normals.push(normal.to_array());
    }
    for i in 1..ring.len() as u32 - 1 {
        mesh.indices.extend_from_slice(&[base, base + i, base + i + 1]);
    }
}
