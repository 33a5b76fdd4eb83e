//! Core type definitions for the terrain streamer.

use bytemuck::{Pod, Zeroable};

use crate::error::{Result, StreamError};

/// Shift between chunk space and world space (16 world units per chunk).
pub const CHUNK_SHIFT: u32 = 4;
/// Chunk edge length in world units / cells (16).
pub const CHUNK_SIZE: usize = 1 << CHUNK_SHIFT;
/// Cells in one horizontal layer of a segment (16 × 16 = 256).
pub const SEGMENT_AREA: usize = CHUNK_SIZE * CHUNK_SIZE;
/// Cells in one segment (16³ = 4096).
pub const SEGMENT_VOLUME: usize = SEGMENT_AREA * CHUNK_SIZE;
/// Heightmap lattice side length (one more sample than cells, 17).
pub const HEIGHTMAP_SIDE: usize = CHUNK_SIZE + 1;
/// Default number of vertical segments per chunk.
pub const DEFAULT_SEGMENT_COUNT: usize = 4;

/// Number of corners on a unit cube.
pub const CORNER_COUNT: usize = 8;
/// Number of edges on a unit cube.
pub const EDGE_COUNT: usize = 12;

/// Unit-cube position of each corner.
///
/// Corners 0..4 form the bottom face and 4..8 the top face, both walking
/// (x, z), (x+1, z), (x+1, z+1), (x, z+1).
pub const CORNER_OFFSETS: [[f32; 3]; CORNER_COUNT] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 0.0, 1.0],
    [0.0, 0.0, 1.0],
    [0.0, 1.0, 0.0],
    [1.0, 1.0, 0.0],
    [1.0, 1.0, 1.0],
    [0.0, 1.0, 1.0],
];

/// Corner pair joined by each edge.
pub const EDGE_CORNERS: [[usize; 2]; EDGE_COUNT] = [
    [0, 1], [1, 2], [2, 3], [3, 0], // bottom ring
    [4, 5], [5, 6], [6, 7], [7, 4], // top ring
    [0, 4], [1, 5], [2, 6], [3, 7], // verticals
];

/// Unit-cube midpoint of each edge.
pub const EDGE_OFFSETS: [[f32; 3]; EDGE_COUNT] = [
    [0.5, 0.0, 0.0],
    [1.0, 0.0, 0.5],
    [0.5, 0.0, 1.0],
    [0.0, 0.0, 0.5],
    [0.5, 1.0, 0.0],
    [1.0, 1.0, 0.5],
    [0.5, 1.0, 1.0],
    [0.0, 1.0, 0.5],
    [0.0, 0.5, 0.0],
    [1.0, 0.5, 0.0],
    [1.0, 0.5, 1.0],
    [0.0, 0.5, 1.0],
];

/// Corner-occupancy mask for one unit cube.
///
/// Bit `i` is set when cube corner `i` lies inside the terrain.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Voxel(u8);

impl Voxel {
    /// Voxel with every corner empty.
    pub const EMPTY: Voxel = Voxel(0);
    /// Voxel with every corner solid.
    pub const FULL: Voxel = Voxel(0xFF);

    /// Wrap a raw corner mask.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw corner mask.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Set or clear a single corner.
    ///
    /// Fails with [`StreamError::CornerOutOfRange`] for corners outside 0..=7.
    pub fn set_corner(&mut self, corner: i32, solid: bool) -> Result<()> {
        let bit = corner_bit(corner)?;
        if solid {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
        Ok(())
    }

    /// Whether a corner is solid.
    pub fn corner_state(self, corner: i32) -> Result<bool> {
        Ok(self.0 & corner_bit(corner)? != 0)
    }

    /// True if no corner is solid.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every corner is solid.
    pub fn is_full(self) -> bool {
        self.0 == 0xFF
    }

    /// True if the surface passes through this cube.
    pub fn is_mixed(self) -> bool {
        !self.is_empty() && !self.is_full()
    }

    /// Number of solid corners.
    pub fn solid_corners(self) -> u32 {
        self.0.count_ones()
    }

    /// Midpoint of an edge in unit-cube coordinates.
    ///
    /// Fails with [`StreamError::EdgeOutOfRange`] for edges outside 0..=11.
    pub fn edge_offset(edge: i32) -> Result<[f32; 3]> {
        Ok(EDGE_OFFSETS[edge_index(edge)?])
    }

    /// The two corners joined by an edge.
    pub fn edge_corners(edge: i32) -> Result<[usize; 2]> {
        Ok(EDGE_CORNERS[edge_index(edge)?])
    }

    /// Whether the two corners of an edge disagree.
    pub fn edge_crosses_surface(self, edge: usize) -> bool {
        let [a, b] = EDGE_CORNERS[edge];
        ((self.0 >> a) & 1) != ((self.0 >> b) & 1)
    }
}

fn corner_bit(corner: i32) -> Result<u8> {
    if !(0..CORNER_COUNT as i32).contains(&corner) {
        return Err(StreamError::CornerOutOfRange(corner));
    }
    Ok(1u8 << corner)
}

fn edge_index(edge: i32) -> Result<usize> {
    if !(0..EDGE_COUNT as i32).contains(&edge) {
        return Err(StreamError::EdgeOutOfRange(edge));
    }
    Ok(edge as usize)
}

/// Flat index of a cell inside a segment (x fastest, then z, then y).
#[inline]
pub fn cell_index(x: usize, y: usize, z: usize) -> usize {
    debug_assert!(x < CHUNK_SIZE && y < CHUNK_SIZE && z < CHUNK_SIZE);
    x + z * CHUNK_SIZE + y * SEGMENT_AREA
}

/// Flat index of a heightmap lattice sample.
#[inline]
pub fn lattice_index(x: usize, z: usize) -> usize {
    debug_assert!(x < HEIGHTMAP_SIDE && z < HEIGHTMAP_SIDE);
    x + z * HEIGHTMAP_SIDE
}
