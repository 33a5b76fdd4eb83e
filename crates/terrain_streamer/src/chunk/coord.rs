//! Chunk-space / world-space coordinate types.
//!
//! Chunk space indexes whole chunks; world space counts unit cells, 16 per
//! chunk. Every getter takes the [`CoordinateSpace`] explicitly so call sites
//! never depend on an implicit default.

use crate::core::CHUNK_SHIFT;

/// Which integer grid a coordinate is expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CoordinateSpace {
    /// One unit per chunk.
    Chunk,
    /// One unit per cell (16 per chunk).
    World,
}

/// World → chunk (arithmetic shift, floors negative values).
#[inline]
pub const fn to_chunk(v: i32) -> i32 {
    v >> CHUNK_SHIFT
}

/// Chunk → world (origin of the chunk).
#[inline]
pub const fn to_world(v: i32) -> i32 {
    v << CHUNK_SHIFT
}

/// Chunk column coordinate (x, z), stored in chunk space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct ChunkCoord {
    x: i32,
    z: i32,
}

impl ChunkCoord {
    /// Origin column (0, 0).
    pub const ZERO: ChunkCoord = ChunkCoord { x: 0, z: 0 };

    /// Create from chunk-space components.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Create from components in the given space.
    ///
    /// World values are floored to the containing chunk.
    pub const fn in_space(x: i32, z: i32, space: CoordinateSpace) -> Self {
        match space {
            CoordinateSpace::Chunk => Self { x, z },
            CoordinateSpace::World => Self {
                x: to_chunk(x),
                z: to_chunk(z),
            },
        }
    }

    /// Chunk containing a floating-point world position (x, z).
    ///
    /// # Example
    /// ```
    /// use terrain_streamer::chunk::ChunkCoord;
    ///
    /// assert_eq!(ChunkCoord::from_world_pos(15.9, 0.0), ChunkCoord::new(0, 0));
    /// assert_eq!(ChunkCoord::from_world_pos(16.0, -0.5), ChunkCoord::new(1, -1));
    /// ```
    pub fn from_world_pos(x: f32, z: f32) -> Self {
        Self::in_space(x.floor() as i32, z.floor() as i32, CoordinateSpace::World)
    }

    pub const fn x(&self, space: CoordinateSpace) -> i32 {
        match space {
            CoordinateSpace::Chunk => self.x,
            CoordinateSpace::World => to_world(self.x),
        }
    }

    pub const fn z(&self, space: CoordinateSpace) -> i32 {
        match space {
            CoordinateSpace::Chunk => self.z,
            CoordinateSpace::World => to_world(self.z),
        }
    }

    /// Offset by a chunk-space delta.
    pub const fn offset(&self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            z: self.z + dz,
        }
    }

    /// Squared chunk-space distance to another column.
    pub fn distance_squared(&self, other: ChunkCoord) -> i64 {
        let dx = self.x as i64 - other.x as i64;
        let dz = self.z as i64 - other.z as i64;
        dx * dx + dz * dz
    }

    /// Largest per-axis chunk-space difference.
    pub fn chebyshev_distance(&self, other: ChunkCoord) -> u32 {
        self.x.abs_diff(other.x).max(self.z.abs_diff(other.z))
    }

    /// World-space origin (minimum corner) as floats.
    pub fn world_origin(&self) -> [f32; 3] {
        [
            self.x(CoordinateSpace::World) as f32,
            0.0,
            self.z(CoordinateSpace::World) as f32,
        ]
    }

    pub fn key(&self) -> ChunkKey {
        ChunkKey::new(self.x, self.z)
    }
}

/// Segment coordinate (x, y, z), stored in chunk space.
///
/// `y` is the segment index within its column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct SegmentCoord {
    x: i32,
    y: i32,
    z: i32,
}

impl SegmentCoord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Segment `index` of a chunk column.
    pub const fn of_column(column: ChunkCoord, index: i32) -> Self {
        Self {
            x: column.x,
            y: index,
            z: column.z,
        }
    }

    pub const fn x(&self, space: CoordinateSpace) -> i32 {
        match space {
            CoordinateSpace::Chunk => self.x,
            CoordinateSpace::World => to_world(self.x),
        }
    }

    pub const fn y(&self, space: CoordinateSpace) -> i32 {
        match space {
            CoordinateSpace::Chunk => self.y,
            CoordinateSpace::World => to_world(self.y),
        }
    }

    pub const fn z(&self, space: CoordinateSpace) -> i32 {
        match space {
            CoordinateSpace::Chunk => self.z,
            CoordinateSpace::World => to_world(self.z),
        }
    }

    pub const fn column(&self) -> ChunkCoord {
        ChunkCoord::new(self.x, self.z)
    }

    /// World-space origin (minimum corner) as floats.
    pub fn world_origin(&self) -> [f32; 3] {
        [
            self.x(CoordinateSpace::World) as f32,
            self.y(CoordinateSpace::World) as f32,
            self.z(CoordinateSpace::World) as f32,
        ]
    }
}

/// Unique 64-bit identity of a chunk column.
///
/// Low 32 bits hold `x`, high 32 bits hold `z`, both as their two's-complement
/// bit patterns, so every (x, z) pair maps to a distinct key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey(u64);

impl ChunkKey {
    pub const fn new(x: i32, z: i32) -> Self {
        Self((x as u32 as u64) | ((z as u32 as u64) << 32))
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Decode back to the chunk-space column.
    pub const fn coord(self) -> ChunkCoord {
        ChunkCoord::new(self.0 as u32 as i32, (self.0 >> 32) as u32 as i32)
    }
}

impl From<ChunkCoord> for ChunkKey {
    fn from(coord: ChunkCoord) -> Self {
        coord.key()
    }
}
