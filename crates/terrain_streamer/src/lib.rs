//! Streaming voxel terrain around a moving reference point.
//!
//! This crate decides which terrain chunks must exist around a reference
//! point, synthesizes their geometry on background workers from layered
//! coherent noise, and evicts chunks that fall out of range.
//!
//! # Example
//!
//! ```
//! use terrain_streamer::chunk::{Chunk, ChunkCoord};
//! use terrain_streamer::{EdgeMidpointExtractor, NoiseConfig, NoiseGenerator};
//!
//! let noise = NoiseGenerator::new(&NoiseConfig::seeded(10_000)).unwrap();
//! let mut chunk = Chunk::new(ChunkCoord::new(0, 0), 4);
//! chunk.generate_terrain(&noise, &EdgeMidpointExtractor).unwrap();
//!
//! assert!(chunk.is_generated());
//! assert_eq!(chunk.segments().len(), 4);
//! assert!(chunk.segments().iter().all(|s| s.voxels().len() == 4096));
//! ```

pub mod core;
pub mod error;
pub mod config;
pub mod noise;
pub mod mesh;
pub mod chunk;

// Re-export primary types
pub use crate::core::{
    Voxel,
    // Constants
    CHUNK_SHIFT, CHUNK_SIZE, SEGMENT_AREA, SEGMENT_VOLUME, HEIGHTMAP_SIDE,
    DEFAULT_SEGMENT_COUNT, CORNER_COUNT, EDGE_COUNT,
    // Indexing
    cell_index, lattice_index,
};
pub use crate::error::{Result, StreamError};
pub use crate::config::{NoiseConfig, StreamConfig};
pub use crate::noise::NoiseGenerator;
pub use crate::mesh::{EdgeMidpointExtractor, IsosurfaceExtractor, MeshData};
pub use crate::chunk::{ChunkManager, ChunkVisuals, NullVisuals, ReferencePoint, TickStats};
