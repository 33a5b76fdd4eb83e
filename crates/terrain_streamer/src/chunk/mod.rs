//! Chunk streaming system for heightmap voxel terrain.
//!
//! This module provides:
//! - [`ChunkCoord`] / [`SegmentCoord`] / [`ChunkKey`]: explicit chunk-space and world-space addressing
//! - [`Chunk`] / [`ChunkSegment`]: terrain columns and their 16³ slices
//! - [`PriorityQueue`]: keyed min-heap ordering pending work by distance
//! - [`StatePartition`]: the four disjoint lifecycle maps
//! - [`GenerationPool`]: bounded background synthesis
//! - [`ChunkManager`]: central orchestrator for all of the above
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        ChunkManager                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ChunkRegistry                - Every live chunk                │
//! │  StatePartition               - toGenerate/busy/done/toRemove   │
//! │  PriorityQueue<ChunkKey>      - Nearest-first scheduling        │
//! │  OffsetTable × 2              - Near and far footprints         │
//! │  GenerationPool               - Worker threads                  │
//! │  ChunkVisuals                 - Rendering backend               │
//! └─────────────────────────────────────────────────────────────────┘
//!          ▲                                   │
//!          │ BorderCrossed                     │ GenerationJob
//!   ┌──────────────┐                   ┌──────────────────┐
//!   │ReferencePoint│                   │  worker threads  │
//!   └──────────────┘                   └──────────────────┘
//! ```
//!
//! # State Machine
//!
//! ```text
//!              GeneratePass              dispatch            completion
//! (absent) ───────────────▶ ToGenerate ─────────▶ Busy ─────────────▶ Done
//!                              ▲  │                 │                  │
//!                   rescue     │  │ RemovePass      │ out of range     │ RemovePass
//!                              │  ▼                 ▼                  ▼
//!                           ┌─────────────────────────────────────────────┐
//!                           │                  ToRemove                   │
//!                           └─────────────────────────────────────────────┘
//!                              │           (rescue back to Done when generated)
//!                              ▼
//!                          destroyed by the periodic removal pass
//! ```
//!
//! Chunks are created within the near radius, kept alive out to the far
//! radius, and only scheduled for destruction beyond it.
//!
//! # Usage
//!
//! ```
//! use std::time::Duration;
//! use glam::Vec3;
//! use terrain_streamer::chunk::{ChunkManager, ReferencePoint};
//! use terrain_streamer::{NoiseConfig, StreamConfig};
//!
//! let config = StreamConfig {
//!     noise: NoiseConfig::seeded(42),
//!     ..StreamConfig::compact()
//! };
//! let mut manager = ChunkManager::headless(config).unwrap();
//! let mut reference = ReferencePoint::new(manager.config().border_threshold);
//! manager.listen(&mut reference);
//!
//! reference.move_to(Vec3::new(8.0, 0.0, 8.0));
//! let stats = manager.update(reference.position(), Duration::from_millis(16)).unwrap();
//!
//! assert!(stats.ran_cycle());
//! assert!(manager.debug_info().registry_chunks > 0);
//! ```

pub mod coord;
pub mod queue;
pub mod offsets;
pub mod segment;
pub mod chunk;
pub mod registry;
pub mod state;
pub mod visuals;
pub mod reference;
pub mod worker;
pub mod stats;
pub mod manager;

// Re-export primary types
pub use coord::{to_chunk, to_world, ChunkCoord, ChunkKey, CoordinateSpace, SegmentCoord};
pub use queue::PriorityQueue;
pub use offsets::OffsetTable;
pub use segment::ChunkSegment;
pub use chunk::Chunk;
pub use registry::{ChunkRegistry, SharedChunk};
pub use state::{ChunkState, StateMap, StatePartition};
pub use visuals::{ChunkVisuals, NullVisuals, VisualHandle};
pub use reference::{BorderCrossed, ReferencePoint};
pub use worker::{GenerationPool, GenerationResult};
pub use stats::{CycleStats, DebugInfo, GenerationStats, RemovalStats, TickStats};
pub use manager::ChunkManager;
