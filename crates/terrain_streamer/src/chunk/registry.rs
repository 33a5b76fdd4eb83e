//! Manager-owned registry of every live chunk.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::chunk::Chunk;
use super::coord::{ChunkCoord, ChunkKey};

/// Chunk shared between the registry, one state map, and at most one worker.
pub type SharedChunk = Arc<Mutex<Chunk>>;

/// All chunks created and not yet destroyed, indexed by key.
///
/// Chunks are created lazily on first lookup and leave the registry only when
/// the manager destroys them.
#[derive(Debug)]
pub struct ChunkRegistry {
    chunks: HashMap<ChunkKey, SharedChunk>,
    segment_count: usize,
}

impl ChunkRegistry {
    pub fn new(segment_count: usize) -> Self {
        Self {
            chunks: HashMap::new(),
            segment_count,
        }
    }

    /// Look up the chunk at `coord`, creating it if absent.
    ///
    /// The flag is true when the chunk was created by this call.
    pub fn get_or_create(&mut self, coord: ChunkCoord) -> (SharedChunk, bool) {
        let segment_count = self.segment_count;
        let mut created = false;
        let chunk = self
            .chunks
            .entry(coord.key())
            .or_insert_with(|| {
                created = true;
                Arc::new(Mutex::new(Chunk::new(coord, segment_count)))
            })
            .clone();
        (chunk, created)
    }

    pub fn get(&self, key: ChunkKey) -> Option<&SharedChunk> {
        self.chunks.get(&key)
    }

    pub fn contains(&self, key: ChunkKey) -> bool {
        self.chunks.contains_key(&key)
    }

    pub fn remove(&mut self, key: ChunkKey) -> Option<SharedChunk> {
        self.chunks.remove(&key)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = ChunkKey> + '_ {
        self.chunks.keys().copied()
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count
    }
}
