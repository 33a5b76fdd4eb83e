//! Lifecycle state of a chunk column and the four-way state partition.

use std::collections::HashMap;

use super::coord::ChunkKey;
use super::registry::SharedChunk;

/// Which manager map currently tracks a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// Waiting in the generation queue.
    ToGenerate,
    /// A worker is synthesizing terrain.
    Busy,
    /// Generated and idle.
    Done,
    /// Scheduled for destruction.
    ToRemove,
}

impl ChunkState {
    pub const ALL: [ChunkState; 4] = [
        ChunkState::ToGenerate,
        ChunkState::Busy,
        ChunkState::Done,
        ChunkState::ToRemove,
    ];

    pub fn is_live(&self) -> bool {
        !matches!(self, ChunkState::ToRemove)
    }
}

pub type StateMap = HashMap<ChunkKey, SharedChunk>;

/// Four disjoint key → chunk maps.
///
/// Every mutation goes through methods that keep a key in at most one map.
#[derive(Debug, Default)]
pub struct StatePartition {
    to_generate: StateMap,
    busy: StateMap,
    done: StateMap,
    to_remove: StateMap,
}

impl StatePartition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(&self, state: ChunkState) -> &StateMap {
        match state {
            ChunkState::ToGenerate => &self.to_generate,
            ChunkState::Busy => &self.busy,
            ChunkState::Done => &self.done,
            ChunkState::ToRemove => &self.to_remove,
        }
    }

    fn map_mut(&mut self, state: ChunkState) -> &mut StateMap {
        match state {
            ChunkState::ToGenerate => &mut self.to_generate,
            ChunkState::Busy => &mut self.busy,
            ChunkState::Done => &mut self.done,
            ChunkState::ToRemove => &mut self.to_remove,
        }
    }

    /// State currently tracking `key`, if any.
    pub fn state_of(&self, key: ChunkKey) -> Option<ChunkState> {
        ChunkState::ALL
            .into_iter()
            .find(|&state| self.map(state).contains_key(&key))
    }

    pub fn contains(&self, state: ChunkState, key: ChunkKey) -> bool {
        self.map(state).contains_key(&key)
    }

    pub fn get(&self, state: ChunkState, key: ChunkKey) -> Option<&SharedChunk> {
        self.map(state).get(&key)
    }

    /// Track an untracked key. Returns false, leaving the partition unchanged,
    /// when the key is already tracked.
    pub fn insert(&mut self, state: ChunkState, key: ChunkKey, chunk: SharedChunk) -> bool {
        if self.state_of(key).is_some() {
            return false;
        }
        self.map_mut(state).insert(key, chunk);
        true
    }

    pub fn take(&mut self, state: ChunkState, key: ChunkKey) -> Option<SharedChunk> {
        self.map_mut(state).remove(&key)
    }

    /// Move `key` from one map to another. Returns false if it was not in `from`.
    pub fn transition(&mut self, key: ChunkKey, from: ChunkState, to: ChunkState) -> bool {
        match self.take(from, key) {
            Some(chunk) => {
                self.map_mut(to).insert(key, chunk);
                true
            }
            None => false,
        }
    }

    /// Swap in a new map for `state`, returning the old one.
    ///
    /// The caller is responsible for keeping the new map disjoint from the
    /// other three.
    pub(crate) fn replace(&mut self, state: ChunkState, map: StateMap) -> StateMap {
        std::mem::replace(self.map_mut(state), map)
    }

    pub fn count(&self, state: ChunkState) -> usize {
        self.map(state).len()
    }

    /// Keys tracked by any map.
    pub fn total(&self) -> usize {
        ChunkState::ALL.iter().map(|&state| self.count(state)).sum()
    }

    /// True when no key appears in more than one map.
    pub fn is_disjoint(&self) -> bool {
        let mut seen = std::collections::HashSet::with_capacity(self.total());
        ChunkState::ALL
            .iter()
            .flat_map(|&state| self.map(state).keys())
            .all(|key| seen.insert(*key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::chunk::Chunk;
    use crate::chunk::coord::ChunkCoord;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn shared(x: i32, z: i32) -> (ChunkKey, SharedChunk) {
        let coord = ChunkCoord::new(x, z);
        (coord.key(), Arc::new(Mutex::new(Chunk::new(coord, 1))))
    }

    #[test]
    fn insert_refuses_tracked_key() {
        let mut partition = StatePartition::new();
        let (key, chunk) = shared(0, 0);
        assert!(partition.insert(ChunkState::ToGenerate, key, chunk.clone()));
        assert!(!partition.insert(ChunkState::Done, key, chunk));
        assert_eq!(partition.state_of(key), Some(ChunkState::ToGenerate));
        assert_eq!(partition.total(), 1);
    }

    #[test]
    fn transition_moves_between_maps() {
        let mut partition = StatePartition::new();
        let (key, chunk) = shared(1, 2);
        partition.insert(ChunkState::ToGenerate, key, chunk);

        assert!(partition.transition(key, ChunkState::ToGenerate, ChunkState::Busy));
        assert_eq!(partition.state_of(key), Some(ChunkState::Busy));
        assert!(!partition.contains(ChunkState::ToGenerate, key));

        // Wrong source state is a no-op
        assert!(!partition.transition(key, ChunkState::Done, ChunkState::ToRemove));
        assert_eq!(partition.state_of(key), Some(ChunkState::Busy));
        assert!(partition.is_disjoint());
    }

    #[test]
    fn replace_swaps_whole_map() {
        let mut partition = StatePartition::new();
        let (a, chunk_a) = shared(0, 1);
        let (b, chunk_b) = shared(0, 2);
        partition.insert(ChunkState::Done, a, chunk_a);

        let mut staged = StateMap::new();
        staged.insert(b, chunk_b);
        let old = partition.replace(ChunkState::Done, staged);

        assert!(old.contains_key(&a));
        assert_eq!(partition.state_of(a), None);
        assert_eq!(partition.state_of(b), Some(ChunkState::Done));
    }

    #[test]
    fn live_states() {
        assert!(ChunkState::Busy.is_live());
        assert!(!ChunkState::ToRemove.is_live());
    }
}
