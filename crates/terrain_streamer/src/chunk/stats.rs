//! Statistics structs for streaming operations.

use super::coord::ChunkCoord;

/// Result of one generate/remove/build cycle.
#[derive(Clone, Debug, Default)]
pub struct CycleStats {
    /// Reference chunk the cycle was centred on.
    pub origin: ChunkCoord,
    /// Chunks created in the registry by the generate pass.
    pub chunks_created: usize,
    /// Fresh chunks added to the generation set.
    pub newly_pending: usize,
    /// Chunks pulled back out of the removal set.
    pub rescued: usize,
    /// Chunks demoted to the removal set by the remove pass.
    pub demoted: usize,
    /// Queue length after the build pass.
    pub queued: usize,
    /// Wall time spent in the cycle (milliseconds).
    pub elapsed_ms: f64,
}

/// Background generation activity during one tick.
#[derive(Clone, Debug, Default)]
pub struct GenerationStats {
    /// Tasks handed to workers.
    pub dispatched: usize,
    /// Tasks that finished successfully.
    pub completed: usize,
    /// Tasks that returned an error or panicked.
    pub failures: usize,
    /// Chunks given up on after repeated failures.
    pub abandoned: usize,
    /// Successful chunks sent straight to removal because they finished out of range.
    pub evicted_on_completion: usize,
    /// Results for chunks no longer tracked as busy.
    pub dropped_results: usize,
    /// Segment meshes handed to the visuals backend.
    pub meshes_applied: usize,
}

/// One periodic removal batch.
#[derive(Clone, Debug, Default)]
pub struct RemovalStats {
    /// Chunks destroyed this batch.
    pub destroyed: usize,
    /// Chunks still awaiting removal.
    pub remaining: usize,
}

/// Everything that happened during one `update` call.
#[derive(Clone, Debug, Default)]
pub struct TickStats {
    /// Present when a cycle ran this tick.
    pub cycle: Option<CycleStats>,
    /// Present when the removal timer fired this tick.
    pub removal: Option<RemovalStats>,
    pub generation: GenerationStats,
}

impl TickStats {
    /// Failed generation tasks observed this tick.
    pub fn failures(&self) -> usize {
        self.generation.failures
    }

    pub fn ran_cycle(&self) -> bool {
        self.cycle.is_some()
    }

    pub fn destroyed(&self) -> usize {
        self.removal.as_ref().map_or(0, |r| r.destroyed)
    }
}

/// Snapshot of the manager's bookkeeping.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DebugInfo {
    /// Chunks in the registry.
    pub registry_chunks: usize,
    pub to_generate: usize,
    pub busy: usize,
    pub done: usize,
    pub to_remove: usize,
    /// Pending entries in the generation queue.
    pub queue_len: usize,
    /// Tasks dispatched and not yet collected.
    pub in_flight: usize,
    /// Origin of the most recent cycle.
    pub last_origin: Option<ChunkCoord>,
    /// A border-cross signal is waiting for the cycle interval.
    pub cycle_pending: bool,
}

impl DebugInfo {
    /// Chunks tracked by any state map.
    pub fn tracked(&self) -> usize {
        self.to_generate + self.busy + self.done + self.to_remove
    }

    /// No pending or in-flight generation work.
    pub fn is_idle(&self) -> bool {
        self.to_generate == 0 && self.busy == 0 && self.in_flight == 0 && !self.cycle_pending
    }
}
