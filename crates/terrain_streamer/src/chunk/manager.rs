//! ChunkManager - streams chunk columns around a moving reference point.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use glam::Vec3;

use crate::config::StreamConfig;
use crate::error::{Result, StreamError};
use crate::mesh::{EdgeMidpointExtractor, IsosurfaceExtractor};
use crate::noise::NoiseGenerator;

use super::coord::{ChunkCoord, ChunkKey, CoordinateSpace};
use super::offsets::OffsetTable;
use super::queue::PriorityQueue;
use super::reference::{BorderCrossed, ReferencePoint};
use super::registry::{ChunkRegistry, SharedChunk};
use super::state::{ChunkState, StateMap, StatePartition};
use super::stats::{CycleStats, DebugInfo, GenerationStats, RemovalStats, TickStats};
use super::visuals::{ChunkVisuals, NullVisuals};
use super::worker::{GenerationPool, GenerationResult};

/// Owner of every chunk and of the scheduling that creates and destroys them.
///
/// Handles:
/// - Lazily created chunk registry
/// - Four-way state partition (to-generate, busy, done, to-remove)
/// - Nearest-first generation queue
/// - Bounded background synthesis
/// - Batched, periodic destruction
///
/// All methods must be called from the owning thread.
pub struct ChunkManager<V: ChunkVisuals = NullVisuals> {
    config: StreamConfig,
    registry: ChunkRegistry,
    states: StatePartition,
    queue: PriorityQueue<ChunkKey>,
    near_offsets: OffsetTable,
    far_offsets: OffsetTable,
    pool: GenerationPool,
    noise: Arc<NoiseGenerator>,
    visuals: V,

    /// Border-cross listeners.
    signals: Vec<Receiver<BorderCrossed>>,
    cycle_pending: bool,
    since_cycle: Duration,
    removal_timer: Duration,
    last_origin: Option<ChunkCoord>,
}

impl ChunkManager<NullVisuals> {
    /// Manager without a rendering backend.
    pub fn headless(config: StreamConfig) -> Result<Self> {
        Self::with_visuals(config, NullVisuals::new())
    }
}

impl<V: ChunkVisuals> ChunkManager<V> {
    /// Manager using the bundled [`EdgeMidpointExtractor`].
    pub fn with_visuals(config: StreamConfig, visuals: V) -> Result<Self> {
        Self::with_extractor(config, visuals, Arc::new(EdgeMidpointExtractor))
    }

    /// Manager using a custom isosurface extractor.
    pub fn with_extractor(
        config: StreamConfig,
        visuals: V,
        extractor: Arc<dyn IsosurfaceExtractor>,
    ) -> Result<Self> {
        config.validate()?;

        let noise = Arc::new(NoiseGenerator::new(&config.noise)?);
        log::info!(
            "terrain streamer: near {} far {} eviction {} workers {} seed {}",
            config.near_radius,
            config.far_radius,
            config.effective_eviction_radius(),
            config.worker_count,
            noise.seed()
        );
        let pool = GenerationPool::new(config.worker_count, Arc::clone(&noise), extractor)?;

        Ok(Self {
            registry: ChunkRegistry::new(config.segment_count),
            states: StatePartition::new(),
            queue: PriorityQueue::new(config.queue_capacity),
            near_offsets: OffsetTable::new(config.near_radius),
            far_offsets: OffsetTable::new(config.far_radius),
            pool,
            noise,
            visuals,
            signals: Vec::new(),
            cycle_pending: false,
            // First signal runs a cycle without waiting
            since_cycle: config.generation_interval(),
            removal_timer: Duration::ZERO,
            last_origin: None,
            config,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn registry(&self) -> &ChunkRegistry {
        &self.registry
    }

    pub fn states(&self) -> &StatePartition {
        &self.states
    }

    pub fn queue(&self) -> &PriorityQueue<ChunkKey> {
        &self.queue
    }

    pub fn noise(&self) -> &NoiseGenerator {
        &self.noise
    }

    pub fn visuals(&self) -> &V {
        &self.visuals
    }

    pub fn visuals_mut(&mut self) -> &mut V {
        &mut self.visuals
    }

    /// Chunk registered under `key`, if any.
    pub fn chunk(&self, key: ChunkKey) -> Option<&SharedChunk> {
        self.registry.get(key)
    }

    /// Which state map tracks `key`.
    pub fn state_of(&self, key: ChunkKey) -> Option<ChunkState> {
        self.states.state_of(key)
    }

    pub fn last_origin(&self) -> Option<ChunkCoord> {
        self.last_origin
    }

    pub fn debug_info(&self) -> DebugInfo {
        DebugInfo {
            registry_chunks: self.registry.len(),
            to_generate: self.states.count(ChunkState::ToGenerate),
            busy: self.states.count(ChunkState::Busy),
            done: self.states.count(ChunkState::Done),
            to_remove: self.states.count(ChunkState::ToRemove),
            queue_len: self.queue.len(),
            in_flight: self.pool.in_flight(),
            last_origin: self.last_origin,
            cycle_pending: self.cycle_pending,
        }
    }

    // ========================================================================
    // Signals
    // ========================================================================

    /// Subscribe to a reference point's border-cross signal.
    pub fn listen(&mut self, reference: &mut ReferencePoint) {
        self.signals.push(reference.subscribe());
    }

    /// Subscribe to an arbitrary signal source.
    pub fn listen_on(&mut self, receiver: Receiver<BorderCrossed>) {
        self.signals.push(receiver);
    }

    /// Queue a cycle as if a border-cross signal had arrived.
    pub fn request_cycle(&mut self) {
        self.cycle_pending = true;
    }

    fn drain_signals(&mut self) {
        for receiver in &self.signals {
            while receiver.try_recv().is_ok() {
                self.cycle_pending = true;
            }
        }
    }

    // ========================================================================
    // Per-tick update
    // ========================================================================

    /// Advance the manager by one tick.
    ///
    /// `position` is the reference point's current world position and `dt`
    /// the time since the previous tick. Runs, in order: pending cycle (once
    /// the cycle interval has elapsed), periodic removal (once per removal
    /// interval), and background generation.
    pub fn update(&mut self, position: Vec3, dt: Duration) -> Result<TickStats> {
        let mut stats = TickStats::default();

        self.drain_signals();
        self.since_cycle += dt;
        if self.cycle_pending && self.since_cycle >= self.config.generation_interval() {
            let origin = ChunkCoord::from_world_pos(position.x, position.z);
            stats.cycle = Some(self.run_cycle(origin)?);
            self.cycle_pending = false;
            self.since_cycle = Duration::ZERO;
        }

        self.removal_timer += dt;
        let removal_interval = self.config.removal_interval();
        if self.removal_timer >= removal_interval {
            self.removal_timer -= removal_interval;
            stats.removal = Some(self.removal_pass());
        }

        stats.generation = self.process_generation()?;
        Ok(stats)
    }

    /// Run generate, remove and build passes around `origin`.
    pub fn run_cycle(&mut self, origin: ChunkCoord) -> Result<CycleStats> {
        let start = Instant::now();
        let mut stats = CycleStats {
            origin,
            ..Default::default()
        };

        self.generate_pass(origin, &mut stats);
        stats.demoted = self.remove_pass(origin)?;
        stats.queued = self.build_pass(origin)?;
        self.last_origin = Some(origin);

        stats.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        log::debug!(
            "cycle at ({}, {}): {} new, {} rescued, {} demoted, {} queued in {:.2}ms",
            origin.x(CoordinateSpace::Chunk),
            origin.z(CoordinateSpace::Chunk),
            stats.newly_pending,
            stats.rescued,
            stats.demoted,
            stats.queued,
            stats.elapsed_ms
        );
        Ok(stats)
    }

    // ========================================================================
    // Passes
    // ========================================================================

    /// Make sure every chunk within the near radius is tracked.
    ///
    /// Untracked chunks join the generation set; chunks awaiting removal are
    /// rescued to `done` or the generation set depending on whether they
    /// were generated. Non-busy chunks get their visual placeholders.
    pub fn generate_pass(&mut self, origin: ChunkCoord, stats: &mut CycleStats) {
        for coord in self.near_offsets.around(origin) {
            let (chunk, created) = self.registry.get_or_create(coord);
            let key = coord.key();
            if created {
                stats.chunks_created += 1;
            }

            match self.states.state_of(key) {
                // In-flight chunks are locked by a worker
                Some(ChunkState::Busy) => continue,
                Some(ChunkState::ToGenerate) | Some(ChunkState::Done) => {}
                Some(ChunkState::ToRemove) => {
                    let mut guard = chunk.lock();
                    let target = if guard.is_generated() {
                        // Completions that landed out of range were never shown
                        guard.apply_pending_meshes(&mut self.visuals);
                        ChunkState::Done
                    } else {
                        ChunkState::ToGenerate
                    };
                    drop(guard);
                    self.states.transition(key, ChunkState::ToRemove, target);
                    stats.rescued += 1;
                }
                None => {
                    self.states.insert(ChunkState::ToGenerate, key, Arc::clone(&chunk));
                    stats.newly_pending += 1;
                }
            }

            chunk.lock().instantiate(&mut self.visuals);
        }
    }

    /// Keep chunks within the far radius and demote the rest to removal.
    ///
    /// Busy chunks are never touched. Returns the number of demoted chunks.
    /// Fails with [`StreamError::UntrackedChunk`] if a registered chunk inside
    /// the far radius is tracked by no state map; no state is moved in that case.
    pub fn remove_pass(&mut self, origin: ChunkCoord) -> Result<usize> {
        let mut tracked = Vec::new();
        for coord in self.far_offsets.around(origin) {
            let key = coord.key();
            if !self.registry.contains(key) {
                continue;
            }
            match self.states.state_of(key) {
                Some(state) => tracked.push((key, state)),
                None => {
                    return Err(StreamError::UntrackedChunk {
                        x: coord.x(CoordinateSpace::Chunk),
                        z: coord.z(CoordinateSpace::Chunk),
                    });
                }
            }
        }

        let mut keep_generate = StateMap::new();
        let mut keep_done = StateMap::new();
        for (key, state) in tracked {
            match state {
                ChunkState::Busy => {}
                ChunkState::ToGenerate => {
                    if let Some(chunk) = self.states.take(ChunkState::ToGenerate, key) {
                        keep_generate.insert(key, chunk);
                    }
                }
                ChunkState::Done => {
                    if let Some(chunk) = self.states.take(ChunkState::Done, key) {
                        keep_done.insert(key, chunk);
                    }
                }
                ChunkState::ToRemove => {
                    if let Some(chunk) = self.states.take(ChunkState::ToRemove, key) {
                        let mut guard = chunk.lock();
                        let generated = guard.is_generated();
                        if generated {
                            guard.apply_pending_meshes(&mut self.visuals);
                        }
                        drop(guard);
                        if generated {
                            keep_done.insert(key, chunk);
                        } else {
                            keep_generate.insert(key, chunk);
                        }
                    }
                }
            }
        }

        let stale_generate = self.states.replace(ChunkState::ToGenerate, keep_generate);
        let stale_done = self.states.replace(ChunkState::Done, keep_done);

        let mut demoted = 0;
        for (key, chunk) in stale_generate.into_iter().chain(stale_done) {
            if self.states.insert(ChunkState::ToRemove, key, chunk) {
                demoted += 1;
            }
        }
        Ok(demoted)
    }

    /// Rebuild the queue from the generation set, nearest first.
    ///
    /// Returns the queue length.
    pub fn build_pass(&mut self, origin: ChunkCoord) -> Result<usize> {
        self.queue.clear();
        for key in self.states.map(ChunkState::ToGenerate).keys() {
            let priority = key.coord().distance_squared(origin);
            self.queue.enqueue(*key, priority)?;
        }
        Ok(self.queue.len())
    }

    /// Destroy up to `removal_batch` chunks from the removal set.
    pub fn removal_pass(&mut self) -> RemovalStats {
        let batch: Vec<ChunkKey> = self
            .states
            .map(ChunkState::ToRemove)
            .keys()
            .take(self.config.removal_batch)
            .copied()
            .collect();

        for key in &batch {
            let chunk = self.states.take(ChunkState::ToRemove, *key);
            self.registry.remove(*key);
            if self.queue.remove(key).is_ok() {
                log::debug!("dropped queued entry for removed chunk {:?}", key.coord());
            }
            if let Some(chunk) = chunk {
                chunk.lock().destroy(&mut self.visuals);
            }
        }

        let stats = RemovalStats {
            destroyed: batch.len(),
            remaining: self.states.count(ChunkState::ToRemove),
        };
        if stats.destroyed > 0 {
            log::debug!(
                "removed {} chunks, {} remaining",
                stats.destroyed,
                stats.remaining
            );
        }
        stats
    }

    // ========================================================================
    // Background generation
    // ========================================================================

    /// Collect finished tasks, then dispatch queued chunks while workers are free.
    pub fn process_generation(&mut self) -> Result<GenerationStats> {
        let mut stats = GenerationStats::default();

        while let Some(result) = self.pool.try_collect() {
            self.complete(result, &mut stats);
        }

        while self.pool.has_capacity() {
            let Some((key, _)) = self.queue.dequeue() else {
                break;
            };
            // Entries can outlive their chunk's membership between cycles
            if !self.states.transition(key, ChunkState::ToGenerate, ChunkState::Busy) {
                continue;
            }
            let Some(chunk) = self.states.get(ChunkState::Busy, key).cloned() else {
                continue;
            };
            chunk.lock().mark_generating();

            if let Err(err) = self.pool.dispatch(key, chunk) {
                self.states.transition(key, ChunkState::Busy, ChunkState::ToGenerate);
                return Err(err);
            }
            stats.dispatched += 1;
        }

        Ok(stats)
    }

    /// Wait up to `timeout` for one task and handle it. Returns `None` on timeout.
    pub fn wait_for_completion(&mut self, timeout: Duration) -> Option<GenerationStats> {
        let result = self.pool.collect_timeout(timeout)?;
        let mut stats = GenerationStats::default();
        self.complete(result, &mut stats);
        Some(stats)
    }

    fn complete(&mut self, result: GenerationResult, stats: &mut GenerationStats) {
        let key = result.key;
        let Some(chunk) = self.states.get(ChunkState::Busy, key).cloned() else {
            log::warn!("dropping generation result for untracked chunk {:?}", key.coord());
            stats.dropped_results += 1;
            return;
        };

        match result.outcome {
            Ok(()) => {
                stats.completed += 1;
                if self.out_of_range(key) {
                    self.states.transition(key, ChunkState::Busy, ChunkState::ToRemove);
                    stats.evicted_on_completion += 1;
                } else {
                    self.states.transition(key, ChunkState::Busy, ChunkState::Done);
                    stats.meshes_applied += chunk.lock().apply_meshes(&mut self.visuals);
                }
            }
            Err(err) => {
                stats.failures += 1;
                log::error!("{}", err);

                let attempts = chunk.lock().record_failure();
                if attempts >= self.config.max_generation_attempts {
                    log::warn!(
                        "giving up on chunk {:?} after {} failed attempts",
                        key.coord(),
                        attempts
                    );
                    self.states.transition(key, ChunkState::Busy, ChunkState::ToRemove);
                    stats.abandoned += 1;
                } else {
                    self.states.transition(key, ChunkState::Busy, ChunkState::ToGenerate);
                    let origin = self.last_origin.unwrap_or(ChunkCoord::ZERO);
                    let priority = key.coord().distance_squared(origin);
                    if let Err(err) = self.queue.enqueue(key, priority) {
                        // Picked up again by the next build pass
                        log::warn!("could not requeue chunk {:?}: {}", key.coord(), err);
                    }
                }
            }
        }
    }

    /// Beyond the eviction radius of the last cycle origin.
    fn out_of_range(&self, key: ChunkKey) -> bool {
        let Some(origin) = self.last_origin else {
            return false;
        };
        let radius = self.config.effective_eviction_radius() as i64;
        key.coord().distance_squared(origin) > radius * radius
    }
}
