//! Bounded background pool for terrain synthesis.
//!
//! ```text
//!   owner thread                          worker threads
//!  ┌──────────────┐   GenerationJob    ┌──────────────────┐
//!  │ ChunkManager │ ─────────────────▶ │ generate_terrain │ × worker_count
//!  │              │ ◀───────────────── │  (catch_unwind)  │
//!  └──────────────┘  GenerationResult  └──────────────────┘
//! ```
//!
//! The owner dispatches at most `worker_count` jobs at a time and drains the
//! result channel once per tick. Workers never touch manager state; they only
//! lock the chunk they were handed.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::error::{Result, StreamError};
use crate::mesh::IsosurfaceExtractor;
use crate::noise::NoiseGenerator;

use super::coord::{ChunkKey, CoordinateSpace};
use super::registry::SharedChunk;

struct GenerationJob {
    key: ChunkKey,
    chunk: SharedChunk,
}

/// Outcome of one synthesis task.
#[derive(Debug)]
pub struct GenerationResult {
    pub key: ChunkKey,
    pub outcome: Result<()>,
}

/// Fixed set of worker threads fed through a job channel.
pub struct GenerationPool {
    job_sender: Option<Sender<GenerationJob>>,
    result_receiver: Receiver<GenerationResult>,
    workers: Vec<JoinHandle<()>>,
    in_flight: usize,
}

impl GenerationPool {
    /// Spawn `worker_count` workers sharing one noise field and extractor.
    pub fn new(
        worker_count: usize,
        noise: Arc<NoiseGenerator>,
        extractor: Arc<dyn IsosurfaceExtractor>,
    ) -> Result<Self> {
        let (job_sender, job_receiver) = crossbeam_channel::unbounded::<GenerationJob>();
        let (result_sender, result_receiver) = crossbeam_channel::unbounded();

        let mut workers = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let jobs = job_receiver.clone();
            let results = result_sender.clone();
            let noise = Arc::clone(&noise);
            let extractor = Arc::clone(&extractor);

            let handle = std::thread::Builder::new()
                .name(format!("terrain-gen-{index}"))
                .spawn(move || run_worker(jobs, results, noise, extractor))
                .map_err(StreamError::WorkerSpawn)?;
            workers.push(handle);
        }

        log::info!("started {} terrain generation workers", worker_count);

        Ok(Self {
            job_sender: Some(job_sender),
            result_receiver,
            workers,
            in_flight: 0,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Tasks dispatched and not yet collected.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn has_capacity(&self) -> bool {
        self.in_flight < self.workers.len()
    }

    /// Queue a chunk for synthesis.
    pub fn dispatch(&mut self, key: ChunkKey, chunk: SharedChunk) -> Result<()> {
        let sender = self.job_sender.as_ref().ok_or(StreamError::WorkerPoolClosed)?;
        sender
            .send(GenerationJob { key, chunk })
            .map_err(|_| StreamError::WorkerPoolClosed)?;
        self.in_flight += 1;
        Ok(())
    }

    /// Next finished task without blocking.
    pub fn try_collect(&mut self) -> Option<GenerationResult> {
        match self.result_receiver.try_recv() {
            Ok(result) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(result)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Next finished task, waiting up to `timeout`.
    pub fn collect_timeout(&mut self, timeout: Duration) -> Option<GenerationResult> {
        match self.result_receiver.recv_timeout(timeout) {
            Ok(result) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(result)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for GenerationPool {
    fn drop(&mut self) {
        // Closing the job channel ends every worker loop
        self.job_sender.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("terrain generation worker exited abnormally");
            }
        }
        log::info!("terrain generation workers stopped");
    }
}

fn run_worker(
    jobs: Receiver<GenerationJob>,
    results: Sender<GenerationResult>,
    noise: Arc<NoiseGenerator>,
    extractor: Arc<dyn IsosurfaceExtractor>,
) {
    for job in jobs.iter() {
        let coord = job.key.coord();
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
            job.chunk.lock().generate_terrain(&noise, extractor.as_ref())
        }));

        let outcome = match attempt {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(err.to_string()),
            Err(payload) => Err(format!("worker panicked: {}", panic_message(payload.as_ref()))),
        }
        .map_err(|reason| StreamError::Generation {
            x: coord.x(CoordinateSpace::Chunk),
            z: coord.z(CoordinateSpace::Chunk),
            reason,
        });

        if results.send(GenerationResult { key: job.key, outcome }).is_err() {
            break;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
