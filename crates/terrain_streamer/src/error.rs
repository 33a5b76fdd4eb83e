//! Error type shared by every module of the crate.

use thiserror::Error;

/// Errors raised by the terrain streamer.
///
/// Apart from [`StreamError::Generation`], every variant signals a caller or
/// programming error and is returned at the point of violation.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("priority queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("priority must be non-negative, got {0}")]
    NegativePriority(i64),

    #[error("item is already queued")]
    DuplicateQueueEntry,

    #[error("item is not tracked by the queue (already removed or dequeued)")]
    StaleQueueEntry,

    #[error("voxel corner must be within 0..=7, got {0}")]
    CornerOutOfRange(i32),

    #[error("voxel edge must be within 0..=11, got {0}")]
    EdgeOutOfRange(i32),

    #[error("voxel grid holds {actual} cells but its dimensions require {expected}")]
    GridSize { expected: usize, actual: usize },

    #[error("{0} has not been generated yet")]
    MissingData(&'static str),

    #[error("chunk ({x}, {z}) is registered but not tracked by any state map")]
    UntrackedChunk { x: i32, z: i32 },

    #[error("terrain generation failed for chunk ({x}, {z}): {reason}")]
    Generation { x: i32, z: i32, reason: String },

    #[error("generation workers have shut down")]
    WorkerPoolClosed,

    #[error("failed to spawn generation worker: {0}")]
    WorkerSpawn(std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StreamError>;
