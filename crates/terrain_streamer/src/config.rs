//! Streaming and terrain-generation configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chunk::offsets::OffsetTable;
use crate::core::DEFAULT_SEGMENT_COUNT;
use crate::error::{Result, StreamError};

/// Layered-noise parameters for the heightmap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// World units per noise period at the first octave.
    pub scale: f64,
    /// Seed; `None` draws a fresh seed from the OS each time a generator is built.
    pub seed: Option<u64>,
    /// Number of summed noise layers.
    pub octaves: u32,
    /// Frequency multiplier between octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between octaves.
    pub persistence: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            scale: 120.0,
            seed: None,
            octaves: 3,
            lacunarity: 2.0,
            persistence: 0.5,
        }
    }
}

impl NoiseConfig {
    /// Same parameters with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(invalid("noise.scale must be finite and > 0"));
        }
        if self.octaves == 0 {
            return Err(invalid("noise.octaves must be >= 1"));
        }
        if !self.lacunarity.is_finite() || !self.persistence.is_finite() {
            return Err(invalid("noise.lacunarity and noise.persistence must be finite"));
        }
        Ok(())
    }
}

/// Configuration for [`ChunkManager`](crate::chunk::ChunkManager).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Chunks within this radius (chunk space) are generated.
    pub near_radius: u32,
    /// Chunks within this radius are kept alive once created.
    pub far_radius: u32,
    /// Chunks finishing generation beyond this radius are evicted immediately.
    /// Defaults to `far_radius`.
    pub eviction_radius: Option<u32>,
    /// Chunk-space distance the reference point must move on either axis
    /// before a new generation cycle is signalled.
    pub border_threshold: u32,
    /// Vertical segments per chunk.
    pub segment_count: usize,
    /// Background generation workers (and maximum tasks in flight).
    pub worker_count: usize,
    /// Maximum number of pending chunks in the generation queue.
    pub queue_capacity: usize,
    /// Minimum time between two generation cycles.
    pub generation_interval_secs: f64,
    /// Period of the removal pass.
    pub removal_interval_secs: f64,
    /// Maximum chunks destroyed per removal pass.
    pub removal_batch: usize,
    /// Failed generation attempts before a chunk is given up on.
    pub max_generation_attempts: u32,
    /// Heightmap noise.
    pub noise: NoiseConfig,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            near_radius: 8,
            far_radius: 12,
            eviction_radius: None,
            border_threshold: 2,
            segment_count: DEFAULT_SEGMENT_COUNT,
            worker_count: 4,
            queue_capacity: 1000,
            generation_interval_secs: 0.1,
            removal_interval_secs: 0.25,
            removal_batch: 16,
            max_generation_attempts: 3,
            noise: NoiseConfig::default(),
        }
    }
}

impl StreamConfig {
    /// Small footprint with a single worker, for tests and low-end systems.
    pub fn compact() -> Self {
        Self {
            near_radius: 3,
            far_radius: 5,
            worker_count: 1,
            queue_capacity: 128,
            ..Self::default()
        }
    }

    /// Large footprint for high-end systems.
    pub fn wide() -> Self {
        Self {
            near_radius: 16,
            far_radius: 22,
            worker_count: 8,
            queue_capacity: 2048,
            removal_batch: 32,
            ..Self::default()
        }
    }

    /// Parse a TOML document and validate it.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: StreamConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Radius used to evict chunks that finish generation out of range.
    pub fn effective_eviction_radius(&self) -> u32 {
        self.eviction_radius.unwrap_or(self.far_radius)
    }

    pub fn generation_interval(&self) -> Duration {
        Duration::from_secs_f64(self.generation_interval_secs)
    }

    pub fn removal_interval(&self) -> Duration {
        Duration::from_secs_f64(self.removal_interval_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.near_radius == 0 {
            return Err(invalid("near_radius must be >= 1"));
        }
        if self.far_radius <= self.near_radius {
            return Err(invalid("far_radius must be greater than near_radius"));
        }
        if self.effective_eviction_radius() < self.far_radius {
            return Err(invalid("eviction_radius must be >= far_radius"));
        }
        if self.border_threshold == 0 {
            return Err(invalid("border_threshold must be >= 1"));
        }
        if self.segment_count == 0 {
            return Err(invalid("segment_count must be >= 1"));
        }
        if self.worker_count == 0 {
            return Err(invalid("worker_count must be >= 1"));
        }
        if self.removal_batch == 0 {
            return Err(invalid("removal_batch must be >= 1"));
        }
        if self.max_generation_attempts == 0 {
            return Err(invalid("max_generation_attempts must be >= 1"));
        }
        for (name, secs) in [
            ("generation_interval_secs", self.generation_interval_secs),
            ("removal_interval_secs", self.removal_interval_secs),
        ] {
            if !secs.is_finite() || secs < 0.0 {
                return Err(StreamError::InvalidConfig(format!(
                    "{name} must be finite and >= 0 (got {secs})"
                )));
            }
        }
        // Pending chunks are kept out to the far radius
        let far_cells = OffsetTable::count_within(self.far_radius);
        if self.queue_capacity < far_cells {
            return Err(StreamError::InvalidConfig(format!(
                "queue_capacity {} cannot hold the {} chunks within far_radius {}",
                self.queue_capacity, far_cells, self.far_radius
            )));
        }
        self.noise.validate()
    }
}

fn invalid(message: &str) -> StreamError {
    StreamError::InvalidConfig(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = StreamConfig::default();
        config.validate().unwrap();
        assert_eq!(config.border_threshold, 2);
        assert_eq!(config.removal_batch, 16);
        assert_eq!(config.segment_count, 4);
        assert_eq!(config.effective_eviction_radius(), config.far_radius);
    }

    #[test]
    fn presets_are_valid_and_differ() {
        let compact = StreamConfig::compact();
        let wide = StreamConfig::wide();
        compact.validate().unwrap();
        wide.validate().unwrap();
        assert!(wide.near_radius > compact.near_radius);
        assert!(wide.worker_count > compact.worker_count);
    }

    #[test]
    fn rejects_inverted_radii() {
        let config = StreamConfig {
            near_radius: 10,
            far_radius: 10,
            ..StreamConfig::default()
        };
        assert!(matches!(config.validate(), Err(StreamError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_eviction_inside_far() {
        let config = StreamConfig {
            eviction_radius: Some(4),
            ..StreamConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_small_queue() {
        let config = StreamConfig {
            queue_capacity: 10,
            ..StreamConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_noise() {
        let mut config = StreamConfig::default();
        config.noise.scale = 0.0;
        assert!(config.validate().is_err());

        let mut config = StreamConfig::default();
        config.noise.octaves = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_toml() {
        let config = StreamConfig::from_toml_str(
            r#"
            near_radius = 4
            far_radius = 6
            worker_count = 2

            [noise]
            seed = 10000
            octaves = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.near_radius, 4);
        assert_eq!(config.far_radius, 6);
        assert_eq!(config.worker_count, 2);
        assert_eq!(config.noise.seed, Some(10000));
        assert_eq!(config.noise.octaves, 4);
        // Unspecified fields keep their defaults
        assert_eq!(config.removal_batch, 16);
        assert_eq!(config.noise.lacunarity, 2.0);
    }

    #[test]
    fn toml_validation_errors_surface() {
        let err = StreamConfig::from_toml_str("near_radius = 0").unwrap_err();
        assert!(matches!(err, StreamError::InvalidConfig(_)));

        let err = StreamConfig::from_toml_str("near_radius = \"far\"").unwrap_err();
        assert!(matches!(err, StreamError::ConfigParse(_)));
    }

    #[test]
    fn intervals_convert_to_durations() {
        let config = StreamConfig::default();
        assert_eq!(config.removal_interval(), Duration::from_millis(250));
        assert_eq!(config.generation_interval(), Duration::from_millis(100));
    }
}
