//! Seedable layered coherent noise for heightmap sampling.

use ::noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::NoiseConfig;
use crate::error::Result;

/// Half-width of the range the sampling origin is drawn from.
const ORIGIN_RANGE: f64 = 100_000.0;

/// Deterministic fractal noise sampler.
///
/// The seed fixes both the Perlin permutation table and a sampling origin, so
/// two generators built from the same [`NoiseConfig`] produce bit-identical
/// fields.
///
/// # Example
/// ```
/// use terrain_streamer::{NoiseConfig, NoiseGenerator};
///
/// let a = NoiseGenerator::new(&NoiseConfig::seeded(7)).unwrap();
/// let b = NoiseGenerator::new(&NoiseConfig::seeded(7)).unwrap();
/// assert_eq!(a.generate(12.0, -40.0), b.generate(12.0, -40.0));
/// ```
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    perlin: Perlin,
    origin: [f64; 2],
    seed: u64,
    scale: f64,
    octaves: u32,
    lacunarity: f64,
    persistence: f64,
}

impl NoiseGenerator {
    /// Build a generator, drawing a random seed when the config has none.
    pub fn new(config: &NoiseConfig) -> Result<Self> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let origin = [
            rng.gen_range(-ORIGIN_RANGE..ORIGIN_RANGE),
            rng.gen_range(-ORIGIN_RANGE..ORIGIN_RANGE),
        ];
        let perlin = Perlin::new(rng.gen());

        Ok(Self {
            perlin,
            origin,
            seed,
            scale: config.scale,
            octaves: config.octaves,
            lacunarity: config.lacunarity,
            persistence: config.persistence,
        })
    }

    /// Seed actually in use (the drawn one for unseeded configs).
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Sampling origin derived from the seed.
    pub fn origin(&self) -> [f64; 2] {
        self.origin
    }

    /// Sample the field at world position (x, y). Result lies in [0, 1].
    pub fn generate(&self, x: f64, y: f64) -> f64 {
        let base_x = (self.origin[0] + x) / self.scale;
        let base_y = (self.origin[1] + y) / self.scale;

        let mut frequency = 1.0;
        let mut amplitude = 1.0;
        let mut total = 0.0;

        for _ in 0..self.octaves {
            let raw = self.perlin.get([base_x * frequency, base_y * frequency]);
            // Perlin output is nominally [-1, 1]
            let sample = ((raw + 1.0) * 0.5).clamp(0.0, 1.0);
            total += sample * amplitude;
            frequency *= self.lacunarity;
            amplitude *= self.persistence;
        }

        (total / self.octaves as f64).clamp(0.0, 1.0)
    }
}
