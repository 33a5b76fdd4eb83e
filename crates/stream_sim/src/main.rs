//! Headless fly-through: moves a reference point across the terrain and logs
//! what the chunk manager does.
//!
//! Usage: `stream_sim [config.toml] [ticks]`

use std::error::Error;
use std::thread;
use std::time::{Duration, Instant};

use glam::Vec3;
use terrain_streamer::chunk::{ChunkManager, ReferencePoint};
use terrain_streamer::StreamConfig;

const TICK: Duration = Duration::from_millis(16);
const DEFAULT_TICKS: u32 = 600;
/// World units travelled per second.
const SPEED: f32 = 48.0;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => {
            log::info!("loading config from {}", path);
            StreamConfig::load(&path)?
        }
        None => StreamConfig::default(),
    };
    let ticks = match args.next() {
        Some(raw) => raw.parse::<u32>()?,
        None => DEFAULT_TICKS,
    };

    let mut manager = ChunkManager::headless(config)?;
    let mut reference = ReferencePoint::new(manager.config().border_threshold);
    manager.listen(&mut reference);

    let start = Instant::now();
    let mut position = Vec3::new(8.0, 0.0, 8.0);
    let mut cycles = 0usize;
    let mut generated = 0usize;
    let mut destroyed = 0usize;
    let mut failures = 0usize;

    for tick in 0..ticks {
        // Gentle curve so both axes cross chunk borders
        let t = tick as f32 * TICK.as_secs_f32();
        let heading = Vec3::new(1.0, 0.0, (t * 0.2).sin()).normalize();
        position += heading * SPEED * TICK.as_secs_f32();
        reference.move_to(position);

        let stats = manager.update(reference.position(), TICK)?;
        if let Some(cycle) = &stats.cycle {
            cycles += 1;
            log::debug!(
                "tick {}: cycle at {:?}, {} queued",
                tick,
                cycle.origin,
                cycle.queued
            );
        }
        generated += stats.generation.completed;
        destroyed += stats.destroyed();
        failures += stats.failures();

        if tick % 60 == 0 {
            let info = manager.debug_info();
            log::info!(
                "tick {:>4}  chunks {:>4}  pending {:>3}  busy {}  done {:>4}  removing {:>3}",
                tick,
                info.registry_chunks,
                info.to_generate,
                info.busy,
                info.done,
                info.to_remove
            );
        }

        thread::sleep(TICK);
    }

    let info = manager.debug_info();
    log::info!(
        "finished {} ticks in {:.1}s: {} cycles, {} chunks generated, {} destroyed, {} failures, {} live",
        ticks,
        start.elapsed().as_secs_f32(),
        cycles,
        generated,
        destroyed,
        failures,
        info.registry_chunks
    );
    Ok(())
}
