//! Chunk column: a vertical stack of segments plus terrain synthesis.

use crate::core::{lattice_index, CHUNK_SIZE, HEIGHTMAP_SIDE};
use crate::error::{Result, StreamError};
use crate::mesh::IsosurfaceExtractor;
use crate::noise::NoiseGenerator;

use super::coord::{ChunkCoord, ChunkKey, CoordinateSpace, SegmentCoord};
use super::segment::ChunkSegment;
use super::visuals::ChunkVisuals;

/// A terrain column identified by its (x, z) chunk coordinate.
#[derive(Clone, Debug)]
pub struct Chunk {
    coord: ChunkCoord,
    segments: Vec<ChunkSegment>,
    /// 17×17 lattice of surface heights, filled by synthesis.
    heightmap: Option<Box<[f32]>>,
    generated: bool,
    being_generated: bool,
    instantiated: bool,
    /// Current segment meshes have been handed to the visuals backend.
    meshes_applied: bool,
    failed_attempts: u32,
}

impl Chunk {
    /// Create an ungenerated column with `segment_count` empty segments.
    pub fn new(coord: ChunkCoord, segment_count: usize) -> Self {
        let segments = (0..segment_count)
            .map(|i| ChunkSegment::new(SegmentCoord::of_column(coord, i as i32)))
            .collect();
        Self {
            coord,
            segments,
            heightmap: None,
            generated: false,
            being_generated: false,
            instantiated: false,
            meshes_applied: false,
            failed_attempts: 0,
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn key(&self) -> ChunkKey {
        self.coord.key()
    }

    pub fn segments(&self) -> &[ChunkSegment] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Option<&ChunkSegment> {
        self.segments.get(index)
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub fn is_being_generated(&self) -> bool {
        self.being_generated
    }

    pub fn is_instantiated(&self) -> bool {
        self.instantiated
    }

    /// Generated meshes have reached the visuals backend.
    pub fn has_applied_meshes(&self) -> bool {
        self.meshes_applied
    }

    /// Synthesis attempts that failed since the chunk was created.
    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    /// Heightmap lattice, `HEIGHTMAP_SIDE` samples per row.
    pub fn heightmap(&self) -> Result<&[f32]> {
        self.heightmap
            .as_deref()
            .ok_or(StreamError::MissingData("chunk heightmap"))
    }

    /// Sample the heightmap, rasterize every segment, and extract meshes.
    ///
    /// Each lattice sample is `noise(world_x, world_z) * 16 * segment_count + 1`.
    /// On failure the chunk stays ungenerated and keeps whatever segments were
    /// already rebuilt.
    pub fn generate_terrain(
        &mut self,
        noise: &NoiseGenerator,
        extractor: &dyn IsosurfaceExtractor,
    ) -> Result<()> {
        self.being_generated = true;
        self.generated = false;
        self.meshes_applied = false;

        let heightmap = self.sample_heightmap(noise);
        for segment in &mut self.segments {
            if let Err(err) = segment.synthesize(&heightmap, extractor) {
                self.being_generated = false;
                return Err(err);
            }
        }

        self.heightmap = Some(heightmap);
        self.generated = true;
        self.being_generated = false;
        Ok(())
    }

    fn sample_heightmap(&self, noise: &NoiseGenerator) -> Box<[f32]> {
        let world_x = self.coord.x(CoordinateSpace::World);
        let world_z = self.coord.z(CoordinateSpace::World);
        let amplitude = (CHUNK_SIZE * self.segments.len()) as f64;

        let mut heightmap = vec![0.0f32; HEIGHTMAP_SIDE * HEIGHTMAP_SIDE];
        for z in 0..HEIGHTMAP_SIDE {
            for x in 0..HEIGHTMAP_SIDE {
                let sample = noise.generate((world_x + x as i32) as f64, (world_z + z as i32) as f64);
                heightmap[lattice_index(x, z)] = (sample * amplitude + 1.0) as f32;
            }
        }
        heightmap.into_boxed_slice()
    }

    pub(crate) fn mark_generating(&mut self) {
        self.being_generated = true;
    }

    /// Record a failed synthesis, returning the total number of failures.
    pub(crate) fn record_failure(&mut self) -> u32 {
        self.being_generated = false;
        self.failed_attempts += 1;
        self.failed_attempts
    }

    /// Ensure every segment has a visual placeholder.
    pub fn instantiate(&mut self, visuals: &mut dyn ChunkVisuals) {
        if self.instantiated {
            return;
        }
        for segment in &mut self.segments {
            segment.ensure_placeholder(visuals);
        }
        self.instantiated = true;
    }

    /// Push every segment mesh to its placeholder. Returns the number applied.
    pub fn apply_meshes(&mut self, visuals: &mut dyn ChunkVisuals) -> usize {
        if !self.generated {
            return 0;
        }
        self.instantiate(visuals);
        let applied = self
            .segments
            .iter()
            .filter(|segment| segment.apply_mesh(visuals))
            .count();
        self.meshes_applied = true;
        applied
    }

    /// Apply meshes only if the current generation has not been applied yet.
    pub fn apply_pending_meshes(&mut self, visuals: &mut dyn ChunkVisuals) -> usize {
        if self.meshes_applied {
            return 0;
        }
        self.apply_meshes(visuals)
    }

    /// Release visual resources and derived data.
    pub fn destroy(&mut self, visuals: &mut dyn ChunkVisuals) {
        for segment in &mut self.segments {
            segment.dispose(visuals);
        }
        self.heightmap = None;
        self.generated = false;
        self.instantiated = false;
        self.meshes_applied = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::visuals::NullVisuals;
    use crate::config::NoiseConfig;
    use crate::core::{Voxel, SEGMENT_VOLUME};
    use crate::mesh::{EdgeMidpointExtractor, MeshData};

    struct FailingExtractor;

    impl IsosurfaceExtractor for FailingExtractor {
        fn extract(&self, _voxels: &[Voxel], _dims: [usize; 3]) -> Result<MeshData> {
            Err(StreamError::MissingData("test mesh"))
        }
    }

    fn noise() -> NoiseGenerator {
        NoiseGenerator::new(&NoiseConfig::seeded(10_000)).unwrap()
    }

    #[test]
    fn new_chunk_has_empty_segments() {
        let chunk = Chunk::new(ChunkCoord::ZERO, 4);
        assert_eq!(chunk.segment_count(), 4);
        for (i, segment) in chunk.segments().iter().enumerate() {
            assert_eq!(segment.voxels().len(), SEGMENT_VOLUME);
            assert_eq!(segment.coord().y(CoordinateSpace::Chunk), i as i32);
            assert!(segment.mesh().is_err());
        }
        assert!(!chunk.is_generated());
        assert!(chunk.heightmap().is_err());
    }

    #[test]
    fn generate_terrain_fills_every_segment() {
        let mut chunk = Chunk::new(ChunkCoord::ZERO, 4);
        chunk.generate_terrain(&noise(), &EdgeMidpointExtractor).unwrap();

        assert!(chunk.is_generated());
        assert!(!chunk.is_being_generated());
        for segment in chunk.segments() {
            assert_eq!(segment.voxels().len(), SEGMENT_VOLUME);
            assert!(segment.mesh().is_ok());
        }
        // Bottom corners sit at y = 0, always below the +1 height floor
        assert!(chunk.segment(0).unwrap().voxel(0, 0, 0).corner_state(0).unwrap());
    }

    #[test]
    fn heightmap_matches_formula() {
        let noise = noise();
        let mut chunk = Chunk::new(ChunkCoord::new(-2, 3), 4);
        chunk.generate_terrain(&noise, &EdgeMidpointExtractor).unwrap();

        let heightmap = chunk.heightmap().unwrap();
        assert_eq!(heightmap.len(), HEIGHTMAP_SIDE * HEIGHTMAP_SIDE);
        for (x, z) in [(0usize, 0usize), (16, 0), (5, 16), (16, 16)] {
            let expected = (noise.generate(-32.0 + x as f64, 48.0 + z as f64) * 64.0 + 1.0) as f32;
            assert_eq!(heightmap[lattice_index(x, z)], expected);
        }
        assert!(heightmap.iter().all(|h| (1.0..=65.0).contains(h)));
    }

    #[test]
    fn neighbouring_chunks_share_edge_samples() {
        let noise = noise();
        let mut a = Chunk::new(ChunkCoord::new(0, 0), 4);
        let mut b = Chunk::new(ChunkCoord::new(1, 0), 4);
        a.generate_terrain(&noise, &EdgeMidpointExtractor).unwrap();
        b.generate_terrain(&noise, &EdgeMidpointExtractor).unwrap();

        let ha = a.heightmap().unwrap();
        let hb = b.heightmap().unwrap();
        for z in 0..HEIGHTMAP_SIDE {
            assert_eq!(ha[lattice_index(16, z)], hb[lattice_index(0, z)]);
        }
    }

    #[test]
    fn extractor_failure_leaves_chunk_ungenerated() {
        let mut chunk = Chunk::new(ChunkCoord::ZERO, 2);
        chunk.mark_generating();
        let result = chunk.generate_terrain(&noise(), &FailingExtractor);
        assert!(result.is_err());
        assert!(!chunk.is_generated());
        assert!(!chunk.is_being_generated());
        assert_eq!(chunk.record_failure(), 1);
    }

    #[test]
    fn visuals_lifecycle() {
        let mut visuals = NullVisuals::new();
        let mut chunk = Chunk::new(ChunkCoord::new(4, 4), 4);

        // Nothing to apply before generation
        assert_eq!(chunk.apply_meshes(&mut visuals), 0);

        chunk.instantiate(&mut visuals);
        chunk.instantiate(&mut visuals);
        assert!(chunk.is_instantiated());
        assert_eq!(visuals.live_placeholders(), 4);

        chunk.generate_terrain(&noise(), &EdgeMidpointExtractor).unwrap();
        assert!(!chunk.has_applied_meshes());
        assert_eq!(chunk.apply_pending_meshes(&mut visuals), 4);
        assert!(chunk.has_applied_meshes());
        assert_eq!(chunk.apply_pending_meshes(&mut visuals), 0);

        // Regeneration invalidates the applied meshes
        chunk.generate_terrain(&noise(), &EdgeMidpointExtractor).unwrap();
        assert!(!chunk.has_applied_meshes());
        assert_eq!(chunk.apply_meshes(&mut visuals), 4);

        chunk.destroy(&mut visuals);
        assert_eq!(visuals.live_placeholders(), 0);
        assert!(!chunk.is_instantiated());
        assert!(!chunk.has_applied_meshes());
        assert!(chunk.segments().iter().all(|s| !s.has_mesh()));
    }
}
