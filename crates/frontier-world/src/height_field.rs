//! Deterministic height field.
//!
//! Every random quantity in the world is derived from a [`WorldSeed`]: the
//! terrain noise directly, and the per-chunk placement streams by hashing the
//! seed text together with a purpose suffix and the chunk coordinate.

use frontier_common::ChunkCoord;
use noise::{NoiseFn, Perlin};

use crate::config::TerrainParams;

/// 64-bit FNV-1a over raw bytes.
#[must_use]
pub fn fnv1a_64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xCBF2_9CE4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;
    bytes.iter().fold(OFFSET_BASIS, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(PRIME)
    })
}

/// World seed text, set once at world start.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorldSeed(String);

impl WorldSeed {
    /// Creates a seed from any text.
    #[must_use]
    pub fn new(seed: impl Into<String>) -> Self {
        Self(seed.into())
    }

    /// The seed text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric form of the seed.
    #[must_use]
    pub fn hash(&self) -> u64 {
        fnv1a_64(self.0.as_bytes())
    }

    /// Hash of `seed + suffix`, used to open independent random streams.
    #[must_use]
    pub fn derive(&self, suffix: &str) -> u64 {
        let mut text = String::with_capacity(self.0.len() + suffix.len());
        text.push_str(&self.0);
        text.push_str(suffix);
        fnv1a_64(text.as_bytes())
    }

    /// Stream seed for a chunk's static objects.
    #[must_use]
    pub fn objects_stream(&self, coord: ChunkCoord) -> u64 {
        self.derive(&format!("_objects_chunk_{}_{}", coord.x, coord.z))
    }

    /// Stream seed for a chunk's enemies.
    #[must_use]
    pub fn enemies_stream(&self, coord: ChunkCoord) -> u64 {
        self.derive(&format!("_enemies_chunk_{}_{}", coord.x, coord.z))
    }
}

impl From<&str> for WorldSeed {
    fn from(seed: &str) -> Self {
        Self::new(seed)
    }
}

/// Continuous 2D noise keyed by the world seed.
///
/// Immutable after construction; share it behind an `Arc` between the
/// terrain builder and the placement generator.
pub struct NoiseField {
    perlin: Perlin,
}

impl NoiseField {
    /// Creates the field for a seed.
    #[must_use]
    pub fn new(seed: &WorldSeed) -> Self {
        let hash = seed.hash();
        let folded = (hash ^ (hash >> 32)) as u32;
        Self {
            perlin: Perlin::new(folded),
        }
    }

    /// Raw noise value at `(x, z)`, roughly in `[-1, 1]`.
    #[must_use]
    pub fn height(&self, x: f32, z: f32) -> f32 {
        self.perlin.get([f64::from(x), f64::from(z)]) as f32
    }

    /// Terrain surface height at a world position for the given level.
    #[must_use]
    pub fn surface_height(&self, world_x: f32, world_z: f32, params: &TerrainParams) -> f32 {
        self.height(
            world_x * params.noise_frequency,
            world_z * params.noise_frequency,
        ) * params.noise_amplitude
    }
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseField").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_known_vectors() {
        assert_eq!(fnv1a_64(b""), 0xCBF2_9CE4_8422_2325);
        assert_eq!(fnv1a_64(b"a"), 0xAF63_DC4C_8601_EC8C);
    }

    #[test]
    fn test_height_deterministic() {
        let a = NoiseField::new(&WorldSeed::new("test"));
        let b = NoiseField::new(&WorldSeed::new("test"));
        for (x, z) in [(0.3, 0.7), (12.5, -3.25), (-100.1, 42.9)] {
            assert_eq!(a.height(x, z), b.height(x, z));
        }
    }

    #[test]
    fn test_different_seeds_different_heights() {
        let a = NoiseField::new(&WorldSeed::new("alpha"));
        let b = NoiseField::new(&WorldSeed::new("omega"));
        let points = [(0.5f32, 0.5f32), (1.3, 4.7), (-7.7, 3.3), (20.1, 10.9)];
        let all_same = points
            .iter()
            .all(|&(x, z)| (a.height(x, z) - b.height(x, z)).abs() < 1e-6);
        assert!(!all_same, "At least one sample should differ between seeds");
    }

    #[test]
    fn test_surface_height_scales_by_amplitude() {
        let field = NoiseField::new(&WorldSeed::new("test"));
        let params = TerrainParams {
            noise_frequency: 0.05,
            noise_amplitude: 6.0,
            terrain_color: 0,
        };
        let raw = field.height(10.0 * 0.05, 30.0 * 0.05);
        let surface = field.surface_height(10.0, 30.0, &params);
        assert!((surface - raw * 6.0).abs() < 1e-5);
        assert!(surface.abs() <= 6.0 * 1.5);
    }

    #[test]
    fn test_chunk_streams_are_distinct() {
        let seed = WorldSeed::new("test");
        let c = ChunkCoord::new(0, 0);
        assert_ne!(seed.objects_stream(c), seed.enemies_stream(c));
        assert_ne!(seed.objects_stream(c), seed.objects_stream(ChunkCoord::new(1, 0)));
        assert_eq!(
            seed.objects_stream(ChunkCoord::new(-2, 5)),
            seed.derive("_objects_chunk_-2_5")
        );
    }
}
