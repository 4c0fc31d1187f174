//! # Frontier World
//!
//! World generation for Project Frontier.
//!
//! This crate handles:
//! - Level configuration
//! - The seeded height field
//! - Terrain chunk meshes with distance-based detail
//! - Object and enemy placement
//! - The spatial grid used for proximity queries
//! - Chunk streaming around the player

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod height_field;
pub mod placement;
pub mod spatial_grid;
pub mod streaming;
pub mod terrain;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::height_field::*;
    pub use crate::placement::*;
    pub use crate::spatial_grid::*;
    pub use crate::streaming::*;
    pub use crate::terrain::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use frontier_common::ChunkCoord;
    use glam::Vec3;

    #[test]
    fn test_same_seed_same_world() {
        let config = std::sync::Arc::new(LevelConfig::default());
        let mut grid_a = SpatialGrid::new(config.world.grid_cell_size);
        let mut grid_b = SpatialGrid::new(config.world.grid_cell_size);
        let mut a = ChunkStreamer::new(std::sync::Arc::clone(&config));
        let mut b = ChunkStreamer::new(config);
        a.update_around(Vec3::ZERO, &mut grid_a);
        b.update_around(Vec3::ZERO, &mut grid_b);

        for coord in a.loaded_coords() {
            let (ca, cb) = (a.chunk(coord).expect("loaded"), b.chunk(coord).expect("loaded"));
            assert_eq!(ca.objects, cb.objects);
            assert_eq!(ca.terrain.vertices, cb.terrain.vertices);
        }
        let point = Vec3::new(12.0, 0.0, -37.0);
        assert_eq!(grid_a.query_nearby(point), grid_b.query_nearby(point));
    }

    #[test]
    fn test_different_seeds_differ() {
        let mut other = LevelConfig::default();
        other.world.seed = "elsewhere".to_string();
        let a = PlacementGenerator::new(
            std::sync::Arc::new(LevelConfig::default()),
            std::sync::Arc::new(NoiseField::new(&WorldSeed::new("meadow-01"))),
        );
        let b = PlacementGenerator::new(
            std::sync::Arc::new(other),
            std::sync::Arc::new(NoiseField::new(&WorldSeed::new("elsewhere"))),
        );
        assert_ne!(a.generate(ChunkCoord::new(0, 2)), b.generate(ChunkCoord::new(0, 2)));
    }
}
