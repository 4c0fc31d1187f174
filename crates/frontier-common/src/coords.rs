//! Coordinate types for chunks and spatial grid cells.
//!
//! The world is a 3D space whose ground plane is XZ; Y is up. Both chunk and
//! grid-cell coordinates index that ground plane.

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Chunk coordinate (identifies a square region of the world).
///
/// Chunk `(cx, cz)` is centered on world `(cx * size, cz * size)` and covers
/// half a chunk on each side of that center.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct ChunkCoord {
    /// X coordinate in chunk space
    pub x: i32,
    /// Z coordinate in chunk space
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Returns the chunk containing the given world XZ position.
    #[must_use]
    pub fn from_world(x: f32, z: f32, chunk_size: f32) -> Self {
        let half = chunk_size * 0.5;
        Self {
            x: ((x + half) / chunk_size).floor() as i32,
            z: ((z + half) / chunk_size).floor() as i32,
        }
    }

    /// Returns the chunk containing a world position (Y is ignored).
    #[must_use]
    pub fn containing(position: Vec3, chunk_size: f32) -> Self {
        Self::from_world(position.x, position.z, chunk_size)
    }

    /// World-space center of the chunk on the XZ plane.
    #[must_use]
    pub fn center(self, chunk_size: f32) -> (f32, f32) {
        (self.x as f32 * chunk_size, self.z as f32 * chunk_size)
    }

    /// Chebyshev (chessboard) distance in chunks.
    #[must_use]
    pub const fn chebyshev_distance(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dz = self.z.abs_diff(other.z);
        if dx > dz {
            dx
        } else {
            dz
        }
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.z)
    }
}

/// Key of a spatial grid cell: `floor(world / cell_size)` on each axis.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct CellKey {
    /// Cell X index
    pub x: i32,
    /// Cell Z index
    pub z: i32,
}

impl CellKey {
    /// Creates a new cell key.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Returns the cell containing the world XZ position.
    #[must_use]
    pub fn from_world(x: f32, z: f32, cell_size: f32) -> Self {
        Self {
            x: (x / cell_size).floor() as i32,
            z: (z / cell_size).floor() as i32,
        }
    }

    /// Returns the cell containing a world position (Y is ignored).
    #[must_use]
    pub fn containing(position: Vec3, cell_size: f32) -> Self {
        Self::from_world(position.x, position.z, cell_size)
    }

    /// The 3×3 block of cells centered on this one, row by row.
    pub fn neighborhood(self) -> impl Iterator<Item = CellKey> {
        (-1..=1).flat_map(move |dz| (-1..=1).map(move |dx| CellKey::new(self.x + dx, self.z + dz)))
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.z)
    }
}

/// Squared distance between two points projected onto the XZ plane.
#[must_use]
pub fn planar_distance_sq(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    dx * dx + dz * dz
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_chunk_from_world_is_centered() {
        assert_eq!(ChunkCoord::from_world(0.0, 0.0, 100.0), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_world(49.9, -49.9, 100.0), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_world(50.0, -50.1, 100.0), ChunkCoord::new(1, -1));
    }

    #[test]
    fn test_cell_key_negative_floor() {
        assert_eq!(CellKey::from_world(-0.5, 0.5, 10.0), CellKey::new(-1, 0));
        assert_eq!(CellKey::from_world(25.0, -10.0, 10.0), CellKey::new(2, -1));
    }

    #[test]
    fn test_neighborhood_has_nine_distinct_cells() {
        let cells: Vec<_> = CellKey::new(3, -2).neighborhood().collect();
        assert_eq!(cells.len(), 9);
        assert!(cells.contains(&CellKey::new(2, -3)));
        assert!(cells.contains(&CellKey::new(4, -1)));
        assert!(cells.contains(&CellKey::new(3, -2)));
    }

    #[test]
    fn test_display_matches_key_format() {
        assert_eq!(ChunkCoord::new(-1, 4).to_string(), "-1,4");
        assert_eq!(CellKey::new(7, 0).to_string(), "7,0");
    }

    #[test]
    fn test_chebyshev_distance() {
        let a = ChunkCoord::new(0, 0);
        assert_eq!(a.chebyshev_distance(ChunkCoord::new(2, -1)), 2);
        assert_eq!(a.chebyshev_distance(ChunkCoord::new(-3, 3)), 3);
        assert_eq!(a.chebyshev_distance(a), 0);
    }

    proptest! {
        #[test]
        fn chunk_contains_its_positions(x in -5000.0f32..5000.0, z in -5000.0f32..5000.0) {
            let size = 64.0;
            let coord = ChunkCoord::from_world(x, z, size);
            let (cx, cz) = coord.center(size);
            prop_assert!((x - cx).abs() <= size * 0.5 + 1e-3);
            prop_assert!((z - cz).abs() <= size * 0.5 + 1e-3);
        }
    }
}
