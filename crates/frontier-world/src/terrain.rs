//! Terrain chunk meshes.
//!
//! Each chunk is a regular grid of height samples over its square footprint.
//! Vertex positions are local to the chunk center; the renderer places the
//! mesh at [`TerrainMesh::origin`].

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use frontier_common::ChunkCoord;
use glam::Vec3;
use tracing::debug;

use crate::config::{LevelConfig, TerrainParams};
use crate::height_field::NoiseField;

/// Fewest segments per chunk side at any level of detail.
pub const MIN_SEGMENTS: u32 = 2;

/// GPU-ready terrain vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    /// Position relative to the chunk origin
    pub position: [f32; 3],
    /// Unit surface normal
    pub normal: [f32; 3],
}

/// Height-sampled surface for one chunk.
#[derive(Debug, Clone)]
pub struct TerrainMesh {
    /// Chunk this mesh covers
    pub coord: ChunkCoord,
    /// World position of the chunk center (Y = 0)
    pub origin: Vec3,
    /// Segments per side
    pub segments: u32,
    /// `(segments + 1)²` vertices, row-major with rows along +Z
    pub vertices: Vec<TerrainVertex>,
    /// Triangle list, counter-clockwise seen from +Y
    pub indices: Vec<u32>,
    /// Surface color as 0xRRGGBB
    pub color: u32,
}

impl TerrainMesh {
    /// Vertices per side.
    #[must_use]
    pub const fn row_len(&self) -> u32 {
        self.segments + 1
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex at grid column `col` (X) and row `row` (Z).
    #[must_use]
    pub fn vertex(&self, col: u32, row: u32) -> Option<&TerrainVertex> {
        if col > self.segments || row > self.segments {
            return None;
        }
        self.vertices.get((row * self.row_len() + col) as usize)
    }

    /// Raw vertex bytes for buffer upload.
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// Level-of-detail policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodSettings {
    /// Segments at distance 0
    pub base_segments: u32,
    /// Detail divisor growth per chunk of distance
    pub falloff: f32,
}

impl LodSettings {
    /// Segment count at full detail: `base_segments` snapped down to even.
    #[must_use]
    pub fn top_segments(&self) -> u32 {
        (self.base_segments - self.base_segments % 2).max(MIN_SEGMENTS)
    }

    /// Segment count for a chunk `distance` chunks away (Chebyshev).
    ///
    /// Tiers are the top count halved while it stays even and at least
    /// [`MIN_SEGMENTS`]. The finest tier not above
    /// `base_segments / (1 + distance * falloff)` is chosen, or the coarsest
    /// tier if none fits. Every tier divides each finer one, so every boundary
    /// vertex of a coarser neighbor has a twin on the finer side.
    #[must_use]
    pub fn segments_for_distance(&self, distance: u32) -> u32 {
        let raw = (self.base_segments as f32 / (1.0 + distance as f32 * self.falloff)).floor() as u32;
        let mut tier = self.top_segments();
        while tier > raw && (tier / 2) % 2 == 0 && tier / 2 >= MIN_SEGMENTS {
            tier /= 2;
        }
        tier
    }
}

/// Builds terrain meshes from the noise field.
#[derive(Debug, Clone)]
pub struct TerrainChunkBuilder {
    noise: Arc<NoiseField>,
    chunk_size: f32,
    params: TerrainParams,
    lod: LodSettings,
}

impl TerrainChunkBuilder {
    /// Creates a builder.
    #[must_use]
    pub fn new(noise: Arc<NoiseField>, chunk_size: f32, params: TerrainParams, lod: LodSettings) -> Self {
        Self {
            noise,
            chunk_size,
            params,
            lod,
        }
    }

    /// Creates a builder from a level config.
    #[must_use]
    pub fn from_level(noise: Arc<NoiseField>, config: &LevelConfig) -> Self {
        Self::new(
            noise,
            config.world.chunk_size,
            config.terrain,
            LodSettings {
                base_segments: config.world.base_segments,
                falloff: config.world.lod_falloff,
            },
        )
    }

    /// The LOD policy in use.
    #[must_use]
    pub const fn lod(&self) -> &LodSettings {
        &self.lod
    }

    /// Builds a chunk mesh at the detail tier for `distance`.
    #[must_use]
    pub fn build_for_distance(&self, coord: ChunkCoord, distance: u32) -> TerrainMesh {
        self.build(coord, self.lod.segments_for_distance(distance))
    }

    /// Builds a chunk mesh with an explicit segment count.
    #[must_use]
    pub fn build(&self, coord: ChunkCoord, segments: u32) -> TerrainMesh {
        let segments = segments.max(MIN_SEGMENTS);
        let row_len = segments + 1;
        let step = self.chunk_size / segments as f32;
        let half = self.chunk_size * 0.5;
        let (center_x, center_z) = coord.center(self.chunk_size);

        let mut positions = Vec::with_capacity((row_len * row_len) as usize);
        for row in 0..row_len {
            for col in 0..row_len {
                let local_x = -half + col as f32 * step;
                let local_z = -half + row as f32 * step;
                let height = self.noise.surface_height(
                    center_x + local_x,
                    center_z + local_z,
                    &self.params,
                );
                positions.push(Vec3::new(local_x, height, local_z));
            }
        }

        let mut indices = Vec::with_capacity((segments * segments * 6) as usize);
        for row in 0..segments {
            for col in 0..segments {
                let i0 = row * row_len + col;
                let i1 = i0 + 1;
                let i2 = i0 + row_len;
                let i3 = i2 + 1;
                indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
            }
        }

        let normals = compute_normals(&positions, &indices);
        let vertices = positions
            .iter()
            .zip(&normals)
            .map(|(p, n)| TerrainVertex {
                position: p.to_array(),
                normal: n.to_array(),
            })
            .collect();

        debug!("Built terrain chunk {coord} at {segments} segments");

        TerrainMesh {
            coord,
            origin: Vec3::new(center_x, 0.0, center_z),
            segments,
            vertices,
            indices,
            color: self.params.terrain_color,
        }
    }
}

/// Area-weighted vertex normals from an indexed triangle list.
fn compute_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals
        .into_iter()
        .map(|n| {
            let unit = n.normalize_or_zero();
            if unit == Vec3::ZERO {
                Vec3::Y
            } else {
                unit
            }
        })
        .collect()
}
