//! Chunk streaming around the player.
//!
//! The streamer owns every loaded chunk's terrain mesh and object list,
//! registers live objects in the [`SpatialGrid`] on load and removes them on
//! unload. Generation is synchronous; a chunk load runs to completion.

use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use frontier_common::{ChunkCoord, ObjectId, WorldError, WorldResult};
use glam::Vec3;
use tracing::{debug, info};

use crate::config::LevelConfig;
use crate::height_field::{NoiseField, WorldSeed};
use crate::placement::{PlacedObject, PlacementGenerator};
use crate::spatial_grid::SpatialGrid;
use crate::terrain::{TerrainChunkBuilder, TerrainMesh};

/// A chunk that is currently resident.
#[derive(Debug, Clone)]
pub struct LoadedChunk {
    /// Chunk coordinate
    pub coord: ChunkCoord,
    /// Surface mesh at the current detail tier
    pub terrain: TerrainMesh,
    /// Generated objects; indices are stable for the chunk's lifetime
    pub objects: Vec<PlacedObject>,
}

impl LoadedChunk {
    /// Objects not yet collected.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.objects.iter().filter(|o| !o.collected).count()
    }
}

/// What a streaming pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamUpdate {
    /// Newly loaded chunks
    pub loaded: Vec<ChunkCoord>,
    /// Chunks dropped
    pub unloaded: Vec<ChunkCoord>,
    /// Resident chunks whose terrain was rebuilt at a new detail tier
    pub retessellated: Vec<ChunkCoord>,
}

impl StreamUpdate {
    /// Whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty() && self.unloaded.is_empty() && self.retessellated.is_empty()
    }
}

/// Loads, unloads and animates chunks around the player.
pub struct ChunkStreamer {
    /// Level being streamed
    config: Arc<LevelConfig>,
    /// Shared height field
    noise: Arc<NoiseField>,
    /// Terrain mesher
    terrain: TerrainChunkBuilder,
    /// Object generator
    placement: PlacementGenerator,
    /// Resident chunks
    chunks: AHashMap<ChunkCoord, LoadedChunk>,
    /// Lateral travel limit per dynamic type, from the chunk center
    roll_limits: AHashMap<String, f32>,
}

impl ChunkStreamer {
    /// Creates a streamer for a validated level.
    #[must_use]
    pub fn new(config: Arc<LevelConfig>) -> Self {
        let noise = Arc::new(NoiseField::new(&WorldSeed::new(config.world.seed.clone())));
        let terrain = TerrainChunkBuilder::from_level(Arc::clone(&noise), &config);
        let placement = PlacementGenerator::new(Arc::clone(&config), Arc::clone(&noise));
        let half = config.world.chunk_size * 0.5;
        let roll_limits = config
            .object_types
            .iter()
            .filter(|t| t.roll_speed.is_some())
            .map(|t| {
                let limit = t.avoid_path.map_or(half, |band| band.max);
                (t.object_type.clone(), limit)
            })
            .collect();

        Self {
            config,
            noise,
            terrain,
            placement,
            chunks: AHashMap::new(),
            roll_limits,
        }
    }

    /// The level being streamed.
    #[must_use]
    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    /// Chunk containing `position`.
    #[must_use]
    pub fn chunk_for_position(&self, position: Vec3) -> ChunkCoord {
        ChunkCoord::containing(position, self.config.world.chunk_size)
    }

    /// Checks if a chunk is loaded.
    #[must_use]
    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Returns the number of loaded chunks.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.chunks.len()
    }

    /// Loaded chunk coordinates, sorted.
    #[must_use]
    pub fn loaded_coords(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<_> = self.chunks.keys().copied().collect();
        coords.sort_unstable();
        coords
    }

    /// A resident chunk.
    ///
    /// # Errors
    ///
    /// [`WorldError::ChunkNotLoaded`] if `coord` is not resident.
    pub fn chunk(&self, coord: ChunkCoord) -> WorldResult<&LoadedChunk> {
        self.chunks.get(&coord).ok_or(WorldError::ChunkNotLoaded {
            x: coord.x,
            z: coord.z,
        })
    }

    /// Looks up a placed object.
    #[must_use]
    pub fn object(&self, id: ObjectId) -> Option<&PlacedObject> {
        self.chunks
            .get(&id.chunk)
            .and_then(|chunk| chunk.objects.get(id.index as usize))
    }

    /// Generates a chunk and registers its objects.
    ///
    /// Returns the number of objects registered; 0 if already loaded.
    pub fn load_chunk(&mut self, coord: ChunkCoord, segments: u32, grid: &mut SpatialGrid) -> usize {
        if self.chunks.contains_key(&coord) {
            return 0;
        }

        let terrain = self.terrain.build(coord, segments);
        let objects = self.placement.generate(coord);
        let mut registered = 0;
        for (index, object) in objects.iter().enumerate() {
            if object.collected {
                continue;
            }
            grid.add(ObjectId::new(coord, index as u32), object.position, None);
            registered += 1;
        }

        debug!("Loaded chunk {coord}: {registered} objects");
        self.chunks.insert(
            coord,
            LoadedChunk {
                coord,
                terrain,
                objects,
            },
        );
        registered
    }

    /// Drops a chunk and unregisters its objects.
    ///
    /// Returns the number of objects removed from the grid.
    pub fn unload_chunk(&mut self, coord: ChunkCoord, grid: &mut SpatialGrid) -> usize {
        let Some(chunk) = self.chunks.remove(&coord) else {
            return 0;
        };
        let mut removed = 0;
        for (index, object) in chunk.objects.iter().enumerate() {
            if grid.remove(ObjectId::new(coord, index as u32), Some(object.position)) {
                removed += 1;
            }
        }
        debug!("Unloaded chunk {coord}: {removed} objects");
        removed
    }

    /// Keeps the square of chunks within `render_distance` of `position`
    /// loaded, drops the rest and refreshes terrain detail tiers.
    pub fn update_around(&mut self, position: Vec3, grid: &mut SpatialGrid) -> StreamUpdate {
        let center = self.chunk_for_position(position);
        let radius = self.config.world.render_distance as i32;
        let mut update = StreamUpdate::default();

        let mut wanted = AHashSet::new();
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                wanted.insert(ChunkCoord::new(center.x + dx, center.z + dz));
            }
        }

        let mut stale: Vec<_> = self
            .chunks
            .keys()
            .filter(|coord| !wanted.contains(*coord))
            .copied()
            .collect();
        stale.sort_unstable();
        for coord in stale {
            self.unload_chunk(coord, grid);
            update.unloaded.push(coord);
        }

        let mut wanted: Vec<_> = wanted.into_iter().collect();
        wanted.sort_unstable();
        for coord in wanted {
            let distance = center.chebyshev_distance(coord);
            let segments = self.terrain.lod().segments_for_distance(distance);
            match self.chunks.get_mut(&coord) {
                Some(chunk) if chunk.terrain.segments != segments => {
                    chunk.terrain = self.terrain.build(coord, segments);
                    update.retessellated.push(coord);
                },
                Some(_) => {},
                None => {
                    self.load_chunk(coord, segments, grid);
                    update.loaded.push(coord);
                },
            }
        }

        if !update.loaded.is_empty() || !update.unloaded.is_empty() {
            info!(
                "Streaming around chunk {center}: +{} -{} ({} resident)",
                update.loaded.len(),
                update.unloaded.len(),
                self.chunks.len()
            );
        }
        update
    }

    /// Marks an object collected and removes it from the grid.
    ///
    /// Returns `false` if it was already collected or is not resident.
    pub fn collect_object(&mut self, grid: &mut SpatialGrid, id: ObjectId) -> bool {
        let Some(object) = self
            .chunks
            .get_mut(&id.chunk)
            .and_then(|chunk| chunk.objects.get_mut(id.index as usize))
        else {
            debug!("Collect {id}: not resident");
            return false;
        };
        if object.collected {
            return false;
        }
        object.collected = true;
        grid.remove(id, Some(object.position));
        debug!("Collected {} {id}", object.object_type);
        true
    }

    /// Rolls dynamic hazards laterally for `dt` seconds.
    ///
    /// Hazards bounce off their travel limit, follow the terrain surface and
    /// are re-registered in the grid. Returns how many changed grid cell.
    pub fn advance_dynamic(&mut self, dt: f32, grid: &mut SpatialGrid) -> usize {
        let chunk_size = self.config.world.chunk_size;
        let mut moved = 0;
        for chunk in self.chunks.values_mut() {
            let (center_x, _) = chunk.coord.center(chunk_size);
            for (index, object) in chunk.objects.iter_mut().enumerate() {
                if !object.is_dynamic || object.collected {
                    continue;
                }
                let limit = self
                    .roll_limits
                    .get(&object.object_type)
                    .copied()
                    .unwrap_or(chunk_size * 0.5);

                let old = object.position;
                let lift = old.y - self.noise.surface_height(old.x, old.z, &self.config.terrain);
                let mut offset = old.x - center_x + object.velocity_x * dt;
                if offset.abs() > limit {
                    offset = offset.clamp(-limit, limit);
                    object.velocity_x = -object.velocity_x;
                }
                let x = center_x + offset;
                let y = self.noise.surface_height(x, old.z, &self.config.terrain) + lift;
                object.position = Vec3::new(x, y, old.z);

                if grid.update(ObjectId::new(chunk.coord, index as u32), object.position) {
                    moved += 1;
                }
            }
        }
        moved
    }
}

impl std::fmt::Debug for ChunkStreamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStreamer")
            .field("level", &self.config.name)
            .field("loaded", &self.chunks.len())
            .finish_non_exhaustive()
    }
}
