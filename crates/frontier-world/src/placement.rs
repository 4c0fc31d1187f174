//! Seeded object placement.
//!
//! Objects are scattered per chunk by rejection sampling: each candidate gets
//! a bounded number of tries to land somewhere that respects the exclusion
//! radii of everything already placed in the chunk and stays clear of the
//! player spawn point. The exclusion check is a pairwise scan over the
//! chunk's list, O(n²) per chunk; fine at the densities levels use, but a
//! per-chunk grid would be needed for much denser tables.

use std::f32::consts::TAU;
use std::sync::Arc;

use fastrand::Rng;
use frontier_common::{planar_distance_sq, ChunkCoord};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{EnemyBounds, EnemyTypeConfig, LevelConfig, ObjectTypeConfig};
use crate::height_field::{NoiseField, WorldSeed};

/// Enemy data attached to a placed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyInstance {
    /// Enemy kind from the pool
    pub kind: String,
    /// Declared bounds, if the level lists them
    pub bounds: Option<EnemyBounds>,
}

/// One spawned entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedObject {
    /// Type tag
    pub object_type: String,
    /// World position; Y is terrain height plus the type's offset
    pub position: Vec3,
    /// Uniform scale
    pub scale: f32,
    /// Rotation around Y in radians
    pub rotation_y: f32,
    /// Participates in obstacle collision
    pub collidable: bool,
    /// Score on pickup; nonzero only for collectibles
    pub score_value: i32,
    /// Exclusion radius imposed on later placements
    pub min_distance: f32,
    /// Set once when picked up
    pub collected: bool,
    /// Marks a hazard
    pub is_hazard: bool,
    /// Moves every tick and must be re-registered in the grid
    pub is_dynamic: bool,
    /// Lateral roll velocity of dynamic hazards
    pub velocity_x: f32,
    /// Present for enemies
    pub enemy: Option<EnemyInstance>,
}

impl PlacedObject {
    /// Collectible that has not been picked up yet.
    #[must_use]
    pub fn is_collectible(&self) -> bool {
        self.score_value != 0 && !self.collected
    }

    /// Whether this record is an enemy.
    #[must_use]
    pub fn is_enemy(&self) -> bool {
        self.enemy.is_some()
    }
}

/// Draws a uniform value in `[min, max)`.
fn range(rng: &mut Rng, min: f32, max: f32) -> f32 {
    min + rng.f32() * (max - min)
}

/// Generates the objects and enemies of a chunk.
#[derive(Debug, Clone)]
pub struct PlacementGenerator {
    config: Arc<LevelConfig>,
    seed: WorldSeed,
    noise: Arc<NoiseField>,
    max_enemy_min_distance: f32,
}

impl PlacementGenerator {
    /// Creates a generator for a level.
    #[must_use]
    pub fn new(config: Arc<LevelConfig>, noise: Arc<NoiseField>) -> Self {
        let seed = WorldSeed::new(config.world.seed.clone());
        let max_enemy_min_distance = config.max_enemy_min_distance();
        Self {
            config,
            seed,
            noise,
            max_enemy_min_distance,
        }
    }

    /// Everything a chunk contains: the object table in order, then enemies.
    #[must_use]
    pub fn generate(&self, coord: ChunkCoord) -> Vec<PlacedObject> {
        let mut placed = self.generate_objects(coord);
        let objects = placed.len();
        self.place_enemies(coord, &mut placed);
        debug!(
            "Chunk {coord}: placed {objects} objects and {} enemies",
            placed.len() - objects
        );
        placed
    }

    /// Places the object table for a chunk.
    #[must_use]
    pub fn generate_objects(&self, coord: ChunkCoord) -> Vec<PlacedObject> {
        let mut rng = Rng::with_seed(self.seed.objects_stream(coord));
        let mut placed = Vec::new();
        for object_type in &self.config.object_types {
            self.place_type(coord, object_type, &mut rng, &mut placed);
        }
        placed
    }

    /// Appends enemies drawn from the weighted pool to `placed`.
    pub fn place_enemies(&self, coord: ChunkCoord, placed: &mut Vec<PlacedObject>) {
        let pool = &self.config.enemy_types;
        let total_weight: f32 = pool.iter().map(|e| e.weight).sum();
        if pool.is_empty() || total_weight <= 0.0 || self.config.enemy_spawn_density <= 0.0 {
            return;
        }

        let mut rng = Rng::with_seed(self.seed.enemies_stream(coord));
        let expected = self.expected_count(self.config.enemy_spawn_density, &mut rng);

        for _ in 0..expected {
            let enemy = pick_weighted(pool, total_weight, &mut rng);
            let mut committed = false;
            for _ in 0..enemy.max_placement_attempts {
                let (x, z) = self.chunk_point(coord, &mut rng);
                let clear = self.is_clear(placed, x, z, |existing| {
                    existing.min_distance.max(self.max_enemy_min_distance)
                });
                if !clear {
                    continue;
                }
                placed.push(self.enemy_record(enemy, x, z, &mut rng));
                committed = true;
                break;
            }
            if !committed {
                warn!(
                    "Chunk {coord}: no room for enemy '{}' after {} attempts",
                    enemy.enemy_type, enemy.max_placement_attempts
                );
            }
        }
    }

    fn place_type(
        &self,
        coord: ChunkCoord,
        object_type: &ObjectTypeConfig,
        rng: &mut Rng,
        placed: &mut Vec<PlacedObject>,
    ) {
        let expected = self.expected_count(object_type.density, rng);
        let mut skipped = 0u32;

        for _ in 0..expected {
            let mut committed = false;
            for _ in 0..object_type.max_placement_attempts {
                let (x, z, side) = match object_type.avoid_path {
                    Some(band) => {
                        let side = if rng.bool() { 1.0 } else { -1.0 };
                        let (center_x, _) = coord.center(self.config.world.chunk_size);
                        let x = center_x + side * range(rng, band.min, band.max);
                        let (_, z) = self.chunk_point(coord, rng);
                        (x, z, side)
                    },
                    None => {
                        let (x, z) = self.chunk_point(coord, rng);
                        (x, z, 0.0)
                    },
                };
                let clear = self.is_clear(placed, x, z, |existing| {
                    existing.min_distance.max(object_type.min_distance)
                });
                if !clear {
                    continue;
                }
                placed.push(self.object_record(object_type, x, z, side, rng));
                committed = true;
                break;
            }
            if !committed {
                skipped += 1;
            }
        }

        if skipped > 0 {
            warn!(
                "Chunk {coord}: skipped {skipped} of {expected} '{}' after {} attempts each",
                object_type.object_type, object_type.max_placement_attempts
            );
        }
    }

    /// `floor(area * density * jitter)` with jitter in `[0.8, 1.2)`.
    fn expected_count(&self, density: f32, rng: &mut Rng) -> u32 {
        let jitter = range(rng, 0.8, 1.2);
        (self.config.chunk_area() * density * jitter).floor() as u32
    }

    /// Uniform point inside the chunk footprint.
    fn chunk_point(&self, coord: ChunkCoord, rng: &mut Rng) -> (f32, f32) {
        let size = self.config.world.chunk_size;
        let (center_x, center_z) = coord.center(size);
        let x = center_x + (rng.f32() - 0.5) * size;
        let z = center_z + (rng.f32() - 0.5) * size;
        (x, z)
    }

    /// Exclusion and spawn-safety test for a candidate at `(x, z)`.
    fn is_clear(
        &self,
        placed: &[PlacedObject],
        x: f32,
        z: f32,
        exclusion: impl Fn(&PlacedObject) -> f32,
    ) -> bool {
        let candidate = Vec3::new(x, 0.0, z);
        let blocked = placed.iter().any(|existing| {
            let radius = exclusion(existing);
            planar_distance_sq(candidate, existing.position) < radius * radius
        });
        if blocked {
            return false;
        }
        let world = &self.config.world;
        let safe = world.player_spawn_safe_radius;
        planar_distance_sq(candidate, world.player_spawn_position) >= safe * safe
    }

    fn ground(&self, x: f32, z: f32) -> f32 {
        self.noise.surface_height(x, z, &self.config.terrain)
    }

    fn object_record(
        &self,
        object_type: &ObjectTypeConfig,
        x: f32,
        z: f32,
        side: f32,
        rng: &mut Rng,
    ) -> PlacedObject {
        let y = self.ground(x, z) + object_type.vertical_offset;
        let [min_scale, max_scale] = object_type.scale_range;
        let scale = range(rng, min_scale, max_scale);
        let rotation_y = if object_type.random_rotation_y {
            rng.f32() * TAU
        } else {
            0.0
        };
        // Dynamic hazards roll back across the path from the side they spawn on.
        let velocity_x = match object_type.roll_speed {
            Some(speed) if side != 0.0 => -side * speed,
            Some(speed) => {
                if rng.bool() {
                    speed
                } else {
                    -speed
                }
            },
            None => 0.0,
        };

        PlacedObject {
            object_type: object_type.object_type.clone(),
            position: Vec3::new(x, y, z),
            scale,
            rotation_y,
            collidable: object_type.collidable,
            score_value: object_type.score_value,
            min_distance: object_type.min_distance,
            collected: false,
            is_hazard: object_type.hazard,
            is_dynamic: object_type.roll_speed.is_some(),
            velocity_x,
            enemy: None,
        }
    }

    fn enemy_record(&self, enemy: &EnemyTypeConfig, x: f32, z: f32, rng: &mut Rng) -> PlacedObject {
        let y = self.ground(x, z) + enemy.vertical_offset;
        let [min_scale, max_scale] = enemy.scale_range;
        let scale = range(rng, min_scale, max_scale);
        let rotation_y = rng.f32() * TAU;

        PlacedObject {
            object_type: enemy.enemy_type.clone(),
            position: Vec3::new(x, y, z),
            scale,
            rotation_y,
            collidable: true,
            score_value: 0,
            min_distance: enemy.min_distance,
            collected: false,
            is_hazard: false,
            is_dynamic: false,
            velocity_x: 0.0,
            enemy: Some(EnemyInstance {
                kind: enemy.enemy_type.clone(),
                bounds: self.config.enemy_properties.get(&enemy.enemy_type).copied(),
            }),
        }
    }
}

fn pick_weighted<'a>(pool: &'a [EnemyTypeConfig], total_weight: f32, rng: &mut Rng) -> &'a EnemyTypeConfig {
    let mut roll = rng.f32() * total_weight;
    for enemy in pool {
        if roll < enemy.weight {
            return enemy;
        }
        roll -= enemy.weight;
    }
    // Float round-off can leave a sliver past the last bucket.
    pool.iter()
        .rev()
        .find(|enemy| enemy.weight > 0.0)
        .unwrap_or(&pool[pool.len() - 1])
}
