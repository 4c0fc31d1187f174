//! Level configuration.
//!
//! A level is a plain TOML document describing the world parameters, the
//! terrain look, collision tuning and the object/enemy tables used by the
//! placement generator. Configs are validated once at load time; the
//! generators assume a validated config and do not re-check it.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use frontier_common::{ConfigError, ConfigResult};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Complete description of one level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Human-readable level name
    pub name: String,
    /// World and streaming parameters
    pub world: WorldSettings,
    /// Terrain surface parameters
    pub terrain: TerrainParams,
    /// Collision radii used by the per-tick sweep
    pub collision: CollisionTuning,
    /// Static objects, collectibles and hazards, in placement order
    pub object_types: Vec<ObjectTypeConfig>,
    /// Weighted enemy pool
    pub enemy_types: Vec<EnemyTypeConfig>,
    /// Declared bounding dimensions per enemy kind
    pub enemy_properties: HashMap<String, EnemyBounds>,
    /// Expected enemies per unit area
    pub enemy_spawn_density: f32,
}

/// World-wide parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// World seed; every random stream derives from it
    pub seed: String,
    /// Side length of a square chunk in world units
    pub chunk_size: f32,
    /// Side length of a spatial grid cell
    pub grid_cell_size: f32,
    /// Where the player spawns
    pub player_spawn_position: Vec3,
    /// No object is placed closer than this to the spawn point (XZ plane)
    pub player_spawn_safe_radius: f32,
    /// Chunks kept loaded around the player (Chebyshev radius)
    pub render_distance: u32,
    /// Terrain segments per chunk side at full detail
    pub base_segments: u32,
    /// How quickly terrain detail drops with chunk distance
    pub lod_falloff: f32,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            seed: "meadow-01".to_string(),
            chunk_size: 100.0,
            grid_cell_size: 10.0,
            player_spawn_position: Vec3::new(0.0, 10.0, 5.0),
            player_spawn_safe_radius: 10.0,
            render_distance: 2,
            base_segments: 32,
            lod_falloff: 0.5,
        }
    }
}

/// Terrain look and shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// Scale applied to world coordinates before sampling noise
    pub noise_frequency: f32,
    /// Scale applied to the sampled noise value
    pub noise_amplitude: f32,
    /// Surface color as 0xRRGGBB
    pub terrain_color: u32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            noise_frequency: 0.02,
            noise_amplitude: 4.0,
            terrain_color: 0x0055_6B2F,
        }
    }
}

/// Radii for the planar collision heuristics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionTuning {
    /// Player footprint radius
    pub player_radius: f32,
    /// Pickup radius shared by all collectibles
    pub collectible_radius: f32,
    /// Used for obstacle types missing from `obstacle_radii`
    pub default_obstacle_radius: f32,
    /// Used for enemies whose bounds are unknown
    pub enemy_fallback_radius: f32,
    /// Per-type obstacle and hazard radii
    pub obstacle_radii: HashMap<String, f32>,
}

impl Default for CollisionTuning {
    fn default() -> Self {
        let obstacle_radii = [("rock_small", 1.0), ("tree_pine", 1.2), ("tumbleweed", 0.8)]
            .into_iter()
            .map(|(kind, radius)| (kind.to_string(), radius))
            .collect();
        Self {
            player_radius: 1.0,
            collectible_radius: 1.0,
            default_obstacle_radius: 1.0,
            enemy_fallback_radius: 1.5,
            obstacle_radii,
        }
    }
}

/// Off-center lateral band used by path-avoiding types.
///
/// `min` and `max` are absolute X offsets from the chunk center; the side is
/// chosen at random per candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LateralBand {
    /// Inner edge of the band
    pub min: f32,
    /// Outer edge of the band
    pub max: f32,
}

/// One entry of the object-type table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectTypeConfig {
    /// Type tag (`coin`, `rock_small`, `tumbleweed`, ...)
    #[serde(rename = "type")]
    pub object_type: String,
    /// Expected objects per unit area
    pub density: f32,
    /// Exclusion radius imposed on later placements
    pub min_distance: f32,
    /// Height above the terrain surface
    #[serde(default)]
    pub vertical_offset: f32,
    /// Uniform scale range `[min, max]`
    #[serde(default = "default_scale_range")]
    pub scale_range: [f32; 2],
    /// Whether to randomize rotation around Y
    #[serde(default = "default_true")]
    pub random_rotation_y: bool,
    /// Whether the player dies on contact
    #[serde(default)]
    pub collidable: bool,
    /// Score awarded on pickup; nonzero marks a collectible
    #[serde(default)]
    pub score_value: i32,
    /// Tries per candidate before giving up on it
    #[serde(default = "default_attempts")]
    pub max_placement_attempts: u32,
    /// Marks a hazard
    #[serde(default)]
    pub hazard: bool,
    /// Keep candidates inside a lateral band, off the running path
    #[serde(default)]
    pub avoid_path: Option<LateralBand>,
    /// Lateral roll speed; makes the object dynamic
    #[serde(default)]
    pub roll_speed: Option<f32>,
}

/// One entry of the weighted enemy pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyTypeConfig {
    /// Enemy kind (`bear`, ...)
    #[serde(rename = "type")]
    pub enemy_type: String,
    /// Relative selection weight
    pub weight: f32,
    /// Exclusion radius
    pub min_distance: f32,
    /// Height above the terrain surface
    #[serde(default)]
    pub vertical_offset: f32,
    /// Uniform scale range `[min, max]`
    #[serde(default = "default_scale_range")]
    pub scale_range: [f32; 2],
    /// Tries per candidate before giving up on it
    #[serde(default = "default_attempts")]
    pub max_placement_attempts: u32,
}

/// Declared bounding box of an enemy kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyBounds {
    /// Extent along X
    pub width: f32,
    /// Extent along Y
    pub height: f32,
    /// Extent along Z
    pub depth: f32,
}

impl EnemyBounds {
    /// Planar collision radius: half the larger horizontal extent.
    #[must_use]
    pub fn planar_radius(&self) -> f32 {
        self.width.max(self.depth) * 0.5
    }
}

fn default_scale_range() -> [f32; 2] {
    [1.0, 1.0]
}

const fn default_true() -> bool {
    true
}

const fn default_attempts() -> u32 {
    10
}

impl Default for LevelConfig {
    fn default() -> Self {
        let object_types = vec![
            ObjectTypeConfig {
                object_type: "coin".to_string(),
                density: 0.002,
                min_distance: 2.0,
                vertical_offset: 1.0,
                scale_range: [1.0, 1.0],
                random_rotation_y: false,
                collidable: false,
                score_value: 10,
                max_placement_attempts: 10,
                hazard: false,
                avoid_path: None,
                roll_speed: None,
            },
            ObjectTypeConfig {
                object_type: "rock_small".to_string(),
                density: 0.001,
                min_distance: 4.0,
                vertical_offset: 0.0,
                scale_range: [0.8, 1.4],
                random_rotation_y: true,
                collidable: true,
                score_value: 0,
                max_placement_attempts: 10,
                hazard: false,
                avoid_path: None,
                roll_speed: None,
            },
            ObjectTypeConfig {
                object_type: "tree_pine".to_string(),
                density: 0.0008,
                min_distance: 6.0,
                vertical_offset: 0.0,
                scale_range: [0.9, 1.6],
                random_rotation_y: true,
                collidable: true,
                score_value: 0,
                max_placement_attempts: 12,
                hazard: false,
                avoid_path: None,
                roll_speed: None,
            },
            ObjectTypeConfig {
                object_type: "tumbleweed".to_string(),
                density: 0.0002,
                min_distance: 5.0,
                vertical_offset: 0.6,
                scale_range: [0.8, 1.2],
                random_rotation_y: true,
                collidable: true,
                score_value: 0,
                max_placement_attempts: 8,
                hazard: true,
                avoid_path: Some(LateralBand { min: 8.0, max: 20.0 }),
                roll_speed: Some(3.0),
            },
        ];

        let enemy_types = vec![EnemyTypeConfig {
            enemy_type: "bear".to_string(),
            weight: 1.0,
            min_distance: 8.0,
            vertical_offset: 0.0,
            scale_range: [1.0, 1.2],
            max_placement_attempts: 10,
        }];

        let enemy_properties = HashMap::from([(
            "bear".to_string(),
            EnemyBounds {
                width: 2.0,
                height: 2.2,
                depth: 3.0,
            },
        )]);

        Self {
            name: "meadow".to_string(),
            world: WorldSettings::default(),
            terrain: TerrainParams::default(),
            collision: CollisionTuning::default(),
            object_types,
            enemy_types,
            enemy_properties,
            enemy_spawn_density: 0.0002,
        }
    }
}

impl LevelConfig {
    /// Loads and validates a level from a TOML file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        info!("Loaded level '{}' from {}", config.name, path.display());
        Ok(config)
    }

    /// Parses and validates a level from TOML text.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the level back to TOML.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Area of one chunk.
    #[must_use]
    pub fn chunk_area(&self) -> f32 {
        self.world.chunk_size * self.world.chunk_size
    }

    /// Largest `min_distance` across the enemy pool.
    #[must_use]
    pub fn max_enemy_min_distance(&self) -> f32 {
        self.enemy_types
            .iter()
            .map(|e| e.min_distance)
            .fold(0.0, f32::max)
    }

    /// Looks up an object type by tag.
    #[must_use]
    pub fn object_type(&self, tag: &str) -> Option<&ObjectTypeConfig> {
        self.object_types.iter().find(|t| t.object_type == tag)
    }

    /// Checks every value the generators rely on.
    pub fn validate(&self) -> ConfigResult<()> {
        let world = &self.world;
        positive("world.chunk_size", world.chunk_size)?;
        positive("world.grid_cell_size", world.grid_cell_size)?;
        non_negative("world.player_spawn_safe_radius", world.player_spawn_safe_radius)?;
        non_negative("world.lod_falloff", world.lod_falloff)?;
        if !world.player_spawn_position.is_finite() {
            return Err(ConfigError::invalid(
                "world.player_spawn_position",
                "must be finite",
            ));
        }
        if world.base_segments < 2 {
            return Err(ConfigError::invalid("world.base_segments", "must be at least 2"));
        }

        finite("terrain.noise_frequency", self.terrain.noise_frequency)?;
        finite("terrain.noise_amplitude", self.terrain.noise_amplitude)?;
        if self.terrain.terrain_color > 0x00FF_FFFF {
            return Err(ConfigError::invalid(
                "terrain.terrain_color",
                "must be a 0xRRGGBB value",
            ));
        }

        let collision = &self.collision;
        positive("collision.player_radius", collision.player_radius)?;
        positive("collision.collectible_radius", collision.collectible_radius)?;
        positive("collision.default_obstacle_radius", collision.default_obstacle_radius)?;
        positive("collision.enemy_fallback_radius", collision.enemy_fallback_radius)?;
        for (kind, radius) in &collision.obstacle_radii {
            positive(&format!("collision.obstacle_radii.{kind}"), *radius)?;
        }

        let half = world.chunk_size * 0.5;
        for (i, t) in self.object_types.iter().enumerate() {
            let field = |name: &str| format!("object_types[{i}].{name}");
            if t.object_type.is_empty() {
                return Err(ConfigError::invalid(field("type"), "must not be empty"));
            }
            non_negative(&field("density"), t.density)?;
            non_negative(&field("min_distance"), t.min_distance)?;
            finite(&field("vertical_offset"), t.vertical_offset)?;
            scale_range(&field("scale_range"), t.scale_range)?;
            if t.max_placement_attempts == 0 {
                return Err(ConfigError::invalid(
                    field("max_placement_attempts"),
                    "must be at least 1",
                ));
            }
            if let Some(band) = t.avoid_path {
                non_negative(&field("avoid_path.min"), band.min)?;
                if band.max < band.min || band.max > half {
                    return Err(ConfigError::invalid(
                        field("avoid_path"),
                        format!("needs min <= max <= {half} (half a chunk)"),
                    ));
                }
            }
            if let Some(speed) = t.roll_speed {
                non_negative(&field("roll_speed"), speed)?;
            }
        }

        for (i, e) in self.enemy_types.iter().enumerate() {
            let field = |name: &str| format!("enemy_types[{i}].{name}");
            if e.enemy_type.is_empty() {
                return Err(ConfigError::invalid(field("type"), "must not be empty"));
            }
            non_negative(&field("weight"), e.weight)?;
            non_negative(&field("min_distance"), e.min_distance)?;
            finite(&field("vertical_offset"), e.vertical_offset)?;
            scale_range(&field("scale_range"), e.scale_range)?;
            if e.max_placement_attempts == 0 {
                return Err(ConfigError::invalid(
                    field("max_placement_attempts"),
                    "must be at least 1",
                ));
            }
        }

        non_negative("enemy_spawn_density", self.enemy_spawn_density)?;
        let total_weight: f32 = self.enemy_types.iter().map(|e| e.weight).sum();
        if self.enemy_spawn_density > 0.0 && !self.enemy_types.is_empty() && total_weight <= 0.0 {
            return Err(ConfigError::invalid(
                "enemy_types",
                "weights must not all be zero when enemies spawn",
            ));
        }

        for (kind, bounds) in &self.enemy_properties {
            positive(&format!("enemy_properties.{kind}.width"), bounds.width)?;
            positive(&format!("enemy_properties.{kind}.depth"), bounds.depth)?;
        }

        // The 3x3 query window only covers one cell of reach on each side.
        let reach = collision.player_radius + self.largest_collision_radius();
        if reach > world.grid_cell_size {
            warn!(
                "grid_cell_size {} is smaller than the largest collision reach {reach}; \
                 proximity queries may miss contacts",
                world.grid_cell_size
            );
        }

        Ok(())
    }

    fn largest_collision_radius(&self) -> f32 {
        let collision = &self.collision;
        let obstacles = collision
            .obstacle_radii
            .values()
            .copied()
            .fold(collision.default_obstacle_radius, f32::max);
        let enemies = self
            .enemy_properties
            .values()
            .map(EnemyBounds::planar_radius)
            .fold(collision.enemy_fallback_radius, f32::max);
        obstacles.max(enemies).max(collision.collectible_radius)
    }
}

fn finite(field: &str, value: f32) -> ConfigResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be finite"))
    }
}

fn positive(field: &str, value: f32) -> ConfigResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be positive, got {value}")))
    }
}

fn non_negative(field: &str, value: f32) -> ConfigResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be >= 0, got {value}")))
    }
}

fn scale_range(field: &str, range: [f32; 2]) -> ConfigResult<()> {
    positive(field, range[0])?;
    positive(field, range[1])?;
    if range[0] > range[1] {
        return Err(ConfigError::invalid(field, "min must not exceed max"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEADOW: &str = include_str!("../../../levels/meadow.toml");

    #[test]
    fn test_default_level_is_valid() {
        let config = LevelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_enemy_min_distance(), 8.0);
    }

    #[test]
    fn test_bundled_level_parses() {
        let config = LevelConfig::from_toml_str(MEADOW).expect("meadow.toml should be valid");
        assert_eq!(config.name, "meadow");
        assert_eq!(config.world.seed, "meadow-01");
        assert!(config.object_type("coin").is_some_and(|t| t.score_value > 0));
        let tumbleweed = config.object_type("tumbleweed").expect("tumbleweed defined");
        assert!(tumbleweed.hazard);
        assert!(tumbleweed.roll_speed.is_some());
        assert!(config.enemy_properties.contains_key("bear"));
    }

    #[test]
    fn test_builtin_level_matches_bundled_meadow() {
        let builtin = toml::Value::try_from(LevelConfig::default()).expect("serialize default");
        let bundled = LevelConfig::from_toml_str(MEADOW).expect("parse meadow");
        let bundled = toml::Value::try_from(bundled).expect("serialize meadow");
        assert_eq!(builtin, bundled);
    }

    #[test]
    fn test_minimal_level_uses_defaults() {
        let config = LevelConfig::from_toml_str(
            r#"
            name = "tiny"
            [world]
            seed = "test"

            [[object_types]]
            type = "rock"
            density = 0.01
            min_distance = 5.0
            "#,
        )
        .expect("minimal level should parse");
        assert_eq!(config.world.chunk_size, 100.0);
        let rock = &config.object_types[0];
        assert_eq!(rock.max_placement_attempts, 10);
        assert_eq!(rock.scale_range, [1.0, 1.0]);
        assert!(rock.random_rotation_y);
        assert!(!rock.collidable);
    }

    #[test]
    fn test_rejects_non_positive_chunk_size() {
        let mut config = LevelConfig::default();
        config.world.chunk_size = 0.0;
        let err = config.validate().expect_err("zero chunk size must fail");
        assert!(err.to_string().contains("world.chunk_size"));
    }

    #[test]
    fn test_rejects_band_wider_than_chunk() {
        let mut config = LevelConfig::default();
        config.object_types[3].avoid_path = Some(LateralBand { min: 10.0, max: 80.0 });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_scale_range() {
        let mut config = LevelConfig::default();
        config.enemy_types[0].scale_range = [2.0, 1.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_enemy_weights() {
        let mut config = LevelConfig::default();
        config.enemy_types[0].weight = 0.0;
        assert!(config.validate().is_err());
        config.enemy_spawn_density = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = LevelConfig::from_toml_str("world = 3").expect_err("bad toml");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("level.toml");
        let config = LevelConfig::default();
        std::fs::write(&path, config.to_toml_string().expect("serialize")).expect("write");
        let loaded = LevelConfig::load_from(&path).expect("load");
        assert_eq!(loaded.name, config.name);
        assert_eq!(loaded.object_types.len(), config.object_types.len());
        assert_eq!(loaded.terrain, config.terrain);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = LevelConfig::load_from("/nonexistent/level.toml").expect_err("missing");
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
