//! Per-tick collision and classification sweep.
//!
//! Each tick the sweep looks at the grid neighborhood around the player and
//! runs two passes over it:
//!
//! 1. Collectibles in range are picked up through the [`ObjectStore`] and
//!    dropped from the working list.
//! 2. Whatever remains is tested against per-type radii; the first obstacle,
//!    hazard or enemy in range kills the player and ends the sweep.
//!
//! All distances are planar (XZ); height is ignored. Because pickups leave
//! the working list first, a record that is both collectible and collidable
//! only ever scores.

use ahash::AHashSet;
use frontier_common::{planar_distance_sq, ObjectId};
use frontier_world::{ChunkStreamer, CollisionTuning, PlacedObject, SpatialGrid};
use glam::Vec3;
use tracing::{debug, info, warn};

use crate::events::GameEvent;
use crate::game_state::GamePhase;

/// Where the sweep reads object records and commits pickups.
pub trait ObjectStore {
    /// Resolves a grid id to its record.
    fn object(&self, id: ObjectId) -> Option<&PlacedObject>;

    /// Marks `id` collected and removes it from `grid`.
    ///
    /// Returns `false` if it was already collected or cannot be resolved.
    fn collect_object(&mut self, grid: &mut SpatialGrid, id: ObjectId) -> bool;
}

impl ObjectStore for ChunkStreamer {
    fn object(&self, id: ObjectId) -> Option<&PlacedObject> {
        ChunkStreamer::object(self, id)
    }

    fn collect_object(&mut self, grid: &mut SpatialGrid, id: ObjectId) -> bool {
        ChunkStreamer::collect_object(self, grid, id)
    }
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepResult {
    /// The player hit something lethal
    pub died: bool,
    /// Total score picked up this tick
    pub score_delta: i32,
    /// Collectibles picked up, in pickup order
    pub collected: Vec<ObjectId>,
    /// What killed the player
    pub killed_by: Option<ObjectId>,
    events: Vec<GameEvent>,
}

impl SweepResult {
    /// Events raised, in the order they happened.
    #[must_use]
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Whether the sweep changed anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Runs the per-tick sweep.
#[derive(Debug)]
pub struct CollisionSweep {
    tuning: CollisionTuning,
    /// Types already reported for a missing radius
    warned: AHashSet<String>,
    /// Reused neighborhood buffer
    working: Vec<ObjectId>,
}

impl CollisionSweep {
    /// Creates a sweep with the level's collision tuning.
    #[must_use]
    pub fn new(tuning: CollisionTuning) -> Self {
        Self {
            tuning,
            warned: AHashSet::new(),
            working: Vec::new(),
        }
    }

    /// The tuning in use.
    #[must_use]
    pub const fn tuning(&self) -> &CollisionTuning {
        &self.tuning
    }

    /// Sweeps the neighborhood of `player`.
    ///
    /// Does nothing unless `phase` is [`GamePhase::Playing`].
    pub fn run(
        &mut self,
        phase: GamePhase,
        player: Vec3,
        grid: &mut SpatialGrid,
        objects: &mut impl ObjectStore,
    ) -> SweepResult {
        let mut result = SweepResult::default();
        if !phase.is_playing() {
            return result;
        }

        let mut working = std::mem::take(&mut self.working);
        grid.query_nearby_into(player, &mut working);

        self.collect_pass(player, grid, objects, &mut working, &mut result);
        self.obstacle_pass(player, &*objects, &working, &mut result);

        self.working = working;
        result
    }

    fn collect_pass(
        &self,
        player: Vec3,
        grid: &mut SpatialGrid,
        objects: &mut impl ObjectStore,
        working: &mut Vec<ObjectId>,
        result: &mut SweepResult,
    ) {
        let reach = self.tuning.player_radius + self.tuning.collectible_radius;
        // Reverse so removal does not shift unvisited entries.
        for i in (0..working.len()).rev() {
            let id = working[i];
            let Some(object) = resolve(&*objects, id) else {
                continue;
            };
            if !object.is_collectible() {
                continue;
            }
            if planar_distance_sq(player, object.position) >= reach * reach {
                continue;
            }
            let delta = object.score_value;
            if !objects.collect_object(grid, id) {
                continue;
            }
            result.score_delta += delta;
            result.collected.push(id);
            result.events.push(GameEvent::ScoreChanged { delta });
            result.events.push(GameEvent::ObjectCollected { id });
            working.remove(i);
        }
    }

    fn obstacle_pass(
        &mut self,
        player: Vec3,
        objects: &impl ObjectStore,
        working: &[ObjectId],
        result: &mut SweepResult,
    ) {
        for &id in working {
            let Some(object) = resolve(objects, id) else {
                continue;
            };
            let Some(radius) = self.contact_radius(object) else {
                continue;
            };
            let reach = self.tuning.player_radius + radius;
            if planar_distance_sq(player, object.position) < reach * reach {
                info!("Player died: hit {} {id}", object.object_type);
                result.died = true;
                result.killed_by = Some(id);
                result.events.push(GameEvent::PlayerDied);
                return;
            }
        }
    }

    /// Planar radius of a lethal record; `None` for scenery.
    fn contact_radius(&mut self, object: &PlacedObject) -> Option<f32> {
        if let Some(enemy) = &object.enemy {
            let radius = match enemy.bounds {
                Some(bounds) => bounds.planar_radius(),
                None => {
                    if self.warned.insert(enemy.kind.clone()) {
                        warn!(
                            "No bounds for enemy '{}', using fallback radius {}",
                            enemy.kind, self.tuning.enemy_fallback_radius
                        );
                    }
                    self.tuning.enemy_fallback_radius
                },
            };
            return Some(radius);
        }
        if !object.collidable || object.collected {
            return None;
        }
        let radius = match self.tuning.obstacle_radii.get(&object.object_type) {
            Some(&radius) => radius,
            None => {
                if self.warned.insert(object.object_type.clone()) {
                    warn!(
                        "No collision radius for '{}', using default {}",
                        object.object_type, self.tuning.default_obstacle_radius
                    );
                }
                self.tuning.default_obstacle_radius
            },
        };
        Some(radius)
    }
}

/// Looks up a grid id and filters out records the sweep cannot reason about.
fn resolve(objects: &impl ObjectStore, id: ObjectId) -> Option<&PlacedObject> {
    let Some(object) = objects.object(id) else {
        debug!("Sweep: {id} no longer resolves, skipped");
        return None;
    };
    if object.object_type.is_empty() || !object.position.is_finite() {
        debug!("Sweep: malformed record {id}, skipped");
        return None;
    }
    Some(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashMap;
    use frontier_common::ChunkCoord;
    use frontier_world::{EnemyBounds, EnemyInstance};
    use proptest::prelude::*;

    #[derive(Default)]
    struct TestStore {
        objects: AHashMap<ObjectId, PlacedObject>,
    }

    impl TestStore {
        fn insert(&mut self, grid: &mut SpatialGrid, index: u32, object: PlacedObject) -> ObjectId {
            let id = ObjectId::new(ChunkCoord::new(0, 0), index);
            grid.add(id, object.position, None);
            self.objects.insert(id, object);
            id
        }
    }

    impl ObjectStore for TestStore {
        fn object(&self, id: ObjectId) -> Option<&PlacedObject> {
            self.objects.get(&id)
        }

        fn collect_object(&mut self, grid: &mut SpatialGrid, id: ObjectId) -> bool {
            match self.objects.get_mut(&id) {
                Some(object) if !object.collected => {
                    object.collected = true;
                    grid.remove(id, Some(object.position));
                    true
                },
                _ => false,
            }
        }
    }

    fn record(kind: &str, position: Vec3) -> PlacedObject {
        PlacedObject {
            object_type: kind.to_string(),
            position,
            scale: 1.0,
            rotation_y: 0.0,
            collidable: false,
            score_value: 0,
            min_distance: 1.0,
            collected: false,
            is_hazard: false,
            is_dynamic: false,
            velocity_x: 0.0,
            enemy: None,
        }
    }

    fn coin(position: Vec3) -> PlacedObject {
        PlacedObject {
            score_value: 10,
            ..record("coin", position)
        }
    }

    fn rock(position: Vec3) -> PlacedObject {
        PlacedObject {
            collidable: true,
            ..record("rock_small", position)
        }
    }

    fn bear(position: Vec3, bounds: Option<EnemyBounds>) -> PlacedObject {
        PlacedObject {
            collidable: true,
            enemy: Some(EnemyInstance {
                kind: "bear".to_string(),
                bounds,
            }),
            ..record("bear", position)
        }
    }

    fn setup() -> (CollisionSweep, SpatialGrid, TestStore) {
        (
            CollisionSweep::new(CollisionTuning::default()),
            SpatialGrid::new(10.0),
            TestStore::default(),
        )
    }

    #[test]
    fn test_obstacle_kills_player() {
        let (mut sweep, mut grid, mut store) = setup();
        let id = store.insert(&mut grid, 0, rock(Vec3::new(0.0, 0.0, 1.5)));
        let result = sweep.run(GamePhase::Playing, Vec3::ZERO, &mut grid, &mut store);
        assert!(result.died);
        assert_eq!(result.killed_by, Some(id));
        assert_eq!(result.events(), &[GameEvent::PlayerDied]);
    }

    #[test]
    fn test_sweep_stops_at_first_hit() {
        let (mut sweep, mut grid, mut store) = setup();
        let first = store.insert(&mut grid, 0, rock(Vec3::new(0.0, 0.0, 1.5)));
        store.insert(&mut grid, 1, rock(Vec3::new(0.5, 0.0, 0.0)));
        let result = sweep.run(GamePhase::Playing, Vec3::ZERO, &mut grid, &mut store);
        assert_eq!(result.killed_by, Some(first));
        assert_eq!(result.events().len(), 1);
    }

    #[test]
    fn test_out_of_reach_is_ignored() {
        let (mut sweep, mut grid, mut store) = setup();
        store.insert(&mut grid, 0, rock(Vec3::new(0.0, 0.0, 2.5)));
        store.insert(&mut grid, 1, coin(Vec3::new(2.1, 0.0, 0.0)));
        let result = sweep.run(GamePhase::Playing, Vec3::ZERO, &mut grid, &mut store);
        assert!(result.is_empty());
        assert!(!result.died);
    }

    #[test]
    fn test_height_is_ignored() {
        let (mut sweep, mut grid, mut store) = setup();
        store.insert(&mut grid, 0, rock(Vec3::new(0.0, 50.0, 1.0)));
        let result = sweep.run(GamePhase::Playing, Vec3::ZERO, &mut grid, &mut store);
        assert!(result.died);
    }

    #[test]
    fn test_coin_collected_once() {
        let (mut sweep, mut grid, mut store) = setup();
        let id = store.insert(&mut grid, 0, coin(Vec3::new(0.5, 1.0, 0.5)));
        let result = sweep.run(GamePhase::Playing, Vec3::ZERO, &mut grid, &mut store);
        assert_eq!(result.score_delta, 10);
        assert_eq!(result.collected, vec![id]);
        assert_eq!(
            result.events(),
            &[
                GameEvent::ScoreChanged { delta: 10 },
                GameEvent::ObjectCollected { id }
            ]
        );
        assert!(!grid.contains(id));

        let again = sweep.run(GamePhase::Playing, Vec3::ZERO, &mut grid, &mut store);
        assert!(again.is_empty());
    }

    #[test]
    fn test_collectible_obstacle_only_scores() {
        let (mut sweep, mut grid, mut store) = setup();
        let both = PlacedObject {
            collidable: true,
            ..coin(Vec3::new(0.0, 0.0, 0.5))
        };
        store.insert(&mut grid, 0, both);
        let result = sweep.run(GamePhase::Playing, Vec3::ZERO, &mut grid, &mut store);
        assert_eq!(result.score_delta, 10);
        assert!(!result.died);
    }

    #[test]
    fn test_coin_scored_before_death() {
        let (mut sweep, mut grid, mut store) = setup();
        let rock_id = store.insert(&mut grid, 0, rock(Vec3::new(0.0, 0.0, 1.0)));
        let coin_id = store.insert(&mut grid, 1, coin(Vec3::new(0.0, 0.0, -1.0)));
        let result = sweep.run(GamePhase::Playing, Vec3::ZERO, &mut grid, &mut store);
        assert_eq!(
            result.events(),
            &[
                GameEvent::ScoreChanged { delta: 10 },
                GameEvent::ObjectCollected { id: coin_id },
                GameEvent::PlayerDied,
            ]
        );
        assert_eq!(result.killed_by, Some(rock_id));
    }

    #[test]
    fn test_not_playing_is_noop() {
        for phase in [GamePhase::Ready, GamePhase::Paused, GamePhase::GameOver] {
            let (mut sweep, mut grid, mut store) = setup();
            let id = store.insert(&mut grid, 0, coin(Vec3::ZERO));
            store.insert(&mut grid, 1, rock(Vec3::ZERO));
            let result = sweep.run(phase, Vec3::ZERO, &mut grid, &mut store);
            assert!(result.is_empty());
            assert!(grid.contains(id));
        }
    }

    #[test]
    fn test_missing_radius_uses_default() {
        let (mut sweep, mut grid, mut store) = setup();
        let boulder = PlacedObject {
            collidable: true,
            ..record("boulder", Vec3::new(1.9, 0.0, 0.0))
        };
        store.insert(&mut grid, 0, boulder);
        let result = sweep.run(GamePhase::Playing, Vec3::ZERO, &mut grid, &mut store);
        assert!(result.died);
        assert!(sweep.warned.contains("boulder"));
    }

    #[test]
    fn test_per_type_radius() {
        let mut tuning = CollisionTuning::default();
        tuning.obstacle_radii.insert("rock_small".to_string(), 3.0);
        let mut sweep = CollisionSweep::new(tuning);
        let mut grid = SpatialGrid::new(10.0);
        let mut store = TestStore::default();
        store.insert(&mut grid, 0, rock(Vec3::new(3.5, 0.0, 0.0)));
        let result = sweep.run(GamePhase::Playing, Vec3::ZERO, &mut grid, &mut store);
        assert!(result.died);
    }

    #[test]
    fn test_enemy_radius_from_bounds() {
        let (mut sweep, mut grid, mut store) = setup();
        let bounds = EnemyBounds {
            width: 2.0,
            height: 2.0,
            depth: 6.0,
        };
        // Reach is 1 + 3 = 4.
        store.insert(&mut grid, 0, bear(Vec3::new(3.9, 0.0, 0.0), Some(bounds)));
        assert!(sweep.run(GamePhase::Playing, Vec3::ZERO, &mut grid, &mut store).died);

        let (mut sweep, mut grid, mut store) = setup();
        store.insert(&mut grid, 0, bear(Vec3::new(4.1, 0.0, 0.0), Some(bounds)));
        assert!(!sweep.run(GamePhase::Playing, Vec3::ZERO, &mut grid, &mut store).died);
    }

    #[test]
    fn test_enemy_without_bounds_uses_fallback() {
        let (mut sweep, mut grid, mut store) = setup();
        // Fallback 1.5 + player 1.0.
        store.insert(&mut grid, 0, bear(Vec3::new(2.4, 0.0, 0.0), None));
        assert!(sweep.run(GamePhase::Playing, Vec3::ZERO, &mut grid, &mut store).died);
        assert!(sweep.warned.contains("bear"));
    }

    #[test]
    fn test_non_collidable_scenery_is_ignored() {
        let (mut sweep, mut grid, mut store) = setup();
        store.insert(&mut grid, 0, record("flower", Vec3::ZERO));
        assert!(sweep.run(GamePhase::Playing, Vec3::ZERO, &mut grid, &mut store).is_empty());
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let (mut sweep, mut grid, mut store) = setup();
        store.insert(&mut grid, 0, rock(Vec3::new(0.0, f32::NAN, 0.5)));
        let unnamed = PlacedObject {
            collidable: true,
            ..record("", Vec3::new(0.5, 0.0, 0.0))
        };
        store.insert(&mut grid, 1, unnamed);
        // Registered in the grid but unknown to the store.
        grid.add(ObjectId::new(ChunkCoord::new(0, 0), 9), Vec3::ZERO, None);

        let result = sweep.run(GamePhase::Playing, Vec3::ZERO, &mut grid, &mut store);
        assert!(!result.died);
    }

    #[test]
    fn test_against_streamed_world() {
        let config = std::sync::Arc::new(frontier_world::LevelConfig::default());
        let mut grid = SpatialGrid::new(config.world.grid_cell_size);
        let mut streamer = ChunkStreamer::new(std::sync::Arc::clone(&config));
        let coord = ChunkCoord::new(0, 1);
        streamer.load_chunk(coord, 4, &mut grid);
        let chunk = streamer.chunk(coord).expect("loaded");
        let (index, target) = chunk
            .objects
            .iter()
            .enumerate()
            .find(|(_, o)| o.is_collectible())
            .expect("meadow chunk has coins");
        let id = ObjectId::new(coord, index as u32);
        let at = target.position;

        let mut sweep = CollisionSweep::new(config.collision.clone());
        let result = sweep.run(GamePhase::Playing, at, &mut grid, &mut streamer);
        assert!(result.collected.contains(&id));
        assert!(streamer.object(id).is_some_and(|o| o.collected));
    }

    proptest! {
        #[test]
        fn death_matches_planar_reach(x in -12.0f32..12.0, z in -12.0f32..12.0) {
            let (mut sweep, mut grid, mut store) = setup();
            let p = Vec3::new(x, 0.0, z);
            store.insert(&mut grid, 0, rock(p));
            let result = sweep.run(GamePhase::Playing, Vec3::ZERO, &mut grid, &mut store);
            // rock_small radius 1 + player radius 1
            let expected = x * x + z * z < 4.0;
            prop_assert_eq!(result.died, expected);
        }
    }
}
