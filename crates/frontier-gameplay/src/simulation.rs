//! World simulation context.
//!
//! Owns everything one run needs: the chunk streamer, the spatial grid, the
//! collision sweep, the event bus and the score. The caller drives it with the
//! player's position once per frame.

use std::sync::Arc;

use frontier_common::ObjectId;
use frontier_world::{ChunkStreamer, LevelConfig, SpatialGrid};
use glam::Vec3;
use tracing::{info, warn};

use crate::collision::{CollisionSweep, SweepResult};
use crate::events::EventBus;
use crate::game_state::{GamePhase, PhaseError};
use crate::score::ScoreTracker;

/// One endless run over a level.
#[derive(Debug)]
pub struct Simulation {
    /// Level being played
    config: Arc<LevelConfig>,
    /// Loaded chunks and their objects
    streamer: ChunkStreamer,
    /// Proximity index of live objects
    grid: SpatialGrid,
    /// Per-tick collision sweep
    sweep: CollisionSweep,
    /// Run lifecycle
    phase: GamePhase,
    /// Sweep outcomes on their way to the score
    bus: EventBus,
    /// Running totals
    score: ScoreTracker,
    /// What ended the run
    killed_by: Option<ObjectId>,
    /// Ticks simulated while playing
    ticks: u64,
    /// Seconds simulated while playing
    elapsed: f64,
}

impl Simulation {
    /// Creates a simulation for a validated level.
    #[must_use]
    pub fn new(config: Arc<LevelConfig>) -> Self {
        Self {
            streamer: ChunkStreamer::new(Arc::clone(&config)),
            grid: SpatialGrid::new(config.world.grid_cell_size),
            sweep: CollisionSweep::new(config.collision.clone()),
            phase: GamePhase::Ready,
            bus: EventBus::default(),
            score: ScoreTracker::new(),
            killed_by: None,
            ticks: 0,
            elapsed: 0.0,
            config,
        }
    }

    /// Streams the world around the spawn point and starts playing.
    pub fn start(&mut self) -> Result<(), PhaseError> {
        self.phase.start()?;
        let spawn = self.config.world.player_spawn_position;
        let update = self.streamer.update_around(spawn, &mut self.grid);
        info!(
            "Run started on '{}' with {} chunks and {} objects",
            self.config.name,
            update.loaded.len(),
            self.grid.len()
        );
        Ok(())
    }

    /// Freezes the run.
    pub fn pause(&mut self) -> Result<(), PhaseError> {
        self.phase.pause()
    }

    /// Unfreezes the run.
    pub fn resume(&mut self) -> Result<(), PhaseError> {
        self.phase.resume()
    }

    /// Drops all world state and returns to `Ready`.
    pub fn reset(&mut self) {
        self.streamer = ChunkStreamer::new(Arc::clone(&self.config));
        self.grid.clear();
        self.bus.drain();
        self.score.reset();
        self.killed_by = None;
        self.phase.reset();
        self.ticks = 0;
        self.elapsed = 0.0;
    }

    /// Advances one frame with the player at `player`.
    ///
    /// Does nothing unless playing. A death ends the run.
    pub fn tick(&mut self, player: Vec3, dt: f32) -> SweepResult {
        if !self.phase.is_playing() {
            return SweepResult::default();
        }

        self.streamer.update_around(player, &mut self.grid);
        self.streamer.advance_dynamic(dt, &mut self.grid);
        let result = self
            .sweep
            .run(self.phase, player, &mut self.grid, &mut self.streamer);

        self.bus.publish_all(result.events());
        self.score.apply(&self.bus.drain());
        self.ticks += 1;
        self.elapsed += f64::from(dt);

        if result.died {
            self.killed_by = result.killed_by;
            if let Err(e) = self.phase.end() {
                warn!("Could not end run: {e}");
            }
            info!(
                "Run over after {} ticks ({:.1}s), score {}",
                self.ticks,
                self.elapsed,
                self.score.score()
            );
        }
        result
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Running totals.
    #[must_use]
    pub const fn score(&self) -> &ScoreTracker {
        &self.score
    }

    /// The object that ended the run, once it is over.
    #[must_use]
    pub const fn killed_by(&self) -> Option<ObjectId> {
        self.killed_by
    }

    /// The chunk streamer.
    #[must_use]
    pub const fn streamer(&self) -> &ChunkStreamer {
        &self.streamer
    }

    /// The spatial grid.
    #[must_use]
    pub const fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// The level being played.
    #[must_use]
    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    /// Ticks simulated while playing.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Seconds simulated while playing.
    #[must_use]
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontier_world::PlacedObject;

    const DT: f32 = 1.0 / 60.0;

    fn started() -> Simulation {
        let mut sim = Simulation::new(Arc::new(LevelConfig::default()));
        sim.start().expect("start");
        sim
    }

    fn find(sim: &Simulation, pred: impl Fn(&PlacedObject) -> bool) -> Option<Vec3> {
        sim.streamer()
            .loaded_coords()
            .into_iter()
            .filter_map(|c| sim.streamer().chunk(c).ok())
            .flat_map(|chunk| chunk.objects.iter())
            .find(|o| pred(*o))
            .map(|o| o.position)
    }

    #[test]
    fn test_ready_tick_is_noop() {
        let mut sim = Simulation::new(Arc::new(LevelConfig::default()));
        let result = sim.tick(Vec3::ZERO, DT);
        assert!(result.is_empty());
        assert_eq!(sim.streamer().loaded_count(), 0);
        assert_eq!(sim.ticks(), 0);
    }

    #[test]
    fn test_start_streams_around_spawn() {
        let sim = started();
        assert!(sim.phase().is_playing());
        assert_eq!(sim.streamer().loaded_count(), 25);
        assert!(!sim.grid().is_empty());
    }

    #[test]
    fn test_spawn_is_safe() {
        let mut sim = started();
        let spawn = sim.config().world.player_spawn_position;
        let result = sim.tick(spawn, DT);
        assert!(!result.died);
        assert!(sim.phase().is_playing());
    }

    #[test]
    fn test_running_into_obstacle_ends_run() {
        let mut sim = started();
        let rock = find(&sim, |o| o.collidable && !o.is_dynamic && !o.is_enemy())
            .expect("meadow has static obstacles");
        let result = sim.tick(rock, DT);
        assert!(result.died);
        assert!(sim.phase().is_over());
        assert!(sim.score().is_dead());
        assert_eq!(sim.killed_by(), result.killed_by);
        assert!(sim.killed_by().is_some());

        let ticks = sim.ticks();
        assert!(sim.tick(rock, DT).is_empty());
        assert_eq!(sim.ticks(), ticks);
    }

    #[test]
    fn test_picking_up_coin_scores() {
        let mut sim = started();
        let coin = find(&sim, PlacedObject::is_collectible).expect("meadow has coins");
        let result = sim.tick(coin, DT);
        assert!(result.score_delta >= 10);
        assert_eq!(sim.score().score(), i64::from(result.score_delta));
        assert_eq!(sim.score().collected() as usize, result.collected.len());
    }

    #[test]
    fn test_pause_freezes_world() {
        let mut sim = started();
        let coin = find(&sim, PlacedObject::is_collectible).expect("meadow has coins");
        sim.pause().expect("pause");
        assert!(sim.tick(coin, DT).is_empty());
        assert_eq!(sim.score().score(), 0);
        sim.resume().expect("resume");
        assert!(sim.tick(coin, DT).score_delta > 0);
    }

    #[test]
    fn test_tick_streams_around_player() {
        let mut sim = started();
        let far = Vec3::new(0.0, 0.0, -400.0);
        sim.tick(far, DT);
        let coords = sim.streamer().loaded_coords();
        assert_eq!(coords.len(), 25);
        assert!(coords.iter().all(|c| (-6..=-2).contains(&c.z)));
    }

    #[test]
    fn test_reset_returns_to_ready() {
        let mut sim = started();
        let coin = find(&sim, PlacedObject::is_collectible).expect("meadow has coins");
        sim.tick(coin, DT);
        sim.reset();
        assert_eq!(sim.phase(), GamePhase::Ready);
        assert!(sim.killed_by().is_none());
        assert_eq!(sim.score().score(), 0);
        assert!(sim.grid().is_empty());
        assert_eq!(sim.streamer().loaded_count(), 0);
        sim.start().expect("restart");
        assert!(sim.phase().is_playing());
    }
}
