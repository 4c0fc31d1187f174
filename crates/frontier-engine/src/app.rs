//! Headless run loop.
//!
//! Drives a [`Simulation`] with an autopilot that runs down the -Z axis and
//! weaves across the path, at a fixed tick rate and without a window.

use std::sync::Arc;

use anyhow::{Context, Result};
use frontier_common::ObjectId;
use frontier_gameplay::{GamePhase, Simulation};
use frontier_world::LevelConfig;
use glam::Vec3;
use tracing::{debug, info};

use crate::config::EngineConfig;

/// Steers the player along the endless path.
#[derive(Debug, Clone)]
pub struct Autopilot {
    start: Vec3,
    speed: f32,
    amplitude: f32,
    /// Radians per unit of forward travel
    wavenumber: f32,
    travelled: f32,
}

impl Autopilot {
    /// Creates an autopilot starting at `start`.
    #[must_use]
    pub fn new(start: Vec3, config: &EngineConfig) -> Self {
        Self {
            start,
            speed: config.run_speed,
            amplitude: config.weave_amplitude,
            wavenumber: config.weave_frequency * std::f32::consts::TAU / 100.0,
            travelled: 0.0,
        }
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        let x = self.start.x + self.amplitude * (self.travelled * self.wavenumber).sin();
        Vec3::new(x, self.start.y, self.start.z - self.travelled)
    }

    /// Moves forward by `dt` seconds and returns the new position.
    pub fn advance(&mut self, dt: f32) -> Vec3 {
        self.travelled += self.speed * dt;
        self.position()
    }

    /// Forward distance covered.
    #[must_use]
    pub const fn travelled(&self) -> f32 {
        self.travelled
    }
}

/// What a headless run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Ticks simulated
    pub ticks: u64,
    /// Forward distance covered
    pub distance: f32,
    /// Final score
    pub score: i64,
    /// Collectibles picked up
    pub collected: u32,
    /// What ended the run, if the player died
    pub killed_by: Option<ObjectId>,
    /// Phase the run finished in
    pub phase: GamePhase,
}

/// Resolves the level a config asks for.
pub fn load_level(config: &EngineConfig) -> Result<LevelConfig> {
    let mut level = match &config.level_path {
        Some(path) => LevelConfig::load_from(path)
            .with_context(|| format!("loading level {}", path.display()))?,
        None => {
            info!("No level configured, using the built-in meadow");
            LevelConfig::default()
        },
    };
    if let Some(seed) = &config.seed_override {
        info!("Seed override: '{seed}'");
        level.world.seed.clone_from(seed);
    }
    level.validate().context("validating level")?;
    Ok(level)
}

/// Runs one level until the player dies or the tick limit is reached.
pub fn run(config: &EngineConfig, level: LevelConfig) -> Result<RunSummary> {
    let level = Arc::new(level);
    let mut sim = Simulation::new(Arc::clone(&level));
    sim.start().context("starting run")?;

    let dt = config.tick_dt();
    let mut pilot = Autopilot::new(level.world.player_spawn_position, config);
    let mut position = pilot.position();

    while sim.phase().is_playing() && sim.ticks() < config.max_ticks {
        let result = sim.tick(position, dt);
        if !result.collected.is_empty() {
            debug!(
                "Tick {}: picked up {} (+{})",
                sim.ticks(),
                result.collected.len(),
                result.score_delta
            );
        }
        if config.report_interval > 0 && sim.ticks() % config.report_interval == 0 {
            info!(
                "Tick {}: z = {:.0}, score {}, {} chunks, {} objects indexed",
                sim.ticks(),
                position.z,
                sim.score().score(),
                sim.streamer().loaded_count(),
                sim.grid().len()
            );
        }
        position = pilot.advance(dt);
    }

    let summary = RunSummary {
        ticks: sim.ticks(),
        distance: pilot.travelled(),
        score: sim.score().score(),
        collected: sim.score().collected(),
        killed_by: sim.killed_by(),
        phase: sim.phase(),
    };
    info!(
        "Run finished: {:?} after {} ticks, {:.0} units, score {} ({} pickups)",
        summary.phase, summary.ticks, summary.distance, summary.score, summary.collected
    );
    Ok(summary)
}
