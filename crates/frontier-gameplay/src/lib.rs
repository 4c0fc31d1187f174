//! # Frontier Gameplay
//!
//! Gameplay systems for Project Frontier.
//!
//! This crate turns the streamed world into a run:
//! - Per-tick collision and classification sweep
//! - Game events and the event bus
//! - Run lifecycle (ready, playing, paused, game over)
//! - Score bookkeeping
//! - The simulation context that ties them together

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod collision;
pub mod events;
pub mod game_state;
pub mod score;
pub mod simulation;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::collision::*;
    pub use crate::events::*;
    pub use crate::game_state::*;
    pub use crate::score::*;
    pub use crate::simulation::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use frontier_world::LevelConfig;
    use glam::Vec3;
    use std::sync::Arc;

    #[test]
    fn test_same_path_same_outcome() {
        let config = Arc::new(LevelConfig::default());
        let path: Vec<Vec3> = (0..240)
            .map(|i| Vec3::new((i as f32 * 0.1).sin() * 12.0, 0.0, 5.0 - i as f32 * 0.75))
            .collect();

        let run = |config: Arc<LevelConfig>| {
            let mut sim = Simulation::new(config);
            sim.start().expect("start");
            let mut events = Vec::new();
            for p in &path {
                events.extend_from_slice(sim.tick(*p, 1.0 / 60.0).events());
            }
            (events, sim.score().clone(), sim.phase())
        };

        assert_eq!(run(Arc::clone(&config)), run(config));
    }
}
