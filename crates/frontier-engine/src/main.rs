//! # Frontier Engine
//!
//! Headless entry point for Project Frontier - an endless runner over a
//! deterministic, chunk-streamed 3D world.
//!
//! This crate ties together all subsystems:
//! - World: Height field, terrain chunks, object placement, streaming
//! - Gameplay: Collision sweep, events, score, run lifecycle
//!
//! Usage: `frontier [config.toml]` (defaults to `frontier.toml` in the
//! working directory).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod config;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::EngineConfig;

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("frontier=info".parse()?))
        .init();

    info!("Project Frontier starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    };
    let level = app::load_level(&config)?;
    let summary = app::run(&config, level)?;

    match summary.killed_by {
        Some(id) => info!("Player died at {id} with score {}", summary.score),
        None => info!("Player survived {} ticks with score {}", summary.ticks, summary.score),
    }

    info!("Project Frontier shutdown complete");
    Ok(())
}
