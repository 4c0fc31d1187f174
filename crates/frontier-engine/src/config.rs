//! Engine configuration.
//!
//! Provides the parameters of a headless run: which level to load, how fast
//! the simulation ticks and how the autopilot steers. Configuration can be
//! loaded from and saved to a file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "frontier.toml";

/// Engine configuration parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Level ===
    /// Level file to load (None = built-in meadow level)
    pub level_path: Option<PathBuf>,
    /// Replaces the level's world seed when set
    pub seed_override: Option<String>,

    // === Simulation ===
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Stop after this many ticks even if the player survives
    pub max_ticks: u64,
    /// Log a progress line every this many ticks (0 = never)
    pub report_interval: u64,

    // === Autopilot ===
    /// Forward speed along -Z in units per second
    pub run_speed: f32,
    /// Lateral weave amplitude in world units
    pub weave_amplitude: f32,
    /// Weave cycles per 100 units of forward travel
    pub weave_frequency: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            level_path: None,
            seed_override: None,

            tick_rate: 60,
            max_ticks: 60 * 120,
            report_interval: 600,

            run_speed: 20.0,
            weave_amplitude: 6.0,
            weave_frequency: 1.5,
        }
    }
}

impl EngineConfig {
    /// Load configuration from the working directory.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str::<Self>(&contents) {
            Ok(mut config) => {
                info!("Loaded config from {}", path.display());
                config.validate();
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.tick_rate = self.tick_rate.clamp(10, 240);
        self.max_ticks = self.max_ticks.max(1);
        if !self.run_speed.is_finite() {
            self.run_speed = Self::default().run_speed;
        }
        self.run_speed = self.run_speed.clamp(0.0, 200.0);
        if !self.weave_amplitude.is_finite() {
            self.weave_amplitude = 0.0;
        }
        self.weave_amplitude = self.weave_amplitude.abs();
        if !self.weave_frequency.is_finite() {
            self.weave_frequency = 0.0;
        }
    }

    /// Fixed simulation step in seconds.
    #[must_use]
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.tick_rate, 60);
        assert!(config.level_path.is_none());
        assert!((config.tick_dt() - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();

        config.tick_rate = 1;
        config.max_ticks = 0;
        config.run_speed = f32::NAN;
        config.weave_amplitude = -4.0;

        config.validate();

        assert_eq!(config.tick_rate, 10);
        assert_eq!(config.max_ticks, 1);
        assert_eq!(config.run_speed, 20.0);
        assert_eq!(config.weave_amplitude, 4.0);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join(CONFIG_FILE);

        let mut config = EngineConfig::default();
        config.level_path = Some(PathBuf::from("levels/meadow.toml"));
        config.seed_override = Some("abc".to_string());
        config.max_ticks = 42;

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = EngineConfig::load_from(&config_path);
        assert_eq!(loaded.level_path, config.level_path);
        assert_eq!(loaded.seed_override.as_deref(), Some("abc"));
        assert_eq!(loaded.max_ticks, 42);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = EngineConfig::load_from("/nonexistent/path/frontier.toml");
        assert_eq!(config.tick_rate, 60);
    }

    #[test]
    fn test_config_invalid_falls_back() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join(CONFIG_FILE);
        fs::write(&path, "tick_rate = \"fast\"").expect("write");
        let config = EngineConfig::load_from(&path);
        assert_eq!(config.tick_rate, 60);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: EngineConfig = toml::from_str("run_speed = 35.0").expect("parse");
        assert_eq!(config.run_speed, 35.0);
        assert_eq!(config.tick_rate, 60);
    }
}
