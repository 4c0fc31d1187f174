//! Error types for Project Frontier.

use thiserror::Error;

/// Top-level error type for Frontier operations.
#[derive(Debug, Error)]
pub enum FrontierError {
    /// Level configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// World/chunk errors
    #[error("World error: {0}")]
    World(#[from] WorldError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Level configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config {path}: {source}")]
    Read {
        /// Path that failed
        path: String,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Config text could not be parsed
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// A field holds a value the generators cannot work with
    #[error("Invalid config field `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field
        field: String,
        /// What is wrong with it
        reason: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::Invalid`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// World and chunk errors.
#[derive(Debug, Error)]
pub enum WorldError {
    /// Chunk is not currently loaded
    #[error("Chunk not loaded at ({x}, {z})")]
    ChunkNotLoaded {
        /// X coordinate
        x: i32,
        /// Z coordinate
        z: i32,
    },
}

/// Result type alias for Frontier operations.
pub type FrontierResult<T> = Result<T, FrontierError>;

/// Result type for config loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for world operations.
pub type WorldResult<T> = Result<T, WorldError>;
