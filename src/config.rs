//! Application Configuration
//!
//! Server and game settings, loaded from an optional JSON file. Every field
//! has a default, so a file only needs the values it changes:
//!
//! ```json
//! {
//!   "server": { "bind_addr": "127.0.0.1:9000", "binary_state": true },
//!   "game": { "max_player_count": 4, "physics": { "velocity_damping": 0.95 } }
//! }
//! ```

use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::controller::GameConfig;
use crate::network::server::{ServerConfig, MAX_FRAME_RATE};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// File is not valid JSON for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range
    #[error("invalid config value `{field}`: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Everything the binary needs to start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Network settings
    pub server: ServerConfig,
    /// Simulation settings
    pub game: GameConfig,
}

impl AppConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let game = &self.game;

        if game.time_step_ms == 0 {
            return Err(invalid("game.time_step_ms", "must be at least 1"));
        }
        if !(game.group_radius.is_finite() && game.group_radius > 0.0) {
            return Err(invalid("game.group_radius", "must be finite and positive"));
        }
        if !(game.mine_radius.is_finite() && game.mine_radius > 0.0) {
            return Err(invalid("game.mine_radius", "must be finite and positive"));
        }
        if !(game.group_mass.is_finite() && game.group_mass > 0.0) {
            return Err(invalid("game.group_mass", "must be finite and positive"));
        }
        if !(game.arena_half_extents.is_finite()
            && game.arena_half_extents.x > game.group_radius
            && game.arena_half_extents.y > game.group_radius)
        {
            return Err(invalid("game.arena_half_extents", "must be finite and larger than a group"));
        }
        if !(0.0..=1.0).contains(&game.physics.velocity_damping) {
            return Err(invalid("game.physics.velocity_damping", "must be within [0, 1]"));
        }
        if !(1..=MAX_FRAME_RATE).contains(&self.server.frame_rate) {
            return Err(invalid("server.frame_rate", "must be within [1, 1000]"));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
