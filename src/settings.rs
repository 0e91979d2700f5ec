//! Game configuration
//!
//! Everything tunable about a game lives in [`GameConfig`]. Configs are plain
//! serde data: missing JSON fields fall back to their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::sim::{BasicLaser, GameKey, SpawnConfig};

/// Player ship tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub size: u32,
    pub start_x: f64,
    pub start_y: f64,
    pub max_hitpoints: i32,
    pub hitpoints: i32,
    /// Degrees turned per tick while a turn key is held
    pub turn_speed: f64,
    pub max_speed: f64,
    /// Speed added per tick while accelerating
    pub speed_gain: f64,
    /// Fraction of speed lost per tick when coasting
    pub regular_speed_loss: f64,
    /// Fraction of speed lost per tick while braking
    pub slow_down_speed_loss: f64,
    /// Score for every target killed by the player's bullets
    pub score_per_kill: i64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            size: 32,
            start_x: 200.0,
            start_y: 200.0,
            max_hitpoints: 100,
            hitpoints: 5,
            turn_speed: 7.0,
            max_speed: 6.0,
            speed_gain: 0.10,
            regular_speed_loss: 0.02,
            slow_down_speed_loss: 0.08,
            score_per_kill: 50,
        }
    }
}

/// Key bindings of the player ship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Controls {
    pub shoot: GameKey,
    pub forward: GameKey,
    pub slow_down: GameKey,
    pub turn_right: GameKey,
    pub turn_left: GameKey,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            shoot: GameKey::Space,
            forward: GameKey::Up,
            slow_down: GameKey::Down,
            turn_right: GameKey::Right,
            turn_left: GameKey::Left,
        }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub player: PlayerConfig,
    /// Terminal link of the player's laser chain
    pub laser: BasicLaser,
    pub controls: Controls,
    pub spawn: SpawnConfig,
}

fn invalid(reason: impl Into<String>) -> CoreError {
    CoreError::InvalidConfig {
        reason: reason.into(),
    }
}

fn check_rate(name: &str, value: f64) -> Result<(), CoreError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be a finite, non-negative number, got {value}")))
    }
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str(json).map_err(|err| invalid(err.to_string()))
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(self).map_err(|err| invalid(err.to_string()))
    }

    /// Load a config file, falling back to the defaults when it cannot be
    /// read, parsed or validated
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let loaded = std::fs::read_to_string(path)
            .map_err(|err| invalid(err.to_string()))
            .and_then(|json| Self::from_json(&json))
            .and_then(|config| config.validate().map(|()| config));

        match loaded {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(err) => {
                log::warn!("Using default config, {} rejected: {}", path.display(), err);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let player = &self.player;
        if player.size == 0 {
            return Err(invalid("player.size must be at least 1"));
        }
        if player.max_hitpoints < 1 {
            return Err(invalid("player.max_hitpoints must be at least 1"));
        }
        if !player.start_x.is_finite() || !player.start_y.is_finite() {
            return Err(invalid("player start position must be finite"));
        }
        check_rate("player.turn_speed", player.turn_speed)?;
        check_rate("player.max_speed", player.max_speed)?;
        check_rate("player.speed_gain", player.speed_gain)?;
        check_rate("player.regular_speed_loss", player.regular_speed_loss)?;
        check_rate("player.slow_down_speed_loss", player.slow_down_speed_loss)?;

        if self.laser.cooldown_time < 0 {
            return Err(invalid("laser.cooldown_time must not be negative"));
        }
        if !self.laser.bullet_speed.is_finite() {
            return Err(invalid("laser.bullet_speed must be finite"));
        }

        self.spawn.validate()
    }
}
