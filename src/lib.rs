//! Starfighter core - entity and update engine for a top-down space shooter
//!
//! Core modules:
//! - `sim`: Entities, strategies, reentrant-safe groups and the tick loop
//! - `settings`: Data-driven game configuration
//! - `error`: Contract violations reported by the core
//!
//! Rendering, input capture and windowing live outside this crate and talk to
//! it through the observer traits in [`sim`].

pub mod error;
pub mod settings;
pub mod sim;

pub use error::CoreError;
pub use settings::{Controls, GameConfig, PlayerConfig};

use glam::DVec2;

/// Game configuration constants
pub mod consts {
    /// Diameter of a freshly constructed entity
    pub const DEFAULT_ENTITY_SIZE: u32 = 32;

    /// Compass bearings in degrees. Screen space: y grows downwards.
    pub const EAST: f64 = 0.0;
    pub const SOUTH_EAST: f64 = 45.0;
    pub const SOUTH: f64 = 90.0;
    pub const SOUTH_WEST: f64 = 135.0;
    pub const WEST: f64 = 180.0;
    pub const NORTH_WEST: f64 = 225.0;
    pub const NORTH: f64 = 270.0;
    pub const NORTH_EAST: f64 = 315.0;

    /// Pick-ups are drawn pointing up
    pub const PICK_UP_ROTATION: f64 = -90.0;

    /// Size cap applied by the size-and-speed laser upgrade
    pub const MAX_UPGRADED_BULLET_SIZE: i32 = 32;
    /// Speed floor applied by the size-and-speed laser upgrade
    pub const MIN_UPGRADED_BULLET_SPEED: f64 = 1.0;
}

/// Normalized angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to 360
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Signed shortest turn from `from` to `to`, in [-180, 180)
#[inline]
pub fn angle_delta(from: f64, to: f64) -> f64 {
    normalize_degrees(to - from + 180.0) - 180.0
}

/// Offset of `distance` along bearing `angle_deg` (0 = east, 90 = south)
#[inline]
pub fn polar_offset(angle_deg: f64, distance: f64) -> DVec2 {
    let rad = angle_deg.to_radians();
    DVec2::new(distance * rad.cos(), distance * rad.sin())
}

/// Bearing in degrees from `from` towards `to`, in [0, 360)
#[inline]
pub fn bearing_degrees(from: DVec2, to: DVec2) -> f64 {
    let d = to - from;
    normalize_degrees(d.y.atan2(d.x).to_degrees())
}
