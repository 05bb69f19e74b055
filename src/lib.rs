//! Flag Rally - a top-down tile-grid rally game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (map, vehicles, AI, collisions, rounds)
//! - `settings`: Immutable game configuration
//! - `view`: Per-tick render and panel snapshot for the presentation layer
//! - `audio`: Named music cues (playback lives elsewhere)
//! - `highscores`: Process-lifetime high score

pub mod audio;
pub mod error;
pub mod highscores;
pub mod settings;
pub mod sim;
pub mod view;

pub use error::{ConfigError, ConfigResult};
pub use highscores::HighScore;
pub use settings::Settings;

use glam::IVec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate (ticks per second)
    pub const FRAMERATE: u32 = 30;

    /// Facing angle increment per tick (degrees)
    pub const ANGLE_STEP: i32 = 15;

    /// Ticks a pursuit car stays stunned after a collision
    pub const STUN_TICKS: u32 = 50;
    /// Ticks a collected flag lingers (showing its score) before removal
    pub const FLAG_REMOVAL_TICKS: u32 = 50;
    /// Ticks a smoke screen lasts
    pub const SMOKE_TICKS: u32 = 50;
    /// Smoke charges granted by one smoke request
    pub const SMOKE_CHARGES: u8 = 3;

    /// Flags placed per level
    pub const FLAGS_PER_LEVEL: usize = 10;
    /// Sample buckets per axis used for placement
    pub const PLACEMENT_BUCKETS: usize = 10;
    /// Score added per tick while fuel drains into bonus points
    pub const DRAIN_BONUS: u64 = 20;
}

/// Sign of an integer as -1, 0 or 1
#[inline]
pub fn sign(x: i32) -> i32 {
    x.signum()
}

/// Component-wise sign of a vector
#[inline]
pub fn signum_vec(v: IVec2) -> IVec2 {
    IVec2::new(v.x.signum(), v.y.signum())
}
