//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only, threaded through explicitly
//! - Stable iteration order (entity lists keep spawn order)
//! - No rendering, audio or input dependencies

pub mod ai;
pub mod collision;
pub mod entity;
pub mod level;
pub mod map;
pub mod state;
pub mod steering;
pub mod tick;

pub use collision::{Participant, overlaps, run_collisions};
pub use entity::{
    Control, DemoBrain, EntityId, EntityKind, Flag, FlagKind, Heading, Player, PursuitCar, Rock,
    Smoke, Vehicle,
};
pub use level::{Level, generate_level, is_challenging};
pub use map::{TileKind, TileMap};
pub use state::{GameEvent, GamePhase, GameState, Mode, RoundOutcome};
pub use tick::{TickInput, tick};
