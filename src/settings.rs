//! Game settings
//!
//! One immutable value built at startup and handed by reference to the
//! session, the map and the level generator.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::consts::FRAMERATE;
use crate::error::{ConfigError, ConfigResult};

/// Stock track, 42x68 cells including a 5x6 scenery border.
const STOCK_TRACK: &str = include_str!("../assets/track.txt");

/// Game settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Timing ===
    /// Simulation ticks per second
    pub framerate: u32,

    // === Geometry ===
    /// Tile width/height in pixels (every sprite shares it)
    pub tile_size: IVec2,
    /// Visible play window in pixels
    pub viewport: IVec2,
    /// Map template, one string per row
    pub template: Vec<String>,
    /// Scenery border around the play area (columns, rows)
    pub map_border: IVec2,
    /// Play area size in tiles (columns, rows)
    pub play_area: IVec2,
    /// Inclusive corner tiles of the start zone kept free of flags
    pub start_area_min: IVec2,
    pub start_area_max: IVec2,

    // === Vehicles ===
    /// Player speed in pixels per tick
    pub car_speed: i32,
    /// Extra pixels per tick for pursuit cars
    pub pursuit_speed_advantage: i32,
    /// Pursuit steering acts on one tick in `pursuit_laziness + 1`
    pub pursuit_laziness: u32,
    /// Demo steering acts on one tick in `demo_laziness + 1`
    pub demo_laziness: u32,
    /// Demo car smokes when a pursuer is closer than this many tiles
    pub demo_threat_tiles: i32,
    /// Player start tile
    pub player_start: IVec2,
    /// Pursuit cars on every level (heading up)
    pub pursuit_starts: Vec<IVec2>,
    /// Extra pursuit cars on even levels (heading up)
    pub even_level_starts: Vec<IVec2>,
    /// Oncoming cars on challenging levels (heading down)
    pub oncoming_starts: Vec<IVec2>,

    // === Fuel ===
    /// Seconds of fuel on a normal level
    pub game_fuel_seconds: u32,
    /// Seconds of fuel on a challenging level
    pub challenging_fuel_seconds: u32,
    /// Extra fuel spent per smoke screen
    pub smoke_penalty: u32,

    // === Session ===
    /// Lives at game start
    pub lives: u8,
    /// High score before anybody has played
    pub hi_score: u64,
    /// Seconds a demo run lasts
    pub demo_seconds: u32,
}

impl Default for Settings {
    fn default() -> Self {
        let border = IVec2::new(5, 6);
        let at = |x: i32, y: i32| border + IVec2::new(x, y);
        Self {
            framerate: FRAMERATE,

            tile_size: IVec2::new(24, 24),
            viewport: IVec2::new(560, 480),
            template: STOCK_TRACK.lines().map(str::to_owned).collect(),
            map_border: border,
            play_area: IVec2::new(32, 56),
            start_area_min: at(10, 48),
            start_area_max: at(20, 55),

            car_speed: 12,
            pursuit_speed_advantage: 1,
            pursuit_laziness: 5,
            demo_laziness: 8,
            demo_threat_tiles: 5,
            player_start: at(15, 50),
            pursuit_starts: vec![at(13, 54), at(15, 54), at(17, 54)],
            even_level_starts: vec![at(11, 54), at(19, 54)],
            oncoming_starts: vec![at(13, 1), at(15, 1), at(17, 1)],

            game_fuel_seconds: 100,
            challenging_fuel_seconds: 50,
            smoke_penalty: 12,

            lives: 3,
            hi_score: 20_000,
            demo_seconds: 50,
        }
    }
}

impl Settings {
    /// Parse settings from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let settings: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Settings(e.to_string()))?;
        settings.validate()?;
        log::info!(
            "Loaded settings: tile {}x{}, {} template rows",
            settings.tile_size.x,
            settings.tile_size.y,
            settings.template.len()
        );
        Ok(settings)
    }

    /// Reject values the simulation cannot work with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.tile_size.x <= 0 || self.tile_size.y <= 0 {
            return Err(ConfigError::Settings(format!(
                "tile size must be positive, got {}x{}",
                self.tile_size.x, self.tile_size.y
            )));
        }
        if self.framerate == 0 {
            return Err(ConfigError::Settings("framerate must be positive".into()));
        }
        if self.car_speed <= 0 || self.car_speed > self.tile_size.x.min(self.tile_size.y) {
            return Err(ConfigError::Settings(format!(
                "car speed {} must be within one tile",
                self.car_speed
            )));
        }
        if self.pursuit_speed() > self.tile_size.x.min(self.tile_size.y) {
            return Err(ConfigError::Settings(format!(
                "pursuit speed {} must be within one tile",
                self.pursuit_speed()
            )));
        }
        if self.start_area_min.cmpgt(self.start_area_max).any() {
            return Err(ConfigError::Settings("start area corners are inverted".into()));
        }
        Ok(())
    }

    /// Pursuit car speed in pixels per tick
    pub fn pursuit_speed(&self) -> i32 {
        self.car_speed + self.pursuit_speed_advantage
    }

    /// Full tank for a level
    pub fn fuel_capacity(&self, challenging: bool) -> u32 {
        let seconds = if challenging {
            self.challenging_fuel_seconds
        } else {
            self.game_fuel_seconds
        };
        self.framerate * seconds
    }

    /// Fuel level below which the car slows down
    pub fn fuel_low(&self, capacity: u32) -> u32 {
        capacity / 5
    }

    /// Fuel spent per bonus-drain tick
    pub fn drain_unit(&self, capacity: u32) -> u32 {
        (capacity / (10 * self.framerate)).max(1)
    }

    /// Pixel distance under which the demo car feels threatened
    pub fn demo_threat_radius(&self) -> f32 {
        (self.tile_size.x * self.demo_threat_tiles) as f32
    }

    /// Tick budget of a demo run
    pub fn demo_tick_limit(&self) -> u64 {
        u64::from(self.framerate) * u64::from(self.demo_seconds)
    }

    /// Ticks per radar blink phase
    pub fn blink_ticks(&self) -> u64 {
        u64::from((self.framerate / 2).max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_track_dimensions() {
        let settings = Settings::default();
        assert_eq!(settings.template.len(), 68);
        assert!(settings.template.iter().all(|row| row.len() == 42));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_fuel_figures() {
        let settings = Settings::default();
        assert_eq!(settings.fuel_capacity(false), 3000);
        assert_eq!(settings.fuel_capacity(true), 1500);
        assert_eq!(settings.fuel_low(3000), 600);
        assert_eq!(settings.drain_unit(3000), 10);
        assert_eq!(settings.drain_unit(1500), 5);
    }

    #[test]
    fn test_from_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{ "car_speed": 8, "lives": 5 }"#).unwrap();
        assert_eq!(settings.car_speed, 8);
        assert_eq!(settings.lives, 5);
        assert_eq!(settings.pursuit_speed(), 9);
        assert_eq!(settings.template.len(), 68);
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        assert!(Settings::from_json(r#"{ "tile_size": [0, 24] }"#).is_err());
        assert!(Settings::from_json(r#"{ "car_speed": 40 }"#).is_err());
        assert!(Settings::from_json("not json").is_err());
    }
}
