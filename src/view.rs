//! Render and panel snapshot
//!
//! A `Frame` is everything the presentation layer needs to draw one tick:
//! the visible slice of the map, the sprites on it and the side panel with
//! its radar. It borrows nothing, so it can be serialized or sent away.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::settings::Settings;
use crate::sim::entity::{EntityKind, FlagKind};
use crate::sim::state::GameState;

/// Symbol shown for cells outside the grid
const SCENERY: char = '*';

/// Map cells covering the viewport, scrolled to keep the player centred
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileWindow {
    /// Top-left tile
    pub origin: IVec2,
    /// Pixel offset of the view inside the origin tile
    pub offset: IVec2,
    /// Columns and rows, including the partial ones at the edges
    pub size: IVec2,
    /// Visible symbols, one string per row
    pub rows: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub kind: EntityKind,
    /// Top-left pixel position in map space
    pub pos: IVec2,
    /// Facing in degrees (vehicles only)
    pub angle: i32,
    pub flag: Option<FlagKind>,
    /// Points shown in place of a collected flag
    pub value: Option<u64>,
    /// Player car wrecked
    pub crashed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarMarker {
    /// Tile inside the play area (border removed)
    pub tile: IVec2,
    pub kind: EntityKind,
    /// Demo autopilot's current target or threat
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub score: u64,
    pub hi_score: u64,
    pub lives: u8,
    pub level: u32,
    /// 0.0 (empty) to 1.0 (full)
    pub fuel_fraction: f32,
    /// Gauge switches colour below the threshold
    pub fuel_low: bool,
    pub radar: Vec<RadarMarker>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub tick: u64,
    pub window: TileWindow,
    pub sprites: Vec<Sprite>,
    pub panel: Panel,
}

impl Frame {
    /// Snapshot the session for drawing
    pub fn capture(state: &GameState, settings: &Settings) -> Self {
        Self {
            tick: state.time_ticks,
            window: window(state, settings),
            sprites: sprites(state),
            panel: panel(state, settings),
        }
    }
}

fn window(state: &GameState, settings: &Settings) -> TileWindow {
    let map = &state.map;
    let tile = map.tile_size();
    let centre_offset = (settings.viewport - tile) / 2;
    let corner = state.player.car.pos - centre_offset;

    let origin = map.to_tile(corner);
    let offset = map.cell_offset(corner);
    let size = settings.viewport / tile + IVec2::new(2, 1);

    let rows: Vec<String> = (0..size.y)
        .map(|dy| {
            (0..size.x)
                .map(|dx| {
                    map.symbol(origin + IVec2::new(dx, dy))
                        .map_or(SCENERY, char::from)
                })
                .collect::<String>()
        })
        .collect();

    TileWindow {
        origin,
        offset,
        size,
        rows,
    }
}

fn sprites(state: &GameState) -> Vec<Sprite> {
    let still = |kind, pos| Sprite {
        kind,
        pos,
        angle: 0,
        flag: None,
        value: None,
        crashed: false,
    };

    let mut sprites = Vec::with_capacity(
        state.flags.len() + state.smoke.len() + state.rocks.len() + state.cars.len() + 1,
    );
    sprites.extend(state.flags.iter().map(|f| Sprite {
        flag: Some(f.kind),
        value: f.value,
        ..still(EntityKind::Flag, f.pos)
    }));
    sprites.extend(state.smoke.iter().map(|s| still(EntityKind::Smoke, s.pos)));
    sprites.extend(state.rocks.iter().map(|r| still(EntityKind::Rock, r.pos)));
    sprites.extend(state.cars.iter().map(|c| Sprite {
        angle: c.car.angle,
        ..still(EntityKind::Pursuit, c.car.pos)
    }));
    sprites.push(Sprite {
        angle: state.player.car.angle,
        crashed: state.player.crashed,
        ..still(EntityKind::Player, state.player.car.pos)
    });
    sprites
}

fn panel(state: &GameState, settings: &Settings) -> Panel {
    let map = &state.map;
    let border = settings.map_border;
    let marker = |pos, kind, highlighted| RadarMarker {
        tile: map.to_tile(pos) - border,
        kind,
        highlighted,
    };

    let mut radar: Vec<RadarMarker> = state
        .cars
        .iter()
        .map(|c| marker(c.car.pos, EntityKind::Pursuit, c.targeted))
        .collect();
    radar.extend(
        state
            .flags
            .iter()
            .filter(|f| !f.is_collected())
            .map(|f| marker(f.pos, EntityKind::Flag, f.targeted)),
    );
    // The player's dot blinks
    if (state.time_ticks / settings.blink_ticks()) % 2 == 0 {
        radar.push(marker(state.player.car.pos, EntityKind::Player, false));
    }

    Panel {
        score: state.score,
        hi_score: state.hi_score.best,
        lives: state.lives,
        level: state.level,
        fuel_fraction: state.player.fuel_fraction(),
        fuel_low: state.player.is_fuel_low(),
        radar,
    }
}
