//! Session state and round lifecycle
//!
//! Everything the tick mutates lives here. The presentation layer drives a
//! game with `start_game`, `start_level`, `start_life`, then `end_life` or
//! `next_level` once a round is decided, and finally `end_game`.
//! `finish_round` runs that sequence the way the arcade loop does.

use glam::IVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::audio::{AudioCue, Jukebox, MusicCommand};
use crate::consts::{DRAIN_BONUS, STUN_TICKS};
use crate::error::{ConfigError, ConfigResult};
use crate::highscores::HighScore;
use crate::settings::Settings;

use super::entity::{Control, DemoBrain, EntityId, Flag, FlagKind, Player, PursuitCar, Rock, Smoke};
use super::level::{generate_level, is_challenging};
use super::map::TileMap;

/// Who is at the wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// A real player feeding `TickInput`
    Play,
    /// Attract mode: autopilot, one life, limited time
    Demo,
}

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No game started
    Idle,
    /// Level loaded, waiting for `start_life`
    Ready,
    /// Cars are moving
    Running,
    /// Lucky flag: fuel turns into points, then the tank is restored
    LuckyDrain { restore: u32 },
    /// Level cleared: leftover fuel turns into points
    LevelBonus,
    /// Round decided, waiting for `end_life`/`next_level`
    RoundOver,
    /// Game ended
    GameOver,
}

/// How a round ended; more than one can hold at once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub crashed: bool,
    pub out_of_fuel: bool,
    pub complete: bool,
    /// Demo time limit reached
    pub timed_out: bool,
}

impl RoundOutcome {
    pub fn life_lost(&self) -> bool {
        self.crashed || self.out_of_fuel
    }

    pub fn is_decided(&self) -> bool {
        self.life_lost() || self.complete || self.timed_out
    }
}

/// Signals for the presentation layer, drained with `take_events`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    FlagCollected {
        id: EntityId,
        kind: FlagKind,
        value: u64,
    },
    /// Fuel dropped below the threshold (once per life)
    FuelLow,
    /// Tank empty; the car has stopped
    FuelOut,
    Crashed,
    LifeLost,
    LevelComplete,
    GameOver,
    NewHighScore(u64),
    DemoFinished,
    Music(MusicCommand),
}

/// Complete session state (deterministic for a given seed and input)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// The one random source for generation and AI
    pub rng: Pcg32,
    pub mode: Mode,
    pub phase: GamePhase,
    /// Current level (1-based)
    pub level: u32,
    pub lives: u8,
    pub score: u64,
    /// Points the next flag is worth
    pub score_flag: u64,
    pub hi_score: HighScore,
    /// This level's derived map
    pub map: TileMap,
    /// Start tile and heading of each pursuit car on this level
    pub roster: Vec<(IVec2, IVec2)>,
    pub player: Player,
    /// Pursuit cars (sorted by id)
    pub cars: Vec<PursuitCar>,
    /// Flags, collected ones linger until their timer runs out
    pub flags: Vec<Flag>,
    pub rocks: Vec<Rock>,
    pub smoke: Vec<Smoke>,
    pub outcome: RoundOutcome,
    /// Fuel went low this life (releases parked cars once)
    pub fuel_low: bool,
    pub jukebox: Jukebox,
    /// Ticks since `start_life`
    pub round_ticks: u64,
    /// Ticks since the session was created
    pub time_ticks: u64,
    pub events: Vec<GameEvent>,
    intro_pending: bool,
    next_id: u32,
}

impl GameState {
    /// Empty session; nothing is loaded until `start_game`/`start_level`
    pub fn new(settings: &Settings, seed: u64, mode: Mode) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            mode,
            phase: GamePhase::Idle,
            level: 1,
            lives: 0,
            score: 0,
            score_flag: 0,
            hi_score: HighScore::new(settings.hi_score),
            map: TileMap::new(Vec::new(), settings.tile_size),
            roster: Vec::new(),
            player: Player::new(EntityId(0), IVec2::ZERO, settings.car_speed, Control::Manual),
            cars: Vec::new(),
            flags: Vec::new(),
            rocks: Vec::new(),
            smoke: Vec::new(),
            outcome: RoundOutcome::default(),
            fuel_low: false,
            jukebox: Jukebox::new(),
            round_ticks: 0,
            time_ticks: 0,
            events: Vec::new(),
            intro_pending: false,
            next_id: 1,
        }
    }

    /// Start a game and its first life in one go
    pub fn begin(settings: &Settings, seed: u64, mode: Mode) -> ConfigResult<Self> {
        let mut state = Self::new(settings, seed, mode);
        state.start_game(settings);
        state.start_level(settings)?;
        state.start_life(settings);
        Ok(state)
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        EntityId(id)
    }

    pub fn is_challenging(&self) -> bool {
        is_challenging(self.level)
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self.phase,
            GamePhase::Running | GamePhase::LuckyDrain { .. } | GamePhase::LevelBonus
        )
    }

    /// Flags still waiting to be collected
    pub fn remaining_flags(&self) -> usize {
        self.flags.iter().filter(|f| !f.is_collected()).count()
    }

    /// Hand the queued events to the caller
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // === Lifecycle ===

    /// Reset score, level and lives
    pub fn start_game(&mut self, settings: &Settings) {
        self.score = 0;
        self.level = 1;
        self.lives = match self.mode {
            Mode::Play => settings.lives,
            Mode::Demo => 1,
        };
        self.hi_score.begin_game();
        self.intro_pending = self.mode == Mode::Play;
        self.phase = GamePhase::Ready;
        log::info!("Game started ({:?}, seed {})", self.mode, self.seed);
    }

    /// Derive the map and place flags and rocks for the current level
    pub fn start_level(&mut self, settings: &Settings) -> ConfigResult<()> {
        let level = generate_level(settings, self.level, &mut self.rng)?;

        let starts = std::iter::once(settings.player_start)
            .chain(level.roster.iter().map(|&(tile, _)| tile));
        for tile in starts {
            if !level.map.is_open(tile) {
                return Err(ConfigError::BlockedStart {
                    x: tile.x,
                    y: tile.y,
                });
            }
        }

        self.flags = level
            .flags
            .iter()
            .map(|&(tile, kind)| {
                let id = self.next_entity_id();
                Flag::new(id, level.map.to_pixel(tile), kind)
            })
            .collect();
        self.rocks = level
            .rocks
            .iter()
            .map(|&tile| Rock {
                id: self.next_entity_id(),
                pos: level.map.to_pixel(tile),
            })
            .collect();
        self.roster = level.roster;
        self.map = level.map;
        self.phase = GamePhase::Ready;
        Ok(())
    }

    /// Put the cars on the grid and fill the tank
    ///
    /// Can run several times per level; flags and rocks stay as they are.
    pub fn start_life(&mut self, settings: &Settings) {
        let challenging = self.is_challenging();

        let control = match self.mode {
            Mode::Play => Control::Manual,
            Mode::Demo => Control::Demo(DemoBrain {
                laziness: settings.demo_laziness,
                ..Default::default()
            }),
        };
        let id = self.next_entity_id();
        let start = self.map.to_pixel(settings.player_start);
        self.player = Player::new(id, start, settings.car_speed, control);

        let capacity = settings.fuel_capacity(challenging);
        self.player.refuel(capacity, settings.fuel_low(capacity));

        let roster = std::mem::take(&mut self.roster);
        self.cars = roster
            .iter()
            .map(|&(tile, heading)| {
                let id = self.next_entity_id();
                let mut car = PursuitCar::new(
                    id,
                    self.map.to_pixel(tile),
                    settings.pursuit_speed(),
                    heading,
                    settings.pursuit_laziness,
                    STUN_TICKS,
                );
                car.immobile = challenging;
                car
            })
            .collect();
        self.roster = roster;

        self.smoke.clear();
        for flag in &mut self.flags {
            flag.targeted = false;
        }
        self.outcome = RoundOutcome::default();
        self.fuel_low = false;
        self.score_flag = 100 * u64::from(self.level);
        self.round_ticks = 0;

        let cue = if std::mem::take(&mut self.intro_pending) {
            AudioCue::RoundIntro
        } else {
            AudioCue::MainTheme
        };
        let command = self.jukebox.play(cue);
        self.events.push(GameEvent::Music(command));

        self.phase = GamePhase::Running;
        log::info!(
            "Life started: level {}, {} lives, {} cars, fuel {}",
            self.level,
            self.lives,
            self.cars.len(),
            capacity
        );
    }

    /// A crash or an empty tank cost a life
    pub fn end_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        let command = self.jukebox.stop();
        self.events.push(GameEvent::Music(command));
        log::info!("Life lost, {} left", self.lives);
    }

    pub fn next_level(&mut self) {
        self.level += 1;
    }

    /// Close the game and report a new high score
    pub fn end_game(&mut self) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        if self.jukebox.current().is_some() {
            let command = self.jukebox.stop();
            self.events.push(GameEvent::Music(command));
        }
        if self.hi_score.settle() {
            self.events.push(GameEvent::NewHighScore(self.hi_score.best));
            log::info!("New high score: {}", self.hi_score.best);
        }
        self.events.push(GameEvent::GameOver);
        self.phase = GamePhase::GameOver;
        log::info!("Game over: score {}, level {}", self.score, self.level);
    }

    /// Quit at a tick boundary, dropping the rest of the round
    pub fn abort(&mut self) {
        if self.phase != GamePhase::Idle {
            log::info!("Game aborted");
            self.end_game();
        }
    }

    /// Move on from a decided round the way the arcade loop does
    ///
    /// Demo sessions end here. Otherwise a lost life is paid for, a cleared
    /// level loads the next one, and play resumes while lives remain.
    pub fn finish_round(&mut self, settings: &Settings) -> ConfigResult<()> {
        if self.phase != GamePhase::RoundOver {
            return Ok(());
        }
        if self.mode == Mode::Demo {
            self.events.push(GameEvent::DemoFinished);
            self.end_game();
            return Ok(());
        }

        let outcome = self.outcome;
        if outcome.life_lost() {
            self.end_life();
        }
        if outcome.complete {
            self.next_level();
            self.start_level(settings)?;
        }
        if self.lives > 0 {
            self.start_life(settings);
        } else {
            self.end_game();
        }
        Ok(())
    }

    /// The audio collaborator finished a track
    pub fn music_ended(&mut self) {
        if self.phase != GamePhase::Running && !matches!(self.phase, GamePhase::LuckyDrain { .. }) {
            return;
        }
        let command = self.jukebox.track_ended(self.is_challenging(), self.fuel_low);
        self.events.push(GameEvent::Music(command));
    }

    // === Round bookkeeping ===

    /// Add points, lifting the high score as soon as it is passed
    pub fn add_score(&mut self, points: u64) {
        self.score += points;
        self.hi_score.observe(self.score);
    }

    /// Score a flag that was just collected
    pub fn flag_collected(&mut self, index: usize) {
        let Some(flag) = self.flags.get(index) else {
            return;
        };
        let (id, kind) = (flag.id, flag.kind);

        if kind == FlagKind::Special {
            self.score_flag *= 2;
        }
        let value = self.score_flag;
        self.flags[index].value = Some(value);
        self.add_score(value);
        self.events.push(GameEvent::FlagCollected { id, kind, value });

        let remaining = self.remaining_flags();
        log::debug!("Flag {:?} ({:?}) worth {}, {} left", id, kind, value, remaining);

        if kind == FlagKind::Lucky && remaining > 0 {
            self.phase = GamePhase::LuckyDrain {
                restore: self.player.fuel,
            };
        }
        if remaining == 0 {
            self.outcome.complete = true;
        }
    }

    /// Player hit a pursuit car or a rock
    pub fn player_crashed(&mut self) {
        if self.outcome.crashed {
            return;
        }
        self.outcome.crashed = true;
        self.player.crash();
        self.events.push(GameEvent::Crashed);
        log::info!("Crash at {}", self.player.car.pos);
    }

    /// First drop below the fuel threshold this life
    pub fn fuel_ran_low(&mut self) {
        if self.fuel_low {
            return;
        }
        self.fuel_low = true;
        if self.is_challenging() {
            for car in &mut self.cars {
                car.immobile = false;
            }
        }
        self.events.push(GameEvent::FuelLow);
        log::info!("Fuel low");
    }

    pub fn fuel_ran_out(&mut self) {
        if self.outcome.out_of_fuel {
            return;
        }
        self.outcome.out_of_fuel = true;
        self.events.push(GameEvent::FuelOut);
        log::info!("Out of fuel");
    }

    /// One tick of turning fuel into points; false once the tank is dry
    pub fn drain_fuel(&mut self, settings: &Settings) -> bool {
        if self.player.fuel == 0 {
            return false;
        }
        let unit = settings.drain_unit(self.player.fuel_capacity);
        self.player.fuel = self.player.fuel.saturating_sub(unit);
        self.add_score(DRAIN_BONUS);
        true
    }

    /// Drop a smoke screen one cell behind an aligned player
    pub fn make_smoke(&mut self) -> bool {
        let pos = self.player.car.pos;
        if !self.map.is_aligned(pos) {
            return false;
        }
        let size = self.map.tile_size();
        let behind = size / 2 + crate::signum_vec(-self.player.car.direction) * size;
        let tile = self.map.to_tile(pos + behind);
        if !self.map.is_open(tile) {
            return false;
        }
        let id = self.next_entity_id();
        self.smoke.push(Smoke::new(id, self.map.to_pixel(tile)));
        true
    }

    /// Settle a decided round: lost lives are reported, a cleared level
    /// drains its leftover fuel first
    pub fn close_round(&mut self) {
        if !self.outcome.is_decided() {
            return;
        }
        if self.outcome.life_lost() {
            self.events.push(GameEvent::LifeLost);
        }
        if self.outcome.complete {
            let command = self.jukebox.play(AudioCue::RoundComplete);
            self.events.push(GameEvent::Music(command));
            self.phase = GamePhase::LevelBonus;
        } else {
            self.phase = GamePhase::RoundOver;
        }
        log::info!("Round over: {:?}", self.outcome);
    }

    /// Leftover fuel drained after a cleared level
    pub fn level_bonus_done(&mut self) {
        let command = self.jukebox.stop();
        self.events.push(GameEvent::Music(command));
        self.events.push(GameEvent::LevelComplete);
        self.phase = GamePhase::RoundOver;
        log::info!("Level {} complete, score {}", self.level, self.score);
    }
}
