//! Fixed timestep simulation tick
//!
//! One tick: input intents, player (with the demo autopilot), pursuit cars,
//! smoke and flag timers, then the collision pass on the new positions.
//! The fuel drain phases replace all of that while they run.

use crate::settings::Settings;

use super::ai::{steer_demo, steer_pursuit, update_pursuit};
use super::collision::run_collisions;
use super::entity::{Control, FuelSignal, Heading};
use super::state::{GamePhase, GameState, Mode};
use super::steering::drive;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Direction key held this tick
    pub heading: Option<Heading>,
    /// Smoke key pressed this tick
    pub smoke: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, settings: &Settings, input: &TickInput) {
    match state.phase {
        GamePhase::Running => {}
        GamePhase::LuckyDrain { restore } => {
            count_tick(state);
            if !state.drain_fuel(settings) {
                state.player.fuel = restore;
                state.phase = GamePhase::Running;
            }
            check_demo_clock(state, settings);
            state.close_round();
            return;
        }
        GamePhase::LevelBonus => {
            count_tick(state);
            if !state.drain_fuel(settings) {
                state.level_bonus_done();
            }
            return;
        }
        _ => return,
    }

    count_tick(state);

    if state.player.control == Control::Manual {
        if let Some(heading) = input.heading {
            state.player.car.request(heading.unit());
        }
        if input.smoke {
            state.player.request_smoke();
        }
    }

    steer_demo(
        &mut state.player,
        &mut state.flags,
        &mut state.cars,
        settings.demo_threat_radius(),
        &mut state.rng,
    );
    update_player(state, settings);

    let target = state.player.car.pos;
    for car in &mut state.cars {
        steer_pursuit(car, target, &mut state.rng);
        update_pursuit(car, &state.map, &mut state.rng);
    }

    state.smoke.retain_mut(|smoke| !smoke.tick());
    state.flags.retain_mut(|flag| !flag.tick());

    run_collisions(state);

    check_demo_clock(state, settings);
    state.close_round();
}

fn count_tick(state: &mut GameState) {
    state.time_ticks += 1;
    state.round_ticks += 1;
}

/// Demo runs end after a fixed number of ticks
fn check_demo_clock(state: &mut GameState, settings: &Settings) {
    if state.mode == Mode::Demo && state.round_ticks >= settings.demo_tick_limit() {
        state.outcome.timed_out = true;
    }
}

/// Burn fuel, drop smoke if asked, then drive
fn update_player(state: &mut GameState, settings: &Settings) {
    let signal = state.player.burn(1);
    apply_fuel_signal(state, signal);

    if state.player.wants_smoke() && state.make_smoke() {
        let signal = state.player.burn(settings.smoke_penalty);
        apply_fuel_signal(state, signal);
        state.player.smoke_charges -= 1;
    }

    drive(&mut state.player.car, &state.map, &mut state.rng);
}

fn apply_fuel_signal(state: &mut GameState, signal: FuelSignal) {
    if signal.ran_low {
        state.fuel_ran_low();
    }
    if signal.ran_out {
        state.fuel_ran_out();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::DRAIN_BONUS;
    use crate::sim::entity::FlagKind;
    use crate::sim::state::GameEvent;
    use glam::IVec2;

    fn running(seed: u64, mode: Mode) -> (Settings, GameState) {
        let settings = Settings::default();
        let state = GameState::begin(&settings, seed, mode).unwrap();
        (settings, state)
    }

    #[test]
    fn test_tick_burns_fuel_and_moves() {
        let (settings, mut state) = running(1, Mode::Play);
        let start = state.player.car.pos;
        tick(&mut state, &settings, &TickInput::default());
        assert_eq!(state.player.fuel, settings.fuel_capacity(false) - 1);
        assert_eq!(state.player.car.pos, start - IVec2::new(0, settings.car_speed));
        assert_eq!(state.time_ticks, 1);
        // Cars wait out their start delay
        assert!(state.cars.iter().all(|c| c.delay == 49));
    }

    #[test]
    fn test_fuel_at_threshold_scales_speed() {
        let (settings, mut state) = running(2, Mode::Play);
        let low = state.player.fuel_low;
        state.player.fuel = low;
        tick(&mut state, &settings, &TickInput::default());
        assert_eq!(state.player.fuel, low - 1);
        let expected = (low - 1) as i32 * settings.car_speed / low as i32;
        assert_eq!(state.player.car.speed, expected);
    }

    #[test]
    fn test_pending_turn_obeys_scaled_speed() {
        let (settings, mut state) = running(2, Mode::Play);
        let up = TickInput {
            heading: Some(Heading::Up),
            ..Default::default()
        };
        // 40 fuel left scales the car down to a standstill
        state.player.fuel = 40;
        let before = state.player.car.pos;
        tick(&mut state, &settings, &up);
        assert_eq!(state.player.car.speed, 0);
        assert_eq!(state.player.car.direction, IVec2::ZERO);
        assert_eq!(state.player.car.pos, before);

        tick(&mut state, &settings, &up);
        assert_eq!(state.player.car.pos, before);
    }

    #[test]
    fn test_smoke_costs_fuel_only_when_placed() {
        let (settings, mut state) = running(3, Mode::Play);
        let fuel = state.player.fuel;
        let smoke = TickInput {
            smoke: true,
            ..Default::default()
        };
        tick(&mut state, &settings, &smoke);
        assert_eq!(state.smoke.len(), 1);
        assert_eq!(state.player.smoke_charges, 2);
        assert_eq!(state.player.fuel, fuel - 1 - settings.smoke_penalty);

        // Now between tiles: no smoke, no penalty, charge kept
        let fuel = state.player.fuel;
        tick(&mut state, &settings, &TickInput::default());
        assert_eq!(state.smoke.len(), 1);
        assert_eq!(state.player.smoke_charges, 2);
        assert_eq!(state.player.fuel, fuel - 1);
    }

    #[test]
    fn test_lucky_flag_with_three_left_drains_then_restores() {
        let (settings, mut state) = running(4, Mode::Play);
        let lucky = state.flags.iter().position(|f| f.kind == FlagKind::Lucky).unwrap();
        // Collect all but three of the others first
        let mut others: Vec<usize> = (0..state.flags.len()).filter(|&i| i != lucky).collect();
        others.truncate(others.len() - 3);
        for i in others {
            state.flags[i].collect();
            state.flag_collected(i);
        }
        assert_eq!(state.remaining_flags(), 4);

        state.player.fuel = 100;
        state.flags[lucky].collect();
        state.flag_collected(lucky);
        assert_eq!(state.phase, GamePhase::LuckyDrain { restore: 100 });

        let unit = settings.drain_unit(state.player.fuel_capacity);
        let score = state.score;
        let pos = state.player.car.pos;
        let mut drained = 0;
        while matches!(state.phase, GamePhase::LuckyDrain { .. }) {
            tick(&mut state, &settings, &TickInput::default());
            drained += 1;
        }
        let paying_ticks = 100u32.div_ceil(unit) as u64;
        assert_eq!(drained, paying_ticks + 1);
        assert_eq!(state.score, score + paying_ticks * DRAIN_BONUS);
        assert_eq!(state.player.fuel, 100);
        assert_eq!(state.player.car.pos, pos);
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.remaining_flags(), 3);
    }

    #[test]
    fn test_completing_level_drains_bonus() {
        let (settings, mut state) = running(5, Mode::Play);
        let last = state.flags.len() - 1;
        for i in 0..last {
            state.flags[i].collect();
            state.flag_collected(i);
        }
        state.phase = GamePhase::Running;
        // Park the final flag under the car
        state.flags[last].pos = state.player.car.pos - IVec2::new(0, settings.car_speed);
        state.player.fuel = 50;

        tick(&mut state, &settings, &TickInput::default());
        assert!(state.outcome.complete);
        assert_eq!(state.phase, GamePhase::LevelBonus);

        while state.phase == GamePhase::LevelBonus {
            tick(&mut state, &settings, &TickInput::default());
        }
        assert_eq!(state.phase, GamePhase::RoundOver);
        assert_eq!(state.player.fuel, 0);
        assert!(state.events.contains(&GameEvent::LevelComplete));

        state.finish_round(&settings).unwrap();
        assert_eq!(state.level, 2);
        assert_eq!(state.phase, GamePhase::Running);
    }

    #[test]
    fn test_demo_runs_out_the_clock() {
        let (mut settings, _) = running(6, Mode::Demo);
        settings.demo_seconds = 2;
        let mut state = GameState::begin(&settings, 6, Mode::Demo).unwrap();
        let mut ticks = 0;
        while state.phase != GamePhase::RoundOver && ticks < 1000 {
            tick(&mut state, &settings, &TickInput::default());
            ticks += 1;
        }
        assert_eq!(state.phase, GamePhase::RoundOver);
        assert!(ticks as u64 <= settings.demo_tick_limit());
        state.finish_round(&settings).unwrap();
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.events.contains(&GameEvent::DemoFinished));
    }

    #[test]
    fn test_no_tick_after_game_over() {
        let (settings, mut state) = running(8, Mode::Play);
        state.abort();
        let before = state.time_ticks;
        tick(&mut state, &settings, &TickInput::default());
        assert_eq!(state.time_ticks, before);
    }

    #[test]
    fn test_cars_stay_on_road() {
        let (settings, mut state) = running(9, Mode::Demo);
        for _ in 0..600 {
            if state.phase != GamePhase::Running {
                break;
            }
            tick(&mut state, &settings, &TickInput::default());
            for pos in std::iter::once(state.player.car.pos).chain(state.cars.iter().map(|c| c.car.pos)) {
                assert!(state.map.is_open_at(pos), "vehicle off road at {pos}");
            }
        }
    }

    #[test]
    fn test_determinism() {
        // Two sessions with the same seed and inputs stay identical
        let settings = Settings::default();
        let mut state1 = GameState::begin(&settings, 99_999, Mode::Play).unwrap();
        let mut state2 = GameState::begin(&settings, 99_999, Mode::Play).unwrap();

        let inputs = [
            TickInput {
                heading: Some(Heading::Left),
                ..Default::default()
            },
            TickInput {
                smoke: true,
                ..Default::default()
            },
            TickInput {
                heading: Some(Heading::Up),
                ..Default::default()
            },
            TickInput::default(),
        ];

        for round in 0..100 {
            let input = &inputs[round % inputs.len()];
            tick(&mut state1, &settings, input);
            tick(&mut state2, &settings, input);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.player, state2.player);
        assert_eq!(state1.cars, state2.cars);
        assert_eq!(state1.flags, state2.flags);
        assert_eq!(state1.score, state2.score);
        assert_eq!(state1.events, state2.events);
    }
}
