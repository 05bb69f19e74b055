//! Computer steering: pursuit cars and the demo autopilot
//!
//! Both AIs are lazy: they only reconsider their course on a random one in
//! `laziness + 1` ticks, and they only ever *request* turns. Whether a turn
//! happens is up to `steering::drive`.

use glam::IVec2;
use rand::Rng;

use crate::{sign, signum_vec};

use super::entity::{Control, EntityId, Flag, Player, PursuitCar};
use super::map::TileMap;
use super::steering::{drive, set_direction, try_move};

/// Lateral slack (pixels) for deciding a threat is head-on
const HEAD_ON_TOLERANCE: i32 = 1;

/// Ask for a turn toward the player when it is no longer ahead
pub fn steer_pursuit<R: Rng>(car: &mut PursuitCar, player_pos: IVec2, rng: &mut R) {
    if car.is_stunned() || rng.random_range(0..=car.laziness) != 0 {
        return;
    }

    let toward = signum_vec(player_pos - car.car.pos);
    let d = car.car.direction;

    if d.x == 0 {
        if toward.y != sign(d.y) {
            let x = if toward.x > 0 { 1 } else { -1 };
            car.car.request(IVec2::new(x, 0));
        }
    } else if d.y == 0 && toward.x != sign(d.x) {
        let y = if toward.y > 0 { 1 } else { -1 };
        car.car.request(IVec2::new(0, y));
    }
}

/// Move a pursuit car one tick: sit out a stun, stay parked, or drive
pub fn update_pursuit<R: Rng>(car: &mut PursuitCar, map: &TileMap, rng: &mut R) {
    if car.is_stunned() {
        car.delay -= 1;
        let Some(rebound) = car.rebound else {
            return;
        };
        if car.smoked {
            car.car.angle = (car.car.angle + car.car.angle_step).rem_euclid(360);
        }
        if car.delay == 0 {
            let direction = if rebound == IVec2::ZERO {
                -car.car.direction
            } else {
                rebound
            };
            set_direction(&mut car.car, direction);
            try_move(&mut car.car, map, direction);
            car.rebound = None;
            car.smoked = false;
        }
    } else if !car.immobile {
        drive(&mut car.car, map, rng);
    }
}

/// Index of the position closest to `from`
fn nearest<'a>(from: IVec2, positions: impl Iterator<Item = (usize, &'a IVec2)>) -> Option<usize> {
    positions
        .min_by_key(|(_, pos)| (**pos - from).as_i64vec2().length_squared())
        .map(|(i, _)| i)
}

/// Move the radar highlight from `old` to `new`
fn retarget<T>(
    items: &mut [T],
    old: Option<EntityId>,
    new: usize,
    id_of: impl Fn(&T) -> EntityId,
    mark: impl Fn(&mut T, bool),
) -> EntityId {
    if let Some(item) = old.and_then(|old| items.iter_mut().find(|item| id_of(item) == old)) {
        mark(item, false);
    }
    mark(&mut items[new], true);
    id_of(&items[new])
}

/// Demo autopilot: chase the nearest flag, dodge and smoke the nearest car
///
/// Evasion wins over pursuit. The caller still runs the normal player
/// update afterwards.
pub fn steer_demo<R: Rng>(
    player: &mut Player,
    flags: &mut [Flag],
    cars: &mut [PursuitCar],
    threat_radius: f32,
    rng: &mut R,
) {
    let pos = player.car.pos;
    let Control::Demo(brain) = &mut player.control else {
        return;
    };
    if rng.random_range(0..=brain.laziness) != 0 {
        return;
    }

    let target = nearest(
        pos,
        flags
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.is_collected())
            .map(|(i, f)| (i, &f.pos)),
    );
    let threat = nearest(pos, cars.iter().enumerate().map(|(i, c)| (i, &c.car.pos)));
    let (Some(target), Some(threat)) = (target, threat) else {
        return;
    };

    brain.target = Some(retarget(
        flags,
        brain.target,
        target,
        |f: &Flag| f.id,
        |f: &mut Flag, on| f.targeted = on,
    ));
    brain.threat = Some(retarget(
        cars,
        brain.threat,
        threat,
        |c: &PursuitCar| c.id,
        |c: &mut PursuitCar, on| c.targeted = on,
    ));

    let destination = flags[target].pos;
    let danger = cars[threat].car.pos;
    let in_range = ((danger - pos).as_vec2()).length() < threat_radius;
    brain.threat_in_range = in_range;

    if in_range {
        player.request_smoke();
    }

    let toward = signum_vec(destination - pos);
    let away = signum_vec(danger - pos);
    let d = player.car.direction;

    let turn = if d.x == 0 {
        if in_range && away.y == sign(d.y) && (pos.x - danger.x).abs() <= HEAD_ON_TOLERANCE {
            Some(IVec2::new(0, -away.y))
        } else if toward.y == sign(d.y) && toward.x != 0 {
            Some(IVec2::new(toward.x, 0))
        } else {
            None
        }
    } else if d.y == 0 {
        if in_range && away.x == sign(d.x) && (pos.y - danger.y).abs() <= HEAD_ON_TOLERANCE {
            Some(IVec2::new(-away.x, 0))
        } else if toward.x == sign(d.x) && toward.y != 0 {
            Some(IVec2::new(0, toward.y))
        } else {
            None
        }
    } else {
        None
    };

    if let Some(turn) = turn {
        player.car.request(turn);
    }
}
