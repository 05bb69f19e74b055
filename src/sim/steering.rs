//! Grid-quantized vehicle movement
//!
//! Cars move along one axis at a time. Turns only happen on exact tile
//! alignment (or as an instant reversal), wall contact picks a new direction
//! at random among the free ones, and the sprite angle swings 15 degrees per
//! tick toward the travel direction along the shorter arc.

use glam::IVec2;
use rand::Rng;

use crate::consts::ANGLE_STEP;
use crate::sign;

use super::entity::Vehicle;
use super::map::TileMap;

/// Facing for a direction: up 0, left 90, down 180, right 270
pub fn facing_angle(direction: IVec2) -> i32 {
    (sign(direction.x) * -90 + (sign(direction.y) + 1) / 2 * 180).rem_euclid(360)
}

/// Rotation step that reaches `target` from `angle` along the shorter arc
pub fn angle_step_toward(angle: i32, target: i32) -> i32 {
    let delta = (target - angle).rem_euclid(360);
    if delta > 180 {
        -ANGLE_STEP
    } else {
        ANGLE_STEP * sign(delta)
    }
}

/// Where a box at `pos` would land after one step, if the leading corners
/// stay on open tiles
pub fn detect(map: &TileMap, pos: IVec2, direction: IVec2) -> Option<IVec2> {
    let size = map.tile_size();
    let far = pos + size - IVec2::ONE;
    let moved = pos + direction;

    let (lead_a, lead_b) = if direction.y == 0 {
        let x = if direction.x < 0 { moved.x } else { far.x + direction.x };
        (IVec2::new(x, pos.y), IVec2::new(x, far.y))
    } else {
        let y = if direction.y < 0 { moved.y } else { far.y + direction.y };
        (IVec2::new(pos.x, y), IVec2::new(far.x, y))
    };

    (map.is_open_at(lead_a) && map.is_open_at(lead_b)).then_some(moved)
}

/// Step in `direction` if nothing blocks it
pub fn try_move(vehicle: &mut Vehicle, map: &TileMap, direction: IVec2) -> bool {
    match detect(map, vehicle.pos, direction) {
        Some(pos) => {
            vehicle.pos = pos;
            true
        }
        None => false,
    }
}

/// Snap onto the next tile boundary along the current travel axis when the
/// coming step would cross it
///
/// Does nothing on an aligned car or when the step stays inside the cell.
pub fn move_toward_alignment(vehicle: &mut Vehicle, map: &TileMap) -> bool {
    let offset = map.cell_offset(vehicle.pos);
    if offset == IVec2::ZERO {
        return false;
    }
    let size = map.tile_size();
    let direction = vehicle.direction;
    let mut tile = map.to_tile(vehicle.pos);

    if direction.y == 0 {
        if (offset.x + direction.x).div_euclid(size.x) == 0 {
            return false;
        }
        if direction.x > 0 {
            tile.x += 1;
        }
    } else {
        if (offset.y + direction.y).div_euclid(size.y) == 0 {
            return false;
        }
        if direction.y > 0 {
            tile.y += 1;
        }
    }

    vehicle.pos = map.to_pixel(tile);
    true
}

/// Adopt a new travel direction and start rotating toward it
pub fn set_direction(vehicle: &mut Vehicle, direction: IVec2) {
    vehicle.direction = direction;
    vehicle.target_angle = facing_angle(direction);
    vehicle.angle_step = angle_step_toward(vehicle.angle, vehicle.target_angle);
}

/// Escape options when the road ahead is closed: both perpendiculars (in
/// random order) and then the reverse
fn escape_turns<R: Rng>(vehicle: &Vehicle, rng: &mut R) -> [IVec2; 3] {
    let d = vehicle.direction;
    let transposed = IVec2::new(d.y, d.x);
    let mut turns = [transposed, -transposed, -d];
    if rng.random_bool(0.5) {
        turns.swap(0, 1);
    }
    turns
}

/// Swing the sprite one step toward its target angle
pub fn rotate(vehicle: &mut Vehicle) {
    if vehicle.angle == vehicle.target_angle {
        vehicle.angle_step = 0;
        return;
    }
    if vehicle.angle_step == 0 {
        vehicle.angle_step = angle_step_toward(vehicle.angle, vehicle.target_angle);
    }
    vehicle.angle = (vehicle.angle + vehicle.angle_step).rem_euclid(360);
}

/// One tick of movement for any car
///
/// A pending turn is taken if it reverses the car, or if the car sits
/// exactly on a tile and the new way is free. Otherwise the car creeps to
/// the next boundary so the turn can happen there. With no usable turn it
/// keeps going, and when blocked it picks the first free escape turn.
pub fn drive<R: Rng>(vehicle: &mut Vehicle, map: &TileMap, rng: &mut R) {
    let requested = vehicle.requested;

    let turned = match requested {
        Some(req) if vehicle.is_reverse(req) || map.is_aligned(vehicle.pos) => {
            if try_move(vehicle, map, req) {
                set_direction(vehicle, req);
                vehicle.requested = None;
                true
            } else {
                false
            }
        }
        _ => false,
    };

    if !turned {
        let crept = requested.is_some() && move_toward_alignment(vehicle, map);
        if !crept {
            let ahead = vehicle.direction;
            if !try_move(vehicle, map, ahead) && !move_toward_alignment(vehicle, map) {
                let turns = escape_turns(vehicle, rng);
                let mut chosen = turns[turns.len() - 1];
                for turn in turns {
                    chosen = turn;
                    if try_move(vehicle, map, turn) {
                        break;
                    }
                }
                set_direction(vehicle, chosen);
            }
        }
    }

    rotate(vehicle);
}
