//! Entity model: vehicles, flags, smoke and rocks
//!
//! Every entity carries an id and a pixel position. Vehicles share the
//! `Vehicle` motion state; what drives them (keyboard, demo AI, pursuit AI)
//! is a tag on the owning struct, and the movement itself lives in
//! `steering` as free functions over `Vehicle`.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::consts::{ANGLE_STEP, FLAG_REMOVAL_TICKS, SMOKE_CHARGES, SMOKE_TICKS};
use crate::{sign, signum_vec};

use super::steering::facing_angle;

/// Stable handle to an entity within a life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Entity kinds, used to key collision resolution and sprites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Pursuit,
    Flag,
    Smoke,
    Rock,
}

impl EntityKind {
    pub const COUNT: usize = 5;

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            EntityKind::Player => 0,
            EntityKind::Pursuit => 1,
            EntityKind::Flag => 2,
            EntityKind::Smoke => 3,
            EntityKind::Rock => 4,
        }
    }
}

/// Directional intent from the input collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Heading {
    Up,
    Down,
    Left,
    Right,
}

impl Heading {
    /// Unit vector in screen space (y grows downward)
    pub fn unit(self) -> IVec2 {
        match self {
            Heading::Up => IVec2::NEG_Y,
            Heading::Down => IVec2::Y,
            Heading::Left => IVec2::NEG_X,
            Heading::Right => IVec2::X,
        }
    }
}

/// Motion state shared by every car
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Top-left pixel position
    pub pos: IVec2,
    /// Pixels per tick
    pub speed: i32,
    /// Signed speed on exactly one axis (or zero when stalled)
    pub direction: IVec2,
    /// Turn waiting for a legal moment
    pub requested: Option<IVec2>,
    /// Current facing (degrees, multiple of 15)
    pub angle: i32,
    /// Facing the car is rotating toward
    pub target_angle: i32,
    /// Per-tick rotation, zero once the target is reached
    pub angle_step: i32,
}

impl Vehicle {
    pub fn new(pos: IVec2, speed: i32, heading: IVec2) -> Self {
        let direction = signum_vec(heading) * speed;
        let angle = facing_angle(direction);
        Self {
            pos,
            speed,
            direction,
            requested: None,
            angle,
            target_angle: angle,
            angle_step: 0,
        }
    }

    /// True if `direction` exactly reverses the current travel
    pub fn is_reverse(&self, direction: IVec2) -> bool {
        direction == -self.direction
    }

    /// Ask to turn toward a unit heading at the current speed
    pub fn request(&mut self, unit: IVec2) {
        if self.speed > 0 && unit != IVec2::ZERO {
            self.requested = Some(signum_vec(unit) * self.speed);
        }
    }

    /// Keep the travel sense but move at the current speed
    ///
    /// A pending turn is rescaled too; at zero speed it is dropped.
    pub fn match_speed(&mut self) {
        self.direction = signum_vec(self.direction) * self.speed;
        let speed = self.speed;
        self.requested = self
            .requested
            .map(|req| signum_vec(req) * speed)
            .filter(|req| *req != IVec2::ZERO);
    }
}

/// Demo car targeting state; the handles only drive radar highlights
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemoBrain {
    pub laziness: u32,
    pub target: Option<EntityId>,
    pub threat: Option<EntityId>,
    pub threat_in_range: bool,
}

/// Who drives the player car
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Control {
    /// Input collaborator intents
    Manual,
    /// Flag-seeking, car-avoiding autopilot
    Demo(DemoBrain),
}

/// Fuel notifications raised by one burn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FuelSignal {
    /// Fuel crossed the low threshold for the first time this life
    pub ran_low: bool,
    /// Fuel reached zero for the first time this life
    pub ran_out: bool,
}

/// The player's car
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: EntityId,
    pub car: Vehicle,
    pub control: Control,
    pub fuel: u32,
    pub fuel_capacity: u32,
    /// Threshold below which speed falls with the fuel
    pub fuel_low: u32,
    pub initial_speed: i32,
    /// Smoke screens still to drop (0..=3)
    pub smoke_charges: u8,
    /// Hit a pursuit car or rock
    pub crashed: bool,
    low_latched: bool,
    stopped_latched: bool,
}

impl Player {
    pub fn new(id: EntityId, pos: IVec2, speed: i32, control: Control) -> Self {
        Self {
            id,
            car: Vehicle::new(pos, speed, IVec2::NEG_Y),
            control,
            fuel: 0,
            fuel_capacity: 0,
            fuel_low: 0,
            initial_speed: speed,
            smoke_charges: 0,
            crashed: false,
            low_latched: false,
            stopped_latched: false,
        }
    }

    /// Fill the tank for a new life
    pub fn refuel(&mut self, capacity: u32, low: u32) {
        self.fuel = capacity;
        self.fuel_capacity = capacity;
        self.fuel_low = low;
        self.low_latched = false;
        self.stopped_latched = false;
    }

    pub fn is_fuel_low(&self) -> bool {
        self.fuel <= self.fuel_low
    }

    /// Fraction of a full tank, for the gauge
    pub fn fuel_fraction(&self) -> f32 {
        if self.fuel_capacity == 0 {
            0.0
        } else {
            self.fuel as f32 / self.fuel_capacity as f32
        }
    }

    /// Arm three smoke screens if none are pending
    pub fn request_smoke(&mut self) {
        if self.smoke_charges == 0 {
            self.smoke_charges = SMOKE_CHARGES;
        }
    }

    /// Whether a pending smoke screen may be dropped this tick
    pub fn wants_smoke(&self) -> bool {
        self.smoke_charges > 0 && self.fuel > self.fuel_low
    }

    /// Spend `amount` fuel, slowing down below the threshold
    pub fn burn(&mut self, amount: u32) -> FuelSignal {
        let mut signal = FuelSignal::default();
        if self.fuel == 0 {
            return signal;
        }
        let was_above = self.fuel > self.fuel_low;
        self.fuel = self.fuel.saturating_sub(amount);
        if !was_above || self.fuel <= self.fuel_low {
            self.scale_speed();
        }
        if was_above && self.fuel <= self.fuel_low && !self.low_latched {
            self.low_latched = true;
            signal.ran_low = true;
        }
        if self.fuel == 0 && !self.stopped_latched {
            self.stopped_latched = true;
            signal.ran_out = true;
        }
        signal
    }

    /// Speed proportional to the fuel left below the threshold
    fn scale_speed(&mut self) {
        let scaled = if self.fuel_low == 0 {
            0
        } else {
            let ratio = u64::from(self.fuel.min(self.fuel_low)) * self.initial_speed.max(0) as u64
                / u64::from(self.fuel_low);
            ratio as i32
        };
        self.car.speed = scaled;
        self.car.match_speed();
    }

    /// Collided with a pursuit car or rock
    pub fn crash(&mut self) {
        self.crashed = true;
        self.car.angle = 0;
        self.car.angle_step = 0;
    }

    pub fn demo(&self) -> Option<&DemoBrain> {
        match &self.control {
            Control::Demo(brain) => Some(brain),
            Control::Manual => None,
        }
    }
}

/// An opponent car chasing the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PursuitCar {
    pub id: EntityId,
    pub car: Vehicle,
    /// Ticks left stunned (also the idle time at round start)
    pub delay: u32,
    /// Direction taken when the stun wears off
    pub rebound: Option<IVec2>,
    /// Stunned by smoke or a rock (spins while stunned)
    pub smoked: bool,
    /// Parked until the player's fuel runs low
    pub immobile: bool,
    pub laziness: u32,
    /// Highlighted on the radar as the demo car's threat
    pub targeted: bool,
}

impl PursuitCar {
    pub fn new(id: EntityId, pos: IVec2, speed: i32, heading: IVec2, laziness: u32, delay: u32) -> Self {
        Self {
            id,
            car: Vehicle::new(pos, speed, heading),
            delay,
            rebound: None,
            smoked: false,
            immobile: false,
            laziness,
            targeted: false,
        }
    }

    /// Start a stun after an impact from the `side` sign vector
    ///
    /// Returns false while already stunned, so hitting the same car from
    /// both sides of a pair records one rebound.
    pub fn stun(&mut self, side: IVec2, smoked: bool, ticks: u32) -> bool {
        if self.is_stunned() {
            return false;
        }
        let dir = self.car.direction;
        self.delay = ticks;
        self.rebound = Some(IVec2::new(side.x * dir.x.abs(), side.y * dir.y.abs()));
        self.car.requested = None;
        self.smoked = smoked;
        if smoked && self.car.angle_step == 0 {
            self.car.angle_step = sign(dir.x + dir.y) * ANGLE_STEP;
        }
        true
    }

    pub fn is_stunned(&self) -> bool {
        self.delay > 0
    }
}

/// Flag variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagKind {
    Normal,
    /// Doubles the running flag value
    Special,
    /// Converts fuel to points while other flags remain
    Lucky,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    pub id: EntityId,
    pub pos: IVec2,
    pub kind: FlagKind,
    /// Ticks until removal, set on collection
    pub timer: Option<u32>,
    /// Points awarded, shown where the flag stood
    pub value: Option<u64>,
    /// Highlighted on the radar as the demo car's target
    pub targeted: bool,
}

impl Flag {
    pub fn new(id: EntityId, pos: IVec2, kind: FlagKind) -> Self {
        Self {
            id,
            pos,
            kind,
            timer: None,
            value: None,
            targeted: false,
        }
    }

    pub fn is_collected(&self) -> bool {
        self.timer.is_some()
    }

    /// Mark collected; false if it already was
    pub fn collect(&mut self) -> bool {
        if self.timer.is_some() {
            return false;
        }
        self.timer = Some(FLAG_REMOVAL_TICKS);
        self.targeted = false;
        true
    }

    /// Count down the removal timer; true when the flag should go
    pub fn tick(&mut self) -> bool {
        match self.timer.as_mut() {
            Some(t) => {
                *t = t.saturating_sub(1);
                *t == 0
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Smoke {
    pub id: EntityId,
    pub pos: IVec2,
    pub remaining: u32,
}

impl Smoke {
    pub fn new(id: EntityId, pos: IVec2) -> Self {
        Self {
            id,
            pos,
            remaining: SMOKE_TICKS,
        }
    }

    /// Age one tick; true once it has dissipated
    pub fn tick(&mut self) -> bool {
        if self.remaining > 0 {
            self.remaining -= 1;
            false
        } else {
            true
        }
    }
}

/// Inert obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rock {
    pub id: EntityId,
    pub pos: IVec2,
}
