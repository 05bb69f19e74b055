//! Collision pass
//!
//! After everything has moved, each unordered pair of participants is
//! tested once with an axis-aligned box overlap. On contact both sides are
//! resolved through a (kind, kind) table, each with the sign of its own
//! position minus the other's, so a handler knows which side it was hit
//! from. Handlers are guarded so resolving a pair from both ends never
//! doubles an effect.

use glam::IVec2;

use crate::consts::STUN_TICKS;
use crate::signum_vec;

use super::entity::EntityKind;
use super::state::GameState;

/// A handle into one of the session's entity lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Participant {
    Player,
    Pursuit(usize),
    Rock(usize),
    Smoke(usize),
    Flag(usize),
}

impl Participant {
    pub fn kind(self) -> EntityKind {
        match self {
            Participant::Player => EntityKind::Player,
            Participant::Pursuit(_) => EntityKind::Pursuit,
            Participant::Rock(_) => EntityKind::Rock,
            Participant::Smoke(_) => EntityKind::Smoke,
            Participant::Flag(_) => EntityKind::Flag,
        }
    }
}

/// Resolve `this` being hit by `other` from the `side` sign vector
type Resolver = fn(&mut GameState, Participant, Participant, IVec2);

type ResolverTable = [[Option<Resolver>; EntityKind::COUNT]; EntityKind::COUNT];

/// Indexed by `[this][other]`; empty slots are no-ops (pursuit cars and
/// flags ignore each other)
const RESOLVERS: ResolverTable = {
    use EntityKind::*;
    let mut table: ResolverTable = [[None; EntityKind::COUNT]; EntityKind::COUNT];
    table[Player.index()][Pursuit.index()] = Some(crash);
    table[Player.index()][Rock.index()] = Some(crash);
    table[Pursuit.index()][Player.index()] = Some(stun);
    table[Pursuit.index()][Pursuit.index()] = Some(stun);
    table[Pursuit.index()][Smoke.index()] = Some(stun);
    table[Pursuit.index()][Rock.index()] = Some(stun);
    table[Flag.index()][Player.index()] = Some(collect);
    table
};

/// Boxes of one tile overlap when both axis gaps are under a tile
#[inline]
pub fn overlaps(a: IVec2, b: IVec2, size: IVec2) -> bool {
    let gap = (a - b).abs();
    gap.x < size.x && gap.y < size.y
}

/// Resolver for an ordered pair of kinds, if any
pub fn resolver(this: EntityKind, other: EntityKind) -> Option<Resolver> {
    RESOLVERS[this.index()][other.index()]
}

/// Player, pursuit cars, rocks, smoke and uncollected flags with their
/// positions, in pass order
fn participants(state: &GameState) -> Vec<(Participant, IVec2)> {
    let mut list = Vec::with_capacity(
        1 + state.cars.len() + state.rocks.len() + state.smoke.len() + state.flags.len(),
    );
    list.push((Participant::Player, state.player.car.pos));
    list.extend(state.cars.iter().enumerate().map(|(i, c)| (Participant::Pursuit(i), c.car.pos)));
    list.extend(state.rocks.iter().enumerate().map(|(i, r)| (Participant::Rock(i), r.pos)));
    list.extend(state.smoke.iter().enumerate().map(|(i, s)| (Participant::Smoke(i), s.pos)));
    list.extend(
        state
            .flags
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.is_collected())
            .map(|(i, f)| (Participant::Flag(i), f.pos)),
    );
    list
}

/// Run one collision pass over post-move positions
pub fn run_collisions(state: &mut GameState) {
    let size = state.map.tile_size();
    let list = participants(state);

    for (i, &(a, pos_a)) in list.iter().enumerate() {
        for &(b, pos_b) in &list[i + 1..] {
            if !overlaps(pos_a, pos_b, size) {
                continue;
            }
            let diff = pos_a - pos_b;
            if let Some(resolve) = resolver(a.kind(), b.kind()) {
                resolve(state, a, b, signum_vec(diff));
            }
            if let Some(resolve) = resolver(b.kind(), a.kind()) {
                resolve(state, b, a, signum_vec(-diff));
            }
        }
    }
}

fn crash(state: &mut GameState, _this: Participant, _other: Participant, _side: IVec2) {
    state.player_crashed();
}

fn stun(state: &mut GameState, this: Participant, other: Participant, side: IVec2) {
    let Participant::Pursuit(i) = this else {
        return;
    };
    let smoked = matches!(other, Participant::Smoke(_) | Participant::Rock(_));
    if let Some(car) = state.cars.get_mut(i) {
        if car.stun(side, smoked, STUN_TICKS) {
            log::debug!("Car {:?} stunned by {:?}, rebound {:?}", car.id, other.kind(), car.rebound);
        }
    }
}

fn collect(state: &mut GameState, this: Participant, _other: Participant, _side: IVec2) {
    let Participant::Flag(i) = this else {
        return;
    };
    if state.flags.get_mut(i).is_some_and(|f| f.collect()) {
        state.flag_collected(i);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::ai::update_pursuit;
    use crate::sim::entity::{EntityId, Flag, FlagKind, PursuitCar, Rock};
    use crate::sim::map::TileMap;
    use crate::sim::state::{GameEvent, Mode};
    use proptest::prelude::*;

    const TILE: i32 = 24;

    fn at(x: i32, y: i32) -> IVec2 {
        IVec2::new(x * TILE, y * TILE)
    }

    /// Open 10x10 arena with the player parked far from the action
    fn arena() -> GameState {
        let settings = Settings::default();
        let mut state = GameState::new(&settings, 1, Mode::Play);
        let mut rows = vec![b"##########".to_vec()];
        for _ in 0..8 {
            rows.push(b"#        #".to_vec());
        }
        rows.push(b"##########".to_vec());
        state.map = TileMap::new(rows, IVec2::splat(TILE));
        state.player.car.pos = at(8, 8);
        state.player.refuel(3000, 600);
        state
    }

    fn car(id: u32, pos: IVec2, heading: IVec2) -> PursuitCar {
        PursuitCar::new(EntityId(id), pos, 13, heading, 5, 0)
    }

    #[test]
    fn test_table_shape() {
        use EntityKind::*;
        assert!(resolver(Pursuit, Flag).is_none());
        assert!(resolver(Flag, Pursuit).is_none());
        assert!(resolver(Player, Smoke).is_none());
        assert!(resolver(Rock, Player).is_none());
        assert!(resolver(Player, Rock).is_some());
        assert!(resolver(Pursuit, Pursuit).is_some());
    }

    #[test]
    fn test_overlap_is_strict() {
        let size = IVec2::splat(TILE);
        assert!(overlaps(IVec2::ZERO, IVec2::new(23, -23), size));
        assert!(!overlaps(IVec2::ZERO, IVec2::new(24, 0), size));
        assert!(!overlaps(IVec2::ZERO, IVec2::new(0, -24), size));
    }

    #[test]
    fn test_pursuit_hits_rock_then_rebounds_once() {
        let mut state = arena();
        state.cars.push(car(2, at(4, 4), IVec2::NEG_Y));
        state.rocks.push(Rock {
            id: EntityId(3),
            pos: at(4, 4) - IVec2::new(0, 10),
        });

        run_collisions(&mut state);
        let stunned = &state.cars[0];
        assert_eq!(stunned.delay, STUN_TICKS);
        assert_eq!(stunned.rebound, Some(IVec2::new(0, 13)));
        assert!(stunned.smoked);

        let mut rng = state.rng.clone();
        for _ in 0..STUN_TICKS - 1 {
            update_pursuit(&mut state.cars[0], &state.map, &mut rng);
            assert_eq!(state.cars[0].car.direction, IVec2::new(0, -13));
        }
        update_pursuit(&mut state.cars[0], &state.map, &mut rng);
        assert_eq!(state.cars[0].car.direction, IVec2::new(0, 13));
        assert_eq!(state.cars[0].car.pos, at(4, 4) + IVec2::new(0, 13));
        assert_eq!(state.cars[0].rebound, None);
    }

    #[test]
    fn test_pursuit_pair_rebounds_apart() {
        let mut state = arena();
        state.cars.push(car(2, at(4, 4), IVec2::X));
        state.cars.push(car(3, at(4, 4) + IVec2::new(20, 0), IVec2::NEG_X));

        run_collisions(&mut state);
        assert_eq!(state.cars[0].rebound, Some(IVec2::new(-13, 0)));
        assert_eq!(state.cars[1].rebound, Some(IVec2::new(13, 0)));
        assert!(!state.cars[0].smoked);
    }

    #[test]
    fn test_player_crash_reported_once() {
        let mut state = arena();
        state.cars.push(car(2, at(8, 8) + IVec2::new(0, -5), IVec2::Y));
        state.rocks.push(Rock {
            id: EntityId(3),
            pos: at(8, 8) + IVec2::new(5, 0),
        });

        run_collisions(&mut state);
        assert!(state.outcome.crashed);
        assert!(state.player.crashed);
        assert_eq!(state.cars[0].delay, STUN_TICKS);
        let crashes = state.events.iter().filter(|e| **e == GameEvent::Crashed).count();
        assert_eq!(crashes, 1);
    }

    #[test]
    fn test_flag_collected_by_player_only() {
        let mut state = arena();
        state.score_flag = 100;
        state.flags.push(Flag::new(EntityId(5), at(8, 8), FlagKind::Normal));
        state.flags.push(Flag::new(EntityId(6), at(2, 2), FlagKind::Normal));
        state.cars.push(car(2, at(2, 2), IVec2::X));

        run_collisions(&mut state);
        assert!(state.flags[0].is_collected());
        assert!(!state.flags[1].is_collected());
        assert_eq!(state.cars[0].delay, 0);
        assert_eq!(state.score, 100);

        // A lingering collected flag takes no further part
        run_collisions(&mut state);
        assert_eq!(state.score, 100);
    }

    #[test]
    fn test_smoke_stuns_and_spins() {
        let mut state = arena();
        state.cars.push(car(2, at(4, 4), IVec2::NEG_Y));
        state.smoke.push(crate::sim::entity::Smoke::new(EntityId(9), at(4, 3) + IVec2::new(0, 4)));

        run_collisions(&mut state);
        assert!(state.cars[0].smoked);
        assert_eq!(state.cars[0].car.angle_step, -15);
        assert_eq!(state.smoke.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_overlap_is_symmetric(
            ax in -5000i32..5000, ay in -5000i32..5000,
            bx in -5000i32..5000, by in -5000i32..5000,
            w in 1i32..64, h in 1i32..64,
        ) {
            let (a, b, size) = (IVec2::new(ax, ay), IVec2::new(bx, by), IVec2::new(w, h));
            prop_assert_eq!(overlaps(a, b, size), overlaps(b, a, size));
        }
    }
}
