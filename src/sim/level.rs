//! Level generation
//!
//! Picks the map variant for a level, places the flags and rocks and works
//! out how many pursuit cars take part. Placement follows the template:
//! flags land on plain open cells in sampled rows, rocks on the cells
//! marked with group digits.

use glam::IVec2;
use rand::Rng;
use rand::seq::index;

use crate::consts::{FLAGS_PER_LEVEL, PLACEMENT_BUCKETS};
use crate::error::{ConfigError, ConfigResult};
use crate::settings::Settings;

use super::entity::FlagKind;
use super::map::TileMap;

/// Digits that mark rock groups in the template
const GROUPS: usize = 10;

/// Everything `start_level` needs from the generator
#[derive(Debug, Clone)]
pub struct Level {
    pub map: TileMap,
    /// Flag tiles and kinds
    pub flags: Vec<(IVec2, FlagKind)>,
    /// Rock tiles
    pub rocks: Vec<IVec2>,
    /// Start tile and heading of each pursuit car, reused every life
    pub roster: Vec<(IVec2, IVec2)>,
}

/// Every fourth level, starting at 3
pub fn is_challenging(level: u32) -> bool {
    (level + 1) % 4 == 0
}

/// Rocks on a level: none on level 1, one more each level, wrapping after 9
pub fn rock_count(level: u32) -> usize {
    (level.saturating_sub(1) % 10) as usize
}

/// Pursuit cars on a level: the base group, two more on even levels and
/// the oncoming group (heading down) on challenging levels
pub fn roster(settings: &Settings, level: u32) -> Vec<(IVec2, IVec2)> {
    let mut cars: Vec<(IVec2, IVec2)> = settings
        .pursuit_starts
        .iter()
        .map(|&tile| (tile, IVec2::NEG_Y))
        .collect();
    if level % 2 == 0 {
        cars.extend(settings.even_level_starts.iter().map(|&tile| (tile, IVec2::NEG_Y)));
    }
    if is_challenging(level) {
        cars.extend(settings.oncoming_starts.iter().map(|&tile| (tile, IVec2::Y)));
    }
    cars
}

/// Build the map and placements for `level`
pub fn generate_level<R: Rng>(settings: &Settings, level: u32, rng: &mut R) -> ConfigResult<Level> {
    let challenging = is_challenging(level);
    let map = TileMap::load(settings, challenging)?;

    let flags = place_flags(settings, &map, FLAGS_PER_LEVEL, rng)?;
    let rocks = place_rocks(settings, &map, rock_count(level), rng)?;
    let roster = roster(settings, level);

    log::info!(
        "Level {}{}: {} flags, {} rocks, {} cars",
        level,
        if challenging { " (challenging)" } else { "" },
        flags.len(),
        rocks.len(),
        roster.len()
    );

    Ok(Level {
        map,
        flags,
        rocks,
        roster,
    })
}

/// `count` flags, one per sampled row bucket; two of them are special and
/// lucky
fn place_flags<R: Rng>(
    settings: &Settings,
    map: &TileMap,
    count: usize,
    rng: &mut R,
) -> ConfigResult<Vec<(IVec2, FlagKind)>> {
    let count = count.min(PLACEMENT_BUCKETS);
    let rows = index::sample(rng, PLACEMENT_BUCKETS, count);
    let cols = index::sample(rng, PLACEMENT_BUCKETS, count);

    let tiles = rows
        .iter()
        .zip(cols.iter())
        .map(|(row, col)| placement_cell(settings, map, row, col))
        .collect::<ConfigResult<Vec<IVec2>>>()?;

    if tiles.len() < 2 {
        return Err(ConfigError::NotEnoughFlags {
            wanted: 2,
            placed: tiles.len(),
        });
    }
    let specials = index::sample(rng, tiles.len(), 2);
    let (special, lucky) = (specials.index(0), specials.index(1));

    let flags = tiles
        .into_iter()
        .enumerate()
        .map(|(i, tile)| {
            let kind = if i == special {
                FlagKind::Special
            } else if i == lucky {
                FlagKind::Lucky
            } else {
                FlagKind::Normal
            };
            (tile, kind)
        })
        .collect();
    Ok(flags)
}

/// Map a (row, column) bucket pair onto an open cell outside the start zone
fn placement_cell(settings: &Settings, map: &TileMap, row: usize, col: usize) -> ConfigResult<IVec2> {
    let play_rows = settings.play_area.y.max(0) as usize;
    let y = (row * play_rows / PLACEMENT_BUCKETS) as i32 + settings.map_border.y;

    let in_start_rows = (settings.start_area_min.y..=settings.start_area_max.y).contains(&y);
    let start_cols = settings.start_area_min.x..=settings.start_area_max.x;

    let eligible: Vec<usize> = map
        .row(y as usize)
        .iter()
        .enumerate()
        .filter(|&(x, &c)| c == b' ' && !(in_start_rows && start_cols.contains(&(x as i32))))
        .map(|(x, _)| x)
        .collect();

    if eligible.is_empty() {
        return Err(ConfigError::NoOpenCell { row: y as usize });
    }
    let x = eligible[col * eligible.len() / PLACEMENT_BUCKETS];
    Ok(IVec2::new(x as i32, y))
}

/// One rock per sampled group, on the first or second cell of that group
fn place_rocks<R: Rng>(
    settings: &Settings,
    map: &TileMap,
    count: usize,
    rng: &mut R,
) -> ConfigResult<Vec<IVec2>> {
    let groups = index::sample(rng, GROUPS, count.min(GROUPS));
    let occurrences: Vec<usize> = (0..groups.len()).map(|_| rng.random_range(0..=1)).collect();

    let first_row = settings.map_border.y;
    let last_row = first_row + settings.play_area.y;

    groups
        .iter()
        .zip(occurrences)
        .map(|(group, occurrence)| {
            let digit = b'0' + group as u8;
            let cells: Vec<IVec2> = (first_row..last_row)
                .flat_map(move |y| {
                    map.row(y as usize)
                        .iter()
                        .enumerate()
                        .filter(move |&(_, &c)| c == digit)
                        .map(move |(x, _)| IVec2::new(x as i32, y))
                })
                .collect();
            cells
                .get(occurrence)
                .copied()
                .ok_or(ConfigError::NotEnoughGroupCells {
                    group: group as u8,
                    wanted: occurrence,
                    found: cells.len(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn in_start_area(settings: &Settings, tile: IVec2) -> bool {
        tile.cmpge(settings.start_area_min).all() && tile.cmple(settings.start_area_max).all()
    }

    #[test]
    fn test_challenging_levels() {
        let challenging: Vec<u32> = (1..=12).filter(|&l| is_challenging(l)).collect();
        assert_eq!(challenging, vec![3, 7, 11]);
    }

    #[test]
    fn test_rock_counts_wrap() {
        assert_eq!(rock_count(1), 0);
        assert_eq!(rock_count(5), 4);
        assert_eq!(rock_count(10), 9);
        assert_eq!(rock_count(11), 0);
    }

    #[test]
    fn test_roster_sizes() {
        let settings = Settings::default();
        assert_eq!(roster(&settings, 1).len(), 3);
        assert_eq!(roster(&settings, 2).len(), 5);
        assert_eq!(roster(&settings, 3).len(), 6);
        assert_eq!(roster(&settings, 4).len(), 5);
        assert_eq!(roster(&settings, 7).len(), 6);

        let oncoming = roster(&settings, 3);
        assert_eq!(oncoming.iter().filter(|(_, heading)| *heading == IVec2::Y).count(), 3);
        assert_eq!(oncoming[..3], roster(&settings, 1)[..]);
    }

    #[test]
    fn test_level_five_placements() {
        let settings = Settings::default();
        let mut rng = Pcg32::seed_from_u64(5);
        let level = generate_level(&settings, 5, &mut rng).unwrap();

        assert!(!is_challenging(5));
        assert_eq!(level.rocks.len(), 4);
        assert_eq!(level.flags.len(), 10);
        let count = |kind: FlagKind| level.flags.iter().filter(|(_, k)| *k == kind).count();
        assert_eq!(count(FlagKind::Special), 1);
        assert_eq!(count(FlagKind::Lucky), 1);
        assert_eq!(count(FlagKind::Normal), 8);
    }

    #[test]
    fn test_flags_on_open_cells_outside_start() {
        let settings = Settings::default();
        for seed in 0..20 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let level = generate_level(&settings, 1, &mut rng).unwrap();
            let mut tiles: Vec<IVec2> = level.flags.iter().map(|(t, _)| *t).collect();
            for &tile in &tiles {
                assert_eq!(level.map.symbol(tile), Some(b' '));
                assert!(!in_start_area(&settings, tile), "flag in start area at {tile}");
            }
            tiles.sort_by_key(|t| (t.y, t.x));
            tiles.dedup();
            assert_eq!(tiles.len(), 10);
        }
    }

    #[test]
    fn test_rocks_sit_on_group_cells() {
        let settings = Settings::default();
        let mut rng = Pcg32::seed_from_u64(11);
        let level = generate_level(&settings, 10, &mut rng).unwrap();
        assert_eq!(level.rocks.len(), 9);
        for &rock in &level.rocks {
            let symbol = level.map.symbol(rock).unwrap();
            assert!(symbol.is_ascii_digit());
            assert!(level.map.is_open(rock));
        }
    }

    #[test]
    fn test_generation_is_seeded() {
        let settings = Settings::default();
        let a = generate_level(&settings, 6, &mut Pcg32::seed_from_u64(42)).unwrap();
        let b = generate_level(&settings, 6, &mut Pcg32::seed_from_u64(42)).unwrap();
        assert_eq!(a.flags, b.flags);
        assert_eq!(a.rocks, b.rocks);
    }

    #[test]
    fn test_missing_group_is_fatal() {
        let mut settings = Settings::default();
        // Strip every group digit
        settings.template = settings
            .template
            .iter()
            .map(|row| row.chars().map(|c| if c.is_ascii_digit() { ' ' } else { c }).collect())
            .collect();
        let mut rng = Pcg32::seed_from_u64(1);
        let err = generate_level(&settings, 2, &mut rng).unwrap_err();
        assert!(matches!(err, ConfigError::NotEnoughGroupCells { found: 0, .. }));
    }

    #[test]
    fn test_single_flag_cannot_carry_specials() {
        let settings = Settings::default();
        let map = TileMap::load(&settings, false).unwrap();
        let mut rng = Pcg32::seed_from_u64(1);
        let err = place_flags(&settings, &map, 1, &mut rng).unwrap_err();
        assert!(matches!(err, ConfigError::NotEnoughFlags { wanted: 2, placed: 1 }));

        let flags = place_flags(&settings, &map, 2, &mut rng).unwrap();
        let mut kinds: Vec<FlagKind> = flags.iter().map(|(_, kind)| *kind).collect();
        kinds.sort_by_key(|kind| *kind as u8);
        assert_eq!(kinds, vec![FlagKind::Special, FlagKind::Lucky]);
    }
}
