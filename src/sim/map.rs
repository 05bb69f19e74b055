//! Tile grid, wall-shape derivation and pixel/tile coordinate transforms
//!
//! The grid is a list of byte rows. A space is open road, a digit is open
//! road that also marks a placement group, anything else blocks vehicles.
//! `#` is the generic wall marker that `convert_shapes` rewrites into the
//! corner/edge/end/straight/single pieces the renderer draws.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::settings::Settings;

/// Symbols a vehicle may occupy
pub const OPEN_SYMBOLS: &[u8] = b" 0123456789";
/// Generic wall marker before shape derivation
pub const WALL_MARKER: u8 = b'#';
/// Placeholder that is wall on normal levels and road on challenging ones
pub const NORMAL_WALL: u8 = b':';
/// Placeholder that is road on normal levels and wall on challenging ones
pub const CHALLENGING_WALL: u8 = b'X';

const OPEN: u8 = b' ';
const DONT_CARE: u8 = b'.';

/// Shape templates, checked in order; the first match wins.
///
/// `#` needs a blocking neighbour, ` ` needs an open one, `.` accepts
/// anything. The centre is always `#`.
const SHAPES: [([&[u8; 3]; 3], u8); 15] = [
    ([b". .", b" ##", b".#."], b'/'),
    ([b". .", b"###", b".#."], b'-'),
    ([b". .", b"## ", b".#."], b'?'),
    ([b".#.", b" ##", b".#."], b'('),
    ([b".#.", b"## ", b".#."], b')'),
    ([b".#.", b"###", b". ."], b'_'),
    ([b".#.", b" ##", b". ."], b'L'),
    ([b".#.", b"## ", b". ."], b'J'),
    ([b". .", b" # ", b".#."], b'^'),
    ([b".#.", b" # ", b".#."], b'|'),
    ([b".#.", b" # ", b". ."], b'V'),
    ([b". .", b" ##", b". ."], b'<'),
    ([b". .", b"###", b". ."], b'='),
    ([b". .", b"## ", b". ."], b'>'),
    ([b". .", b" # ", b". ."], b'O'),
];

/// What a map symbol depicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    /// Plain road
    Open,
    /// Road carrying a placement group digit
    Group(u8),
    Scenery,
    SolidBlock,
    SingleBlock,
    CornerTopLeft,
    CornerTopRight,
    CornerBottomLeft,
    CornerBottomRight,
    EdgeTop,
    EdgeRight,
    EdgeLeft,
    EdgeBottom,
    EndLeft,
    EndTop,
    EndRight,
    EndBottom,
    WallHorizontal,
    WallVertical,
    /// Variant placeholder not yet resolved by `derive_variant`
    Placeholder,
}

impl TileKind {
    /// Map a symbol onto its kind (None for unknown symbols)
    pub fn from_symbol(symbol: u8) -> Option<Self> {
        let kind = match symbol {
            b' ' => TileKind::Open,
            b'0'..=b'9' => TileKind::Group(symbol - b'0'),
            b'*' => TileKind::Scenery,
            b'#' => TileKind::SolidBlock,
            b'O' => TileKind::SingleBlock,
            b'/' => TileKind::CornerTopLeft,
            b'?' => TileKind::CornerTopRight,
            b'L' => TileKind::CornerBottomLeft,
            b'J' => TileKind::CornerBottomRight,
            b'-' => TileKind::EdgeTop,
            b')' => TileKind::EdgeRight,
            b'(' => TileKind::EdgeLeft,
            b'_' => TileKind::EdgeBottom,
            b'<' => TileKind::EndLeft,
            b'^' => TileKind::EndTop,
            b'>' => TileKind::EndRight,
            b'V' => TileKind::EndBottom,
            b'=' => TileKind::WallHorizontal,
            b'|' => TileKind::WallVertical,
            NORMAL_WALL | CHALLENGING_WALL => TileKind::Placeholder,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_open(self) -> bool {
        matches!(self, TileKind::Open | TileKind::Group(_))
    }
}

#[inline]
pub fn is_open_symbol(symbol: u8) -> bool {
    OPEN_SYMBOLS.contains(&symbol)
}

/// Resolve the paired placeholders for a round
///
/// The first and last rows are left alone; they are border by contract.
pub fn derive_variant(template: &[String], challenging: bool) -> Vec<Vec<u8>> {
    let (normal_to, challenging_to) = if challenging {
        (OPEN, WALL_MARKER)
    } else {
        (WALL_MARKER, OPEN)
    };
    let last = template.len().saturating_sub(1);
    template
        .iter()
        .enumerate()
        .map(|(y, row)| {
            let bytes = row.as_bytes();
            if y == 0 || y == last {
                return bytes.to_vec();
            }
            bytes
                .iter()
                .map(|&c| match c {
                    NORMAL_WALL => normal_to,
                    CHALLENGING_WALL => challenging_to,
                    other => other,
                })
                .collect()
        })
        .collect()
}

/// Match a 3x3 neighbourhood (row-major) against the shape templates
pub fn match_shape(window: &[u8; 9]) -> Option<u8> {
    if window[4] != WALL_MARKER {
        return None;
    }
    SHAPES
        .iter()
        .find(|(pattern, _)| {
            pattern.iter().flat_map(|row| row.iter()).zip(window).all(
                |(&want, &have)| match want {
                    WALL_MARKER => !is_open_symbol(have),
                    OPEN => is_open_symbol(have),
                    _ => want == DONT_CARE,
                },
            )
        })
        .map(|&(_, symbol)| symbol)
}

/// Rewrite interior wall markers into their drawn shapes
///
/// Converted symbols are still blocking, so rewriting in place sees the
/// same neighbourhoods as working on a copy.
pub fn convert_shapes(layout: &mut [Vec<u8>]) {
    let height = layout.len();
    for y in 1..height.saturating_sub(1) {
        let width = layout[y].len();
        for x in 1..width.saturating_sub(1) {
            if layout[y][x] != WALL_MARKER {
                continue;
            }
            let mut window = [0u8; 9];
            for (i, cell) in window.iter_mut().enumerate() {
                let (dx, dy) = (i % 3, i / 3);
                *cell = layout[y + dy - 1]
                    .get(x + dx - 1)
                    .copied()
                    .unwrap_or(WALL_MARKER);
            }
            if let Some(symbol) = match_shape(&window) {
                layout[y][x] = symbol;
            }
        }
    }
}

/// Check a template before anything indexes into it
pub fn validate_template(settings: &Settings) -> ConfigResult<()> {
    let rows = &settings.template;
    let Some(first) = rows.first() else {
        return Err(ConfigError::EmptyTemplate);
    };
    let width = first.len();
    for (y, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(ConfigError::RaggedRow {
                row: y,
                expected: width,
                found: row.len(),
            });
        }
        for (x, &c) in row.as_bytes().iter().enumerate() {
            if TileKind::from_symbol(c).is_none() {
                return Err(ConfigError::UnknownSymbol {
                    symbol: char::from(c),
                    x,
                    y,
                });
            }
        }
    }

    let need = settings.map_border * 2 + settings.play_area;
    let (need_width, need_height) = (need.x.max(0) as usize, need.y.max(0) as usize);
    if width < need_width || rows.len() < need_height {
        return Err(ConfigError::TooSmall {
            width,
            height: rows.len(),
            need_width,
            need_height,
        });
    }

    let height = rows.len();
    for (y, row) in rows.iter().enumerate() {
        let bytes = row.as_bytes();
        for (x, &c) in bytes.iter().enumerate() {
            let on_ring = y == 0 || y == height - 1 || x == 0 || x == width - 1;
            if on_ring && is_open_symbol(c) {
                return Err(ConfigError::OpenBorder { x, y });
            }
        }
    }
    Ok(())
}

/// The round's tile grid plus the pixel/tile transform
#[derive(Debug, Clone)]
pub struct TileMap {
    rows: Vec<Vec<u8>>,
    tile_size: IVec2,
}

impl TileMap {
    /// Wrap already-derived rows
    pub fn new(rows: Vec<Vec<u8>>, tile_size: IVec2) -> Self {
        Self { rows, tile_size }
    }

    /// Validate the template, resolve the round variant and derive shapes
    pub fn load(settings: &Settings, challenging: bool) -> ConfigResult<Self> {
        validate_template(settings)?;
        let mut rows = derive_variant(&settings.template, challenging);
        convert_shapes(&mut rows);
        let map = Self::new(rows, settings.tile_size);
        log::debug!(
            "Derived {}x{} map (challenging: {})",
            map.width(),
            map.height(),
            challenging
        );
        Ok(map)
    }

    pub fn tile_size(&self) -> IVec2 {
        self.tile_size
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, y: usize) -> &[u8] {
        self.rows.get(y).map_or(&[], Vec::as_slice)
    }

    /// Tile index containing a pixel position
    #[inline]
    pub fn to_tile(&self, pos: IVec2) -> IVec2 {
        IVec2::new(
            pos.x.div_euclid(self.tile_size.x),
            pos.y.div_euclid(self.tile_size.y),
        )
    }

    /// Pixel position of a tile's top-left corner
    #[inline]
    pub fn to_pixel(&self, tile: IVec2) -> IVec2 {
        tile * self.tile_size
    }

    /// Offset of a pixel position inside its tile
    #[inline]
    pub fn cell_offset(&self, pos: IVec2) -> IVec2 {
        IVec2::new(
            pos.x.rem_euclid(self.tile_size.x),
            pos.y.rem_euclid(self.tile_size.y),
        )
    }

    /// Zero remainder on both axes
    #[inline]
    pub fn is_aligned(&self, pos: IVec2) -> bool {
        self.cell_offset(pos) == IVec2::ZERO
    }

    /// Symbol at a tile, None outside the grid
    pub fn symbol(&self, tile: IVec2) -> Option<u8> {
        let x = usize::try_from(tile.x).ok()?;
        let y = usize::try_from(tile.y).ok()?;
        self.rows.get(y)?.get(x).copied()
    }

    /// Whether a vehicle may occupy the tile (outside the grid is closed)
    pub fn is_open(&self, tile: IVec2) -> bool {
        self.kind(tile).is_some_and(TileKind::is_open)
    }

    /// Whether the tile under a pixel position is open
    pub fn is_open_at(&self, pos: IVec2) -> bool {
        self.is_open(self.to_tile(pos))
    }

    /// Kind of the tile, for rendering
    pub fn kind(&self, tile: IVec2) -> Option<TileKind> {
        self.symbol(tile).and_then(TileKind::from_symbol)
    }
}
