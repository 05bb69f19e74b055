//! Fatal configuration errors.
//!
//! Everything here is raised while loading a level. The tick loop itself
//! never fails.

use thiserror::Error;

/// A malformed template or placement request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The template has no rows.
    #[error("map template is empty")]
    EmptyTemplate,

    /// Rows of differing width.
    #[error("map row {row} is {found} cells wide, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Border + play area do not fit inside the template.
    #[error("map is {width}x{height} but border and play area need {need_width}x{need_height}")]
    TooSmall {
        width: usize,
        height: usize,
        need_width: usize,
        need_height: usize,
    },

    /// An open cell on the outermost ring would let a vehicle leave the grid.
    #[error("open cell on map border at column {x}, row {y}")]
    OpenBorder { x: usize, y: usize },

    /// A symbol outside the known alphabet.
    #[error("unknown map symbol {symbol:?} at column {x}, row {y}")]
    UnknownSymbol { symbol: char, x: usize, y: usize },

    /// A placement row has no eligible open cell.
    #[error("no open cell to place an object in row {row}")]
    NoOpenCell { row: usize },

    /// More special flags requested than flags placed.
    #[error("cannot mark {wanted} special flags among {placed}")]
    NotEnoughFlags { wanted: usize, placed: usize },

    /// A rock sample asks for an occurrence the group does not have.
    #[error("group {group} has {found} occurrences, sample wants index {wanted}")]
    NotEnoughGroupCells { group: u8, wanted: usize, found: usize },

    /// A start tile is not open.
    #[error("start tile ({x}, {y}) is not open")]
    BlockedStart { x: i32, y: i32 },

    /// Settings failed to parse.
    #[error("invalid settings: {0}")]
    Settings(String),
}

/// Result type for level loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
