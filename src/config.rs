//! Match configuration.
//!
//! A [`Config`] is built from user-chosen totals and then passed through
//! [`Config::balance`], which repairs it into a self-consistent value. After that it is
//! treated as immutable; any change goes through another balance pass.

mod balance;
mod wire;

use serde::{Deserialize, Serialize};

use crate::board::{GridSize, PieceType, TileType};

/// Smallest home width.
pub const MIN_WIDTH: u8 = 5;
/// Largest home width.
pub const MAX_WIDTH: u8 = 15;
/// Smallest home height.
pub const MIN_HEIGHT: u8 = 2;
/// Largest home height.
pub const MAX_HEIGHT: u8 = 8;
/// Largest victory-point target.
pub const MAX_VICTORY_POINTS: u16 = 999;
/// Largest turn limit for a set-piece battle.
pub const MAX_SET_PIECE_BATTLE: u16 = 999;
/// Largest number of favors per side.
pub const MAX_FAVORS: u16 = 9;
/// Largest consecutive-pass limit.
pub const MAX_BATTLE_PASS: u8 = 20;
/// Longest match name in bytes (it is length-prefixed by one byte on the wire).
pub const MAX_NAME_LEN: usize = 255;

/// Number of home tile amount buckets.
pub const TILE_KINDS: usize = TileType::PLACEABLE.len();
/// Number of middle amount buckets.
pub const MIDDLE_KINDS: usize = TileType::MIDDLE.len();
/// Number of piece amount buckets.
pub const PIECE_KINDS: usize = PieceType::ALL.len();

/// Option bit-flags of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(u16);

impl Options {
    /// No options.
    pub const NONE: Options = Options(0);
    /// Win by holding middle fortresses instead of by captures.
    pub const VICTORY_POINTS: Options = Options(1);
    /// Middle tiles are centered in each half.
    pub const VP_EQUIDISTANT: Options = Options(1 << 1);
    /// Every present tile type appears at least once per home row.
    pub const ROW_BALANCING: Options = Options(1 << 2);
    /// Port tiles exist and link to each other.
    pub const PORTS: Options = Options(1 << 3);
    /// Water, mountain and forest rules apply.
    pub const TERRAIN: Options = Options(1 << 4);
    /// Favor actions are available.
    pub const FAVORS: Options = Options(1 << 5);
    /// Every defined bit.
    pub const ALL: Options = Options((1 << 6) - 1);

    /// Wrap raw bits, dropping undefined ones.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Options(bits & Self::ALL.0)
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Whether every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Options) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Options {
    type Output = Options;

    fn bitor(self, rhs: Options) -> Options {
        Options(self.0 | rhs.0)
    }
}

/// Configuration of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Match name.
    pub name: String,
    /// Home region width.
    pub width: u8,
    /// Home region height.
    pub height: u8,
    /// Consecutive passing turns that end the match in a draw (0 = never).
    pub battle_pass: u8,
    /// Option flags.
    pub options: Options,
    /// Points needed to win in victory-points mode.
    pub victory_points: u16,
    /// Turn limit of a set-piece battle (0 = unlimited).
    pub set_piece_battle: u16,
    /// Favors per side per match.
    pub favor_limit: u16,
    /// Home tile amounts, indexed like [`TileType::PLACEABLE`].
    pub tile_amounts: [u16; TILE_KINDS],
    /// Middle tile amounts per half, indexed like [`TileType::MIDDLE`].
    pub middle_amounts: [u16; MIDDLE_KINDS],
    /// Piece amounts per side, indexed like [`PieceType::ALL`].
    pub piece_amounts: [u16; PIECE_KINDS],
    /// Thrones to capture for a win (0 = not a win condition).
    pub win_throne: u16,
    /// Fortresses to capture for a win (0 = not a win condition).
    pub win_fortress: u16,
    /// Mask of piece types allowed to capture fortresses.
    pub capturers: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "Skirmish".to_string(),
            width: 9,
            height: 4,
            battle_pass: 3,
            options: Options::TERRAIN | Options::FAVORS,
            victory_points: 10,
            set_piece_battle: 0,
            favor_limit: 2,
            tile_amounts: [2, 4, 8, 3, 2, 0],
            middle_amounts: [1, 1, 0, 1, 0],
            piece_amounts: [1, 4, 2, 2, 1, 2, 1, 1],
            win_throne: 1,
            win_fortress: 2,
            capturers: PieceType::ALL_MASK,
        }
    }
}

impl Config {
    /// Whether an option is set.
    #[must_use]
    pub const fn has(&self, option: Options) -> bool {
        self.options.contains(option)
    }

    /// Whether victory-points mode is on.
    #[must_use]
    pub const fn is_victory_points(&self) -> bool {
        self.has(Options::VICTORY_POINTS)
    }

    /// Home width in tiles.
    #[must_use]
    pub fn home_width(&self) -> usize {
        usize::from(self.width)
    }

    /// Home height in tiles.
    #[must_use]
    pub fn home_height(&self) -> usize {
        usize::from(self.height)
    }

    /// Tiles in one home region.
    #[must_use]
    pub fn home_area(&self) -> usize {
        self.home_width() * self.home_height()
    }

    /// Full board: both homes plus the middle strip.
    #[must_use]
    pub fn board_size(&self) -> GridSize {
        GridSize::new(self.home_width(), 2 * self.home_height() + 1)
    }

    /// Home amount of a tile type (0 for types without a bucket).
    #[must_use]
    pub fn tile_amount(&self, tile_type: TileType) -> u16 {
        TileType::PLACEABLE
            .iter()
            .position(|&t| t == tile_type)
            .map_or(0, |i| self.tile_amounts[i])
    }

    /// Middle amount of a tile type (0 for types without a bucket).
    #[must_use]
    pub fn middle_amount(&self, tile_type: TileType) -> u16 {
        TileType::MIDDLE
            .iter()
            .position(|&t| t == tile_type)
            .map_or(0, |i| self.middle_amounts[i])
    }

    /// Amount of a piece type per side.
    #[must_use]
    pub fn piece_amount(&self, piece_type: PieceType) -> u16 {
        self.piece_amounts[piece_type as usize]
    }

    /// Pieces per side.
    #[must_use]
    pub fn piece_total(&self) -> usize {
        self.piece_amounts.iter().map(|&a| usize::from(a)).sum()
    }

    /// Piece types of one side in local-index order.
    #[must_use]
    pub fn piece_list(&self) -> Vec<PieceType> {
        PieceType::ALL
            .iter()
            .flat_map(|&t| std::iter::repeat_n(t, usize::from(self.piece_amount(t))))
            .collect()
    }

    /// Whether a piece type may capture fortresses.
    #[must_use]
    pub const fn can_capture_fortress(&self, piece_type: PieceType) -> bool {
        self.capturers & piece_type.bit() != 0
    }
}
