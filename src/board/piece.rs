//! Piece types and sides.

use serde::{Deserialize, Serialize};

use crate::board::TileType;

/// Global piece id: own pieces first, then enemy pieces.
pub type PieceId = usize;

/// The two sides of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The side whose home occupies the low rows.
    Own,
    /// The mirrored side.
    Enemy,
}

impl Side {
    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Side::Own => Side::Enemy,
            Side::Enemy => Side::Own,
        }
    }

    /// 0 for own, 1 for enemy.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Side::Own => 0,
            Side::Enemy => 1,
        }
    }

    /// Keyword used by the replay log.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Side::Own => "own",
            Side::Enemy => "enemy",
        }
    }

    /// Inverse of [`Side::keyword`].
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "own" => Some(Side::Own),
            "enemy" => Some(Side::Enemy),
            _ => None,
        }
    }
}

/// Type of a piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PieceType {
    /// Capturing enough of these wins the match.
    Throne = 0,
    /// Single-step infantry.
    Soldier = 1,
    /// Charges in straight lines.
    Lancer = 2,
    /// Mount; swapping onto it is free.
    Warhorse = 3,
    /// Flies over everything.
    Dragon = 4,
    /// Fires over an area.
    Archer = 5,
    /// Fires in straight lines and breaches fortresses.
    Catapult = 6,
    /// Sails through connected water.
    Ship = 7,
}

impl PieceType {
    /// All piece types, in amount-table order.
    pub const ALL: [PieceType; 8] = [
        PieceType::Throne,
        PieceType::Soldier,
        PieceType::Lancer,
        PieceType::Warhorse,
        PieceType::Dragon,
        PieceType::Archer,
        PieceType::Catapult,
        PieceType::Ship,
    ];

    /// Capturer mask with every type set.
    pub const ALL_MASK: u16 = (1 << PieceType::ALL.len()) - 1;

    /// Bit of this type in a capturer mask.
    #[must_use]
    pub const fn bit(self) -> u16 {
        1 << (self as u16)
    }

    /// Whether a piece of this type may stand on `tile_type`.
    #[must_use]
    pub const fn can_stand(self, tile_type: TileType, terrain: bool) -> bool {
        if matches!(self, PieceType::Ship) {
            return tile_type.is_chain();
        }
        !terrain || !matches!(tile_type, TileType::Water | TileType::Mountain)
    }

    /// Whether this type fires instead of attacking.
    #[must_use]
    pub const fn is_ranged(self) -> bool {
        matches!(self, PieceType::Archer | PieceType::Catapult)
    }
}

/// A single piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    /// Type of piece.
    pub piece_type: PieceType,
    /// Tile the piece stands on, `None` while in reserve or dead.
    pub position: Option<usize>,
    /// Last own fortress a throne stood on.
    pub last_fortress: Option<usize>,
}

impl Piece {
    /// Create a piece in reserve.
    #[must_use]
    pub const fn new(piece_type: PieceType) -> Self {
        Self {
            piece_type,
            position: None,
            last_fortress: None,
        }
    }
}
