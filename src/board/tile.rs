//! Tile and top-marker types.

use serde::{Deserialize, Serialize};

use crate::board::Side;

/// Type of terrain on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum TileType {
    /// Open ground.
    #[default]
    Empty = 0,
    /// Capturable structure; can be breached.
    Fortress = 1,
    /// Gives soft cover against ranged fire.
    Forest = 2,
    /// Open farmland.
    Plains = 3,
    /// Ship terrain.
    Water = 4,
    /// Impassable with terrain rules on.
    Mountain = 5,
    /// Ship terrain that links to other ports.
    Port = 6,
}

impl TileType {
    /// Types placed in a home region, in amount-table order.
    pub const PLACEABLE: [TileType; 6] = [
        TileType::Fortress,
        TileType::Forest,
        TileType::Plains,
        TileType::Water,
        TileType::Mountain,
        TileType::Port,
    ];

    /// Types placed in the middle strip, in amount-table order.
    pub const MIDDLE: [TileType; 5] = [
        TileType::Fortress,
        TileType::Forest,
        TileType::Plains,
        TileType::Water,
        TileType::Mountain,
    ];

    /// Numeric code used by the replay log.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Inverse of [`TileType::code`].
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(TileType::Empty),
            1 => Some(TileType::Fortress),
            2 => Some(TileType::Forest),
            3 => Some(TileType::Plains),
            4 => Some(TileType::Water),
            5 => Some(TileType::Mountain),
            6 => Some(TileType::Port),
            _ => None,
        }
    }

    /// Terrain a ship can sail through.
    #[must_use]
    pub const fn is_chain(self) -> bool {
        matches!(self, TileType::Water | TileType::Port)
    }
}

/// Kind of structure placed on top of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopKind {
    /// Placed on home plains at setup.
    Farm,
    /// Placed on a captured fortress.
    City,
}

/// A top marker slot: fixed kind and side, movable position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopSlot {
    /// Farm or city.
    pub kind: TopKind,
    /// Side the marker is aligned to.
    pub side: Side,
    /// Tile the marker stands on, `None` while unplaced or razed.
    pub position: Option<usize>,
}

/// A single tile on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tile {
    /// Type of terrain.
    pub tile_type: TileType,
    /// Broken open; only ever true on a fortress.
    pub breached: bool,
    /// Slot of the top marker standing here.
    pub top: Option<usize>,
}

impl Tile {
    /// Create a fresh tile of the given type.
    #[must_use]
    pub const fn new(tile_type: TileType) -> Self {
        Self {
            tile_type,
            breached: false,
            top: None,
        }
    }

    /// Unbreached fortress.
    #[must_use]
    pub const fn is_intact_fortress(&self) -> bool {
        matches!(self.tile_type, TileType::Fortress) && !self.breached
    }
}
