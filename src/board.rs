//! Board layer.
//!
//! Holds the static geometry and the mutable state of a match:
//! - Grid arithmetic (8-neighbor adjacency over a linear index)
//! - Tiles with terrain, breach flags and top markers
//! - Two explicit piece collections, one per side
//! - Deterministic setup from a balanced configuration

mod grid;
mod piece;
mod state;
mod tile;

pub use grid::{Direction, GridSize};
pub use piece::{Piece, PieceId, PieceType, Side};
pub use state::Board;
pub use tile::{Tile, TileType, TopKind, TopSlot};
