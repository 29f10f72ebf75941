//! Move legality.
//!
//! - Shortest-path search over the grid with a pluggable passability query
//! - Per-piece-type movement shapes composed on top of the search

mod collect;
mod search;

pub use collect::{DRAGON_DIST, MoveContext, MoveSet};
pub use search::{Passability, UNREACHABLE, distances};
