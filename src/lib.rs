// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Holdfast: a deterministic rules engine for a two-sided territory-capture board game.
//!
//! The board is a rectangular home region per side with a shared middle strip between them.
//! This crate decides which moves are legal and what they do. It tracks how much of a turn is
//! spent, repairs match configurations so that they are always playable, and records every
//! board mutation in a replay log that can be stepped forward and backward.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Match (turn controller)           │
//! ├──────────────────┬──────────────────┤
//! │  Move collector  │   Turn record    │
//! ├──────────────────┴──────────────────┤
//! │   Shortest-path search / grid       │
//! ├─────────────────────────────────────┤
//! │   Board  ·  Config  ·  Replay log   │
//! └─────────────────────────────────────┘
//! ```
//!
//! Rendering, input and networking are not part of this crate. Collaborators feed it actions
//! and read back the log entries it produces.

pub mod board;
pub mod config;
pub mod error;
pub mod moves;
pub mod replay;
pub mod rng;
pub mod turn;

pub use error::{ActionError, LogError, WireError};

// Re-export key types at crate root for convenience
pub use board::{Board, GridSize, Piece, PieceId, PieceType, Side, Tile, TileType};
pub use config::{Config, Options};
pub use moves::{MoveContext, MoveSet, Passability, distances};
pub use replay::{LogEntry, ReplayLog, ReplayWriter};
pub use rng::{RandomSource, XorShift};
pub use turn::{
    Action, ActionBits, ActionKind, ActionOutcome, Favor, Match, MatchOutcome, TurnRecord,
    WinReason,
};
