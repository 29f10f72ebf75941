//! Replay log.
//!
//! A match is recorded as a preamble (balanced configuration, starting tiles and piece
//! positions) followed by one line per board mutation. Because every entry carries both its
//! old and new value, a log can be stepped forward and backward without re-running the rules.
//!
//! # Format
//!
//! ```text
//! [Config]
//! name=Skirmish
//! width=9
//! tile_amounts=2,4,8,3,2,0
//! tile[0]=3
//! piece_own[0]=12
//! piece_ene[0]=-1
//! [Action]
//! piece=1,12,21
//! tile=40,1,3
//! breach=40,1,0
//! top=3,-1,40
//! finish=own,throne
//! ```
//!
//! Off-board positions are written as `-1`. Unknown sections and lines are skipped on read.

mod cursor;
mod reader;
mod writer;

pub use cursor::{Cursor, Step, StepState};
pub use reader::ReplayLog;
pub use writer::ReplayWriter;

use std::fmt;

use crate::board::{PieceId, Side, TileType};
use crate::turn::{MatchOutcome, WinReason};

/// Section title of the preamble.
pub const CONFIG_SECTION: &str = "[Config]";
/// Section title of the entry list.
pub const ACTION_SECTION: &str = "[Action]";

/// One recorded board mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogEntry {
    /// A piece moved, left the board or entered it.
    Piece {
        /// Global piece id.
        id: PieceId,
        /// Previous tile.
        from: Option<usize>,
        /// New tile.
        to: Option<usize>,
    },
    /// A tile changed terrain.
    Tile {
        /// Tile index.
        id: usize,
        /// Previous terrain.
        old: TileType,
        /// New terrain.
        new: TileType,
    },
    /// A fortress breach flag changed.
    Breach {
        /// Tile index.
        id: usize,
        /// Previous flag.
        old: bool,
        /// New flag.
        new: bool,
    },
    /// A top marker was placed, moved or removed.
    Top {
        /// Top slot.
        slot: usize,
        /// Previous tile.
        from: Option<usize>,
        /// New tile.
        to: Option<usize>,
    },
    /// The match ended.
    Finish(MatchOutcome),
}

impl LogEntry {
    /// Parse the value of an action line with the given key.
    #[must_use]
    pub fn parse(key: &str, value: &str) -> Option<Self> {
        if key == "finish" {
            return parse_outcome(value).map(LogEntry::Finish);
        }
        let fields: Vec<&str> = value.split(',').map(str::trim).collect();
        let [first, second, third] = fields.as_slice() else {
            return None;
        };
        let first: usize = first.parse().ok()?;
        match key {
            "piece" => Some(LogEntry::Piece {
                id: first,
                from: parse_position(second)?,
                to: parse_position(third)?,
            }),
            "tile" => Some(LogEntry::Tile {
                id: first,
                old: TileType::from_code(second.parse().ok()?)?,
                new: TileType::from_code(third.parse().ok()?)?,
            }),
            "breach" => Some(LogEntry::Breach {
                id: first,
                old: parse_flag(second)?,
                new: parse_flag(third)?,
            }),
            "top" => Some(LogEntry::Top {
                slot: first,
                from: parse_position(second)?,
                to: parse_position(third)?,
            }),
            _ => None,
        }
    }

    /// Value this entry leaves behind when applied forward (`forward`) or undone.
    #[must_use]
    pub const fn state(&self, forward: bool) -> StepState {
        match *self {
            LogEntry::Piece { id, from, to } => StepState::Piece {
                id,
                position: if forward { to } else { from },
            },
            LogEntry::Tile { id, old, new } => StepState::Tile {
                id,
                tile_type: if forward { new } else { old },
            },
            LogEntry::Breach { id, old, new } => StepState::Breach {
                id,
                breached: if forward { new } else { old },
            },
            LogEntry::Top { slot, from, to } => StepState::Top {
                slot,
                position: if forward { to } else { from },
            },
            LogEntry::Finish(outcome) => StepState::Finish(outcome),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            LogEntry::Piece { id, from, to } => {
                write!(f, "piece={id},{},{}", Position(from), Position(to))
            }
            LogEntry::Tile { id, old, new } => write!(f, "tile={id},{},{}", old.code(), new.code()),
            LogEntry::Breach { id, old, new } => {
                write!(f, "breach={id},{},{}", u8::from(old), u8::from(new))
            }
            LogEntry::Top { slot, from, to } => {
                write!(f, "top={slot},{},{}", Position(from), Position(to))
            }
            LogEntry::Finish(MatchOutcome::Draw) => write!(f, "finish=draw"),
            LogEntry::Finish(MatchOutcome::Victory { side, reason }) => {
                write!(f, "finish={},{}", side.keyword(), reason.keyword())
            }
        }
    }
}

/// Tile index or `-1` for off-board.
struct Position(Option<usize>);

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(index) => write!(f, "{index}"),
            None => write!(f, "-1"),
        }
    }
}

/// Parse a position field. Any negative number means off-board.
fn parse_position(text: &str) -> Option<Option<usize>> {
    let value: i64 = text.trim().parse().ok()?;
    Some(usize::try_from(value).ok())
}

fn parse_flag(text: &str) -> Option<bool> {
    match text.trim() {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}

fn parse_outcome(value: &str) -> Option<MatchOutcome> {
    let value = value.trim();
    if value == "draw" {
        return Some(MatchOutcome::Draw);
    }
    let (side, reason) = value.split_once(',')?;
    Some(MatchOutcome::Victory {
        side: Side::from_keyword(side.trim())?,
        reason: WinReason::from_keyword(reason.trim())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reparse(entry: LogEntry) -> Option<LogEntry> {
        let line = entry.to_string();
        let (key, value) = line.split_once('=')?;
        LogEntry::parse(key, value)
    }

    #[test]
    fn test_line_formats() {
        let piece = LogEntry::Piece {
            id: 4,
            from: Some(12),
            to: None,
        };
        assert_eq!(piece.to_string(), "piece=4,12,-1");
        let tile = LogEntry::Tile {
            id: 40,
            old: TileType::Fortress,
            new: TileType::Plains,
        };
        assert_eq!(tile.to_string(), "tile=40,1,3");
        let breach = LogEntry::Breach {
            id: 40,
            old: true,
            new: false,
        };
        assert_eq!(breach.to_string(), "breach=40,1,0");
        let finish = LogEntry::Finish(MatchOutcome::Victory {
            side: Side::Enemy,
            reason: WinReason::Fortress,
        });
        assert_eq!(finish.to_string(), "finish=enemy,fortress");
        assert_eq!(LogEntry::Finish(MatchOutcome::Draw).to_string(), "finish=draw");
    }

    #[test]
    fn test_every_variant_reparses() {
        let entries = [
            LogEntry::Piece {
                id: 0,
                from: None,
                to: Some(7),
            },
            LogEntry::Tile {
                id: 3,
                old: TileType::Empty,
                new: TileType::Port,
            },
            LogEntry::Breach {
                id: 3,
                old: false,
                new: true,
            },
            LogEntry::Top {
                slot: 2,
                from: Some(5),
                to: None,
            },
            LogEntry::Finish(MatchOutcome::Victory {
                side: Side::Own,
                reason: WinReason::SetPieceBattle,
            }),
        ];
        for entry in entries {
            assert_eq!(reparse(entry), Some(entry));
        }
    }

    #[test]
    fn test_malformed_values_rejected() {
        assert_eq!(LogEntry::parse("piece", "1,2"), None);
        assert_eq!(LogEntry::parse("piece", "x,2,3"), None);
        assert_eq!(LogEntry::parse("tile", "1,2,9"), None);
        assert_eq!(LogEntry::parse("breach", "1,2,0"), None);
        assert_eq!(LogEntry::parse("finish", "own,luck"), None);
        assert_eq!(LogEntry::parse("teleport", "1,2,3"), None);
    }

    #[test]
    fn test_negative_positions_are_off_board() {
        assert_eq!(
            LogEntry::parse("top", "1,-7,3"),
            Some(LogEntry::Top {
                slot: 1,
                from: None,
                to: Some(3)
            })
        );
    }

    #[test]
    fn test_state_picks_side_of_entry() {
        let entry = LogEntry::Piece {
            id: 2,
            from: Some(1),
            to: Some(9),
        };
        assert_eq!(
            entry.state(true),
            StepState::Piece {
                id: 2,
                position: Some(9)
            }
        );
        assert_eq!(
            entry.state(false),
            StepState::Piece {
                id: 2,
                position: Some(1)
            }
        );
    }
}
