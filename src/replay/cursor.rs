//! Forward and backward navigation over a replay.

use crate::board::{Board, PieceId, TileType};
use crate::replay::LogEntry;
use crate::turn::MatchOutcome;

/// Value an entry leaves on the board after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepState {
    /// Piece position (`None` = off-board).
    Piece {
        /// Global piece id.
        id: PieceId,
        /// Tile after the step.
        position: Option<usize>,
    },
    /// Tile terrain.
    Tile {
        /// Tile index.
        id: usize,
        /// Terrain after the step.
        tile_type: TileType,
    },
    /// Fortress breach flag.
    Breach {
        /// Tile index.
        id: usize,
        /// Flag after the step.
        breached: bool,
    },
    /// Top marker position (`None` = off-board).
    Top {
        /// Top slot.
        slot: usize,
        /// Tile after the step.
        position: Option<usize>,
    },
    /// Match result.
    Finish(MatchOutcome),
}

/// Result of one cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Index of the entry that was applied or undone.
    pub index: usize,
    /// That entry.
    pub entry: LogEntry,
    /// Its "to" state on a forward step, its "from" state on a backward step.
    pub state: StepState,
    /// Another forward step is possible.
    pub can_next: bool,
    /// Another backward step is possible.
    pub can_prev: bool,
}

/// Board plus a position in the entry list.
///
/// The position counts applied entries and lies in `0..=len`.
#[derive(Debug, Clone)]
pub struct Cursor {
    board: Board,
    entries: Vec<LogEntry>,
    position: usize,
}

impl Cursor {
    /// Cursor over `entries`, starting from `board` with nothing applied.
    #[must_use]
    pub const fn new(board: Board, entries: Vec<LogEntry>) -> Self {
        Self {
            board,
            entries,
            position: 0,
        }
    }

    /// Board at the current position.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Number of applied entries.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there is nothing to replay.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether [`Cursor::next`] would move.
    #[must_use]
    pub fn can_next(&self) -> bool {
        self.position < self.entries.len()
    }

    /// Whether [`Cursor::prev`] would move.
    #[must_use]
    pub const fn can_prev(&self) -> bool {
        self.position > 0
    }

    /// Apply the next entry. Returns `None` at the end.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Step> {
        let index = self.position;
        let entry = *self.entries.get(index)?;
        self.board.apply_entry(&entry, true);
        self.position += 1;
        Some(self.step(index, entry, true))
    }

    /// Undo the last applied entry. Returns `None` at the start.
    pub fn prev(&mut self) -> Option<Step> {
        let index = self.position.checked_sub(1)?;
        let entry = self.entries[index];
        self.board.apply_entry(&entry, false);
        self.position = index;
        Some(self.step(index, entry, false))
    }

    /// Apply every remaining entry.
    pub fn seek_end(&mut self) {
        while self.next().is_some() {}
    }

    fn step(&self, index: usize, entry: LogEntry, forward: bool) -> Step {
        Step {
            index,
            entry,
            state: entry.state(forward),
            can_next: self.can_next(),
            can_prev: self.can_prev(),
        }
    }
}
