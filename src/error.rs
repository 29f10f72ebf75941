//! Error types for the rules engine.
//!
//! Balancing, searching and turn bookkeeping are total and have no error channel. Only the
//! replay log (I/O and parsing), the configuration wire decoder and action validation can fail.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Failure while creating, writing or loading a replay log.
#[derive(Debug)]
pub enum LogError {
    /// The log directory could not be created.
    CreateDir {
        /// Directory that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The log file could not be opened for writing.
    Create {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The log file could not be opened for reading.
    Open {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// Writing an entry failed.
    Write(io::Error),
    /// The log was already closed by its finish entry.
    Closed,
    /// The action section parsed to nothing.
    EmptyActions,
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateDir { path, source } => {
                write!(f, "cannot create log directory {}: {source}", path.display())
            }
            Self::Create { path, source } => {
                write!(f, "cannot open log {} for writing: {source}", path.display())
            }
            Self::Open { path, source } => {
                write!(f, "cannot open log {} for reading: {source}", path.display())
            }
            Self::Write(e) => write!(f, "failed to write log entry: {e}"),
            Self::Closed => write!(f, "log is closed"),
            Self::EmptyActions => write!(f, "log contains no actions"),
        }
    }
}

impl std::error::Error for LogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CreateDir { source, .. }
            | Self::Create { source, .. }
            | Self::Open { source, .. } => Some(source),
            Self::Write(e) => Some(e),
            Self::Closed | Self::EmptyActions => None,
        }
    }
}

impl From<io::Error> for LogError {
    fn from(e: io::Error) -> Self {
        Self::Write(e)
    }
}

/// Failure while decoding a configuration from its wire layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    /// The buffer ended before a field was complete.
    Truncated {
        /// Offset at which the field starts.
        offset: usize,
        /// Bytes the field needs.
        needed: usize,
    },
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { offset, needed } => {
                write!(f, "config truncated: need {needed} byte(s) at offset {offset}")
            }
        }
    }
}

impl std::error::Error for WireError {}

/// A requested action was rejected by the rules.
#[derive(Debug)]
pub enum ActionError {
    /// The match already has an outcome.
    MatchFinished,
    /// The piece belongs to the side that is not moving.
    NotYourPiece(usize),
    /// The piece must be on the board for this action.
    OffBoard(usize),
    /// The piece must be in reserve for this action.
    OnBoard(usize),
    /// The destination is not in the piece's legal set for this action.
    IllegalDestination {
        /// Acting piece.
        piece: usize,
        /// Requested tile.
        destination: usize,
    },
    /// The piece already used this sub-action in the current turn.
    AlreadyActed(usize),
    /// Favors are disabled, used up, or this favor was already spent this turn.
    FavorUnavailable,
    /// Writing the resulting log entries failed.
    Log(LogError),
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MatchFinished => write!(f, "match is already finished"),
            Self::NotYourPiece(id) => write!(f, "piece {id} does not belong to the side to move"),
            Self::OffBoard(id) => write!(f, "piece {id} is not on the board"),
            Self::OnBoard(id) => write!(f, "piece {id} is not in reserve"),
            Self::IllegalDestination { piece, destination } => {
                write!(f, "tile {destination} is not a legal target for piece {piece}")
            }
            Self::AlreadyActed(id) => write!(f, "piece {id} already did that this turn"),
            Self::FavorUnavailable => write!(f, "no favor available"),
            Self::Log(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ActionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Log(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LogError> for ActionError {
    fn from(e: LogError) -> Self {
        Self::Log(e)
    }
}
