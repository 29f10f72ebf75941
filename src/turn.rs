//! Turn bookkeeping and the match controller.
//!
//! - [`TurnRecord`]: per-turn ledger of who did what, and when the turn is spent
//! - [`Match`]: validates actions, applies their board effects and emits log entries

mod controller;
mod record;

pub use controller::{Action, ActionKind, ActionOutcome, Favor, Match, MatchOutcome, WinReason};
pub use record::{ActionBits, Protection, TurnRecord};
