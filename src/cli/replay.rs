//! Replay command implementation.

use super::CliError;
use holdfast::replay::{Step, StepState};
use holdfast::{ReplayLog, Side};
use std::path::Path;

/// Execute the replay command.
///
/// # Errors
///
/// Returns an error if the log cannot be opened or holds no actions.
pub(crate) fn execute(path: &Path, backward: bool) -> Result<(), CliError> {
    let log = ReplayLog::open(path)?;
    let mut cursor = log.cursor();

    println!(
        "Replay: {} ({}x{}, {} entries)",
        log.config.name,
        log.config.width,
        log.config.height,
        cursor.len()
    );

    if backward {
        cursor.seek_end();
        while let Some(step) = cursor.prev() {
            print_step(&step, "<");
        }
    } else {
        while let Some(step) = cursor.next() {
            print_step(&step, ">");
        }
    }
    Ok(())
}

fn print_step(step: &Step, arrow: &str) {
    let state = match step.state {
        StepState::Piece { id, position } => format!("piece {id} at {}", position_text(position)),
        StepState::Tile { id, tile_type } => format!("tile {id} is {tile_type:?}"),
        StepState::Breach { id, breached } => {
            format!("tile {id} {}", if breached { "breached" } else { "intact" })
        }
        StepState::Top { slot, position } => format!("top {slot} at {}", position_text(position)),
        StepState::Finish(outcome) => match outcome.winner() {
            Some(Side::Own) => "own side wins".to_string(),
            Some(Side::Enemy) => "enemy side wins".to_string(),
            None => "draw".to_string(),
        },
    };
    println!("{arrow} #{:<4} {:<24} {state}", step.index, step.entry.to_string());
}

fn position_text(position: Option<usize>) -> String {
    position.map_or_else(|| "off-board".to_string(), |p| p.to_string())
}
