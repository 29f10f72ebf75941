//! Autoplay command implementation.
//!
//! Both sides pick uniformly among their legal actions, with captures preferred half of the
//! time. The picker has its own seed so the match layout does not depend on it.

use super::{CliError, OutputFormat, read_config};
use holdfast::{Action, ActionKind, Config, Match, MatchOutcome, RandomSource, Side, XorShift};
use serde::Serialize;
use std::path::Path;

/// JSON-serializable match summary.
#[derive(Debug, Serialize)]
struct JsonSummary {
    /// Random seed used.
    seed: u64,
    /// Final result.
    outcome: Option<MatchOutcome>,
    /// Completed turns.
    turns: u32,
    /// Accepted actions.
    actions: u32,
    /// Throne captures per side (own, enemy).
    thrones: [u16; 2],
    /// Fortress captures per side (own, enemy).
    fortresses: [u16; 2],
    /// Replay log path, if one was written.
    log: Option<String>,
}

/// Execute the autoplay command.
///
/// # Errors
///
/// Returns an error if the configuration or the log cannot be used.
pub(crate) fn execute(
    seed: Option<u64>,
    turns: u32,
    log_dir: Option<&Path>,
    config: Option<&Path>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let config = match config {
        Some(path) => read_config(path)?,
        None => Config::default(),
    };

    // Generate seed if not provided
    let seed = seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    });

    let mut game = Match::new(config, XorShift::new(seed));
    let log = match log_dir {
        Some(dir) => Some(game.record_to(dir)?),
        None => None,
    };
    let mut picker = XorShift::new(seed.rotate_left(32) ^ 0x9E37_79B9_7F4A_7C15);

    let mut actions = 0u32;
    while !game.is_finished() && game.turn() < turns {
        let action = choose_action(&game, &mut picker);
        game.apply_action(action.piece, action.destination, action.kind)?;
        actions += 1;
    }
    if !game.is_finished() {
        game.declare_draw()?;
    }

    let summary = JsonSummary {
        seed,
        outcome: game.outcome(),
        turns: game.turn(),
        actions,
        thrones: [game.throne_captures(Side::Own), game.throne_captures(Side::Enemy)],
        fortresses: [
            game.fortress_captures(Side::Own),
            game.fortress_captures(Side::Enemy),
        ],
        log: log.map(|p| p.display().to_string()),
    };

    match format {
        OutputFormat::Text => print!("{}", format_text(&summary)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }
    Ok(())
}

/// Pick a random legal action for the side to move, or pass if there is none.
fn choose_action<R: RandomSource>(game: &Match<R>, picker: &mut XorShift) -> Action {
    let (captures, others): (Vec<Action>, Vec<Action>) = game
        .legal_actions()
        .into_iter()
        .partition(|a| matches!(a.kind, ActionKind::Attack | ActionKind::Fire));

    if !captures.is_empty() && (others.is_empty() || picker.next_below(2) == 0) {
        return captures[picker.next_below(captures.len())];
    }
    if others.is_empty() {
        return Action {
            piece: 0,
            destination: 0,
            kind: ActionKind::Pass,
        };
    }
    others[picker.next_below(others.len())]
}

fn format_text(summary: &JsonSummary) -> String {
    let mut output = String::new();
    output.push_str(&format!("Match Result (seed: {})\n", summary.seed));
    let result = match summary.outcome {
        Some(MatchOutcome::Victory { side, reason }) => {
            format!("{} wins ({})", side.keyword(), reason.keyword())
        }
        Some(MatchOutcome::Draw) | None => "draw".to_string(),
    };
    output.push_str(&format!("  Result: {result}\n"));
    output.push_str(&format!("  Turns: {}\n", summary.turns));
    output.push_str(&format!("  Actions: {}\n", summary.actions));
    output.push_str(&format!(
        "  Thrones captured: own {} / enemy {}\n",
        summary.thrones[0], summary.thrones[1]
    ));
    output.push_str(&format!(
        "  Fortresses captured: own {} / enemy {}\n",
        summary.fortresses[0], summary.fortresses[1]
    ));
    if let Some(log) = &summary.log {
        output.push_str(&format!("  Log: {log}\n"));
    }
    output
}
