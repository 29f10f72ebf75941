//! Replay log round trips: a recorded match read back from disk must reproduce the exact
//! entry sequence, and stepping the cursor must move between the starting and final boards.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::fs;

use holdfast::replay::StepState;
use holdfast::{
    ActionKind, Board, Config, LogEntry, Match, MatchOutcome, Options, RandomSource, ReplayLog,
    Side, XorShift,
};

struct Recorded {
    log: ReplayLog,
    entries: Vec<LogEntry>,
    initial: Board,
    last: Board,
    outcome: MatchOutcome,
}

fn record(config: Config, seed: u64, limit: usize) -> Recorded {
    let dir = tempfile::tempdir().unwrap();
    let mut game = Match::new(config, XorShift::new(seed));
    let path = game.record_to(dir.path()).unwrap();
    let initial = game.board().clone();
    let mut picker = XorShift::new(seed.rotate_left(17));
    let mut entries = Vec::new();

    for _ in 0..limit {
        if game.is_finished() {
            break;
        }
        let actions = game.legal_actions();
        let outcome = if actions.is_empty() {
            game.apply_action(0, 0, ActionKind::Pass).unwrap()
        } else {
            let action = actions[picker.next_below(actions.len())];
            game.apply_action(action.piece, action.destination, action.kind)
                .unwrap()
        };
        entries.extend(outcome.entries);
    }
    if !game.is_finished() {
        entries.extend(game.declare_draw().unwrap().entries);
    }

    let log = ReplayLog::open(&path).unwrap();
    Recorded {
        log,
        entries,
        initial,
        last: game.board().clone(),
        outcome: game.outcome().unwrap(),
    }
}

fn same_layout(a: &Board, b: &Board) -> bool {
    a.tiles() == b.tiles()
        && a.tops() == b.tops()
        && a.positions(Side::Own) == b.positions(Side::Own)
        && a.positions(Side::Enemy) == b.positions(Side::Enemy)
}

#[test]
fn test_log_reproduces_entries() {
    for seed in [3u64, 8, 13] {
        let recorded = record(Config::default(), seed, 300);
        assert_eq!(recorded.log.entries, recorded.entries);
        assert_eq!(
            recorded.log.entries.last(),
            Some(&LogEntry::Finish(recorded.outcome))
        );
    }
}

#[test]
fn test_preamble_rebuilds_starting_board() {
    let config = Config {
        width: 10,
        options: Options::ALL,
        tile_amounts: [2, 4, 8, 4, 2, 3],
        ..Config::default()
    };
    let recorded = record(config.clone(), 42, 60);
    assert_eq!(recorded.log.config, config.balance());
    assert_eq!(recorded.log.initial_board(), recorded.initial);
}

#[test]
fn test_cursor_walks_between_endpoints() {
    let recorded = record(Config::default(), 17, 400);
    let mut cursor = recorded.log.cursor();
    assert_eq!(cursor.position(), 0);
    assert!(!cursor.can_prev());
    assert!(cursor.prev().is_none());

    let mut forward = 0;
    while let Some(step) = cursor.next() {
        assert_eq!(step.index, forward);
        assert_eq!(step.state, step.entry.state(true));
        forward += 1;
    }
    assert_eq!(forward, recorded.entries.len());
    assert_eq!(cursor.position(), cursor.len());
    assert!(same_layout(cursor.board(), &recorded.last));
    assert!(matches!(
        cursor.prev().map(|step| step.state),
        Some(StepState::Finish(_))
    ));
    assert!(cursor.next().is_some());

    while cursor.prev().is_some() {}
    assert_eq!(cursor.position(), 0);
    assert_eq!(cursor.board(), &recorded.initial);
}

#[test]
fn test_seek_end_matches_stepping() {
    let recorded = record(Config::default(), 29, 200);
    let mut cursor = recorded.log.cursor();
    cursor.seek_end();
    assert!(!cursor.can_next());
    assert!(same_layout(cursor.board(), &recorded.last));
}

#[test]
fn test_foreign_lines_are_skipped() {
    let recorded = record(Config::default(), 5, 40);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("edited.log");
    let mut text = String::from("; exported by a newer client\n[Comments]\nnote=hello\n");
    text.push_str(&format!(
        "{}\nname={}\nmystery=1\n{}\n",
        holdfast::replay::CONFIG_SECTION,
        recorded.log.config.name,
        holdfast::replay::ACTION_SECTION
    ));
    for entry in &recorded.entries {
        text.push_str(&entry.to_string());
        text.push('\n');
        text.push_str("teleport=1,2,3\n");
    }
    fs::write(&path, text).unwrap();

    let log = ReplayLog::open(&path).unwrap();
    assert_eq!(log.entries, recorded.entries);
    assert_eq!(log.config.name, recorded.log.config.name);
}
