//! Integration tests: whole matches driven through the public API.
//!
//! Random play with a seeded picker must never trip an error for an action the engine itself
//! listed as legal, and the board must stay internally consistent after every action.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use holdfast::{
    Action, ActionError, ActionKind, Board, Config, Favor, Match, MatchOutcome, Options,
    RandomSource, Side, TileType, XorShift,
};

const ACTION_LIMIT: usize = 4000;

fn assert_consistent(board: &Board) {
    for side in [Side::Own, Side::Enemy] {
        for id in board.piece_ids(side) {
            if let Some(position) = board.piece(id).position {
                assert_eq!(board.occupant(position), Some(id), "piece {id} not on its tile");
            }
        }
    }
    for (index, tile) in board.tiles().iter().enumerate() {
        if tile.breached {
            assert_eq!(tile.tile_type, TileType::Fortress, "breach on non-fortress {index}");
        }
        if let Some(id) = board.occupant(index) {
            assert_eq!(board.piece(id).position, Some(index));
        }
        if let Some(slot) = tile.top {
            assert_eq!(board.tops()[slot].position, Some(index));
        }
    }
}

fn pick(game: &Match<XorShift>, picker: &mut XorShift) -> Action {
    let actions = game.legal_actions();
    if actions.is_empty() {
        return Action {
            piece: 0,
            destination: 0,
            kind: ActionKind::Pass,
        };
    }
    actions[picker.next_below(actions.len())]
}

/// Play until the match ends or the action limit is hit. Returns the number of actions taken.
fn play_out(game: &mut Match<XorShift>, picker: &mut XorShift) -> usize {
    let mut taken = 0;
    while !game.is_finished() && taken < ACTION_LIMIT {
        let action = pick(game, picker);
        let outcome = game
            .apply_action(action.piece, action.destination, action.kind)
            .unwrap_or_else(|e| panic!("listed action {action:?} rejected: {e}"));
        assert_consistent(game.board());
        if outcome.finished.is_some() {
            assert!(outcome.turn_ended);
            assert!(matches!(outcome.entries.last(), Some(holdfast::LogEntry::Finish(_))));
        }
        taken += 1;
    }
    taken
}

#[test]
fn test_random_matches_stay_consistent() {
    for seed in 1..=40u64 {
        let mut game = Match::new(Config::default(), XorShift::new(seed));
        let mut picker = XorShift::new(seed.wrapping_mul(0x9E37_79B9));
        assert_consistent(game.board());
        play_out(&mut game, &mut picker);
        if !game.is_finished() {
            game.declare_draw().unwrap();
        }
        assert!(game.outcome().is_some());
    }
}

#[test]
fn test_random_matches_with_every_option() {
    let config = Config {
        width: 11,
        height: 5,
        options: Options::ALL,
        tile_amounts: [3, 5, 10, 5, 4, 5],
        middle_amounts: [1, 1, 1, 1, 0],
        victory_points: 15,
        ..Config::default()
    };
    for seed in 1..=20u64 {
        let mut game = Match::new(config.clone(), XorShift::new(seed));
        let mut picker = XorShift::new(seed ^ 0xABCD);
        play_out(&mut game, &mut picker);
        assert_consistent(game.board());
    }
}

#[test]
fn test_victory_points_race_ends_in_points() {
    let config = Config {
        options: Options::VICTORY_POINTS,
        victory_points: 1,
        middle_amounts: [4, 0, 0, 0, 0],
        ..Config::default()
    };
    let mut finished_by_points = false;
    for seed in 1..=30u64 {
        let mut game = Match::new(config.clone(), XorShift::new(seed));
        let mut picker = XorShift::new(seed + 77);
        play_out(&mut game, &mut picker);
        if let Some(MatchOutcome::Victory { side, reason }) = game.outcome() {
            if reason == holdfast::WinReason::VictoryPoints {
                assert!(game.points(side) >= 1);
                finished_by_points = true;
            }
        }
    }
    assert!(finished_by_points, "no seed reached a victory-points win");
}

#[test]
fn test_only_passing_draws_after_battle_pass() {
    let config = Config {
        battle_pass: 3,
        ..Config::default()
    };
    let mut game = Match::new(config, XorShift::new(5));
    let mut passes = 0;
    while !game.is_finished() {
        let outcome = game.apply_action(0, 0, ActionKind::Pass).unwrap();
        assert!(outcome.turn_ended);
        passes += 1;
        assert!(passes <= 3, "match did not end after the pass threshold");
    }
    assert_eq!(game.outcome(), Some(MatchOutcome::Draw));
    assert!(matches!(
        game.apply_action(0, 0, ActionKind::Pass),
        Err(ActionError::MatchFinished)
    ));
}

#[test]
fn test_rejected_actions_leave_match_unchanged() {
    let mut game = Match::new(Config::default(), XorShift::new(11));
    let mut picker = XorShift::new(99);
    for _ in 0..200 {
        if game.is_finished() {
            break;
        }
        let before = game.board().clone();
        let side = game.side_to_move();
        let size = game.board().size().len();
        let piece = picker.next_below(game.board().piece_count());
        let destination = picker.next_below(size);
        let kind = [
            ActionKind::Move,
            ActionKind::Attack,
            ActionKind::Fire,
            ActionKind::Swap,
            ActionKind::Spawn,
        ][picker.next_below(5)];
        if game.apply_action(piece, destination, kind).is_err() {
            assert_eq!(game.board(), &before);
            assert_eq!(game.side_to_move(), side);
        }
        assert_consistent(game.board());
    }
}

#[test]
fn test_favors_are_limited_per_match() {
    let config = Config {
        options: Options::FAVORS,
        favor_limit: 2,
        ..Config::default()
    };
    let mut game = Match::new(config, XorShift::new(21));
    let mut picker = XorShift::new(4);
    let mut spent = 0;
    for _ in 0..400 {
        if game.is_finished() {
            break;
        }
        let side = game.side_to_move();
        let left = game.favors_left(side);
        let movers: Vec<Action> = game
            .legal_actions()
            .into_iter()
            .filter(|a| a.kind == ActionKind::Move)
            .collect();
        if let Some(&action) = movers.first() {
            let result = game.apply_action(
                action.piece,
                action.destination,
                ActionKind::Favor(Favor::Hasten),
            );
            match result {
                Ok(outcome) => {
                    assert_eq!(outcome.turn_ended, outcome.finished.is_some());
                    assert_eq!(game.favors_left(side), left - 1);
                    spent += 1;
                }
                Err(ActionError::FavorUnavailable) => assert_eq!(left, 0),
                Err(ActionError::AlreadyActed(_)) => {}
                Err(e) => panic!("unexpected rejection: {e}"),
            }
        }
        game.apply_action(0, 0, ActionKind::Pass).ok();
    }
    assert!((1..=4).contains(&spent));
    assert!(game.favors_left(Side::Own) == 0 || game.is_finished());
}
