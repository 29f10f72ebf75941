#![no_main]

//! Match turn fuzzer.
//!
//! Drives a match with arbitrary actions. Rejected actions must leave the board untouched and
//! accepted ones must keep every piece on the tile that claims it.

use arbitrary::Arbitrary;
use holdfast::{ActionKind, Config, Favor, Match, Options, Side, XorShift};
use libfuzzer_sys::fuzz_target;

/// A fuzzer-generated action.
#[derive(Arbitrary, Debug, Clone, Copy)]
enum FuzzKind {
    Move,
    Attack,
    Fire,
    Swap,
    Spawn,
    Pass,
    Hasten,
    Assault,
    Conspire,
    Deceive,
}

impl From<FuzzKind> for ActionKind {
    fn from(kind: FuzzKind) -> Self {
        match kind {
            FuzzKind::Move => ActionKind::Move,
            FuzzKind::Attack => ActionKind::Attack,
            FuzzKind::Fire => ActionKind::Fire,
            FuzzKind::Swap => ActionKind::Swap,
            FuzzKind::Spawn => ActionKind::Spawn,
            FuzzKind::Pass => ActionKind::Pass,
            FuzzKind::Hasten => ActionKind::Favor(Favor::Hasten),
            FuzzKind::Assault => ActionKind::Favor(Favor::Assault),
            FuzzKind::Conspire => ActionKind::Favor(Favor::Conspire),
            FuzzKind::Deceive => ActionKind::Favor(Favor::Deceive),
        }
    }
}

/// Structured input for match fuzzing.
#[derive(Arbitrary, Debug)]
struct MatchInput {
    /// Board width before balancing.
    width: u8,
    /// Home height before balancing.
    height: u8,
    /// Option bits before balancing.
    options: u16,
    /// Seed for the board layout.
    seed: u64,
    /// Actions as (piece, destination, kind).
    actions: Vec<(u8, u16, FuzzKind)>,
}

fuzz_target!(|input: MatchInput| {
    let config = Config {
        width: input.width,
        height: input.height,
        options: Options::from_bits(input.options),
        ..Config::default()
    };
    let mut game = Match::new(config, XorShift::new(input.seed | 1));

    for (piece, destination, kind) in input.actions.into_iter().take(512) {
        if game.is_finished() {
            break;
        }
        let before = game.board().clone();
        let piece = usize::from(piece) % game.board().piece_count();
        let destination = usize::from(destination) % game.board().size().len();
        if game.apply_action(piece, destination, kind.into()).is_err() {
            assert_eq!(game.board(), &before, "rejected action changed the board");
        }

        let board = game.board();
        for side in [Side::Own, Side::Enemy] {
            for id in board.piece_ids(side) {
                if let Some(at) = board.piece(id).position {
                    assert_eq!(board.occupant(at), Some(id));
                }
            }
        }
    }
});
