#![no_main]

//! Configuration fuzzer.
//!
//! Any byte string that decodes must balance into a configuration that is stable under a
//! second pass, survives the wire layout and can be laid out as a board.

use holdfast::{Board, Config, XorShift};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = Config::from_wire(data) else {
        return;
    };
    let config = raw.balance();
    assert_eq!(config.clone().balance(), config, "balance not idempotent");

    let decoded = Config::from_wire(&config.to_wire()).expect("balanced config re-decodes");
    assert_eq!(decoded, config);

    let tiles: usize = config.tile_amounts.iter().map(|&a| usize::from(a)).sum();
    assert!(tiles <= config.home_area());
    assert!(config.piece_total() <= config.home_area());

    let mut rng = XorShift::new(data.len() as u64 + 1);
    let board = Board::setup(&config, &mut rng);
    assert_eq!(board.size(), config.board_size());
});
