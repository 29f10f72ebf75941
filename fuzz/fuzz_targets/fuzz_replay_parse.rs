#![no_main]

//! Replay log parser fuzzer.
//!
//! Arbitrary text must either be rejected or produce a log whose cursor can walk to the end
//! and back to the starting board.

use holdfast::ReplayLog;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|text: &str| {
    let Ok(log) = ReplayLog::parse(text) else {
        return;
    };
    let mut cursor = log.cursor();
    while cursor.next().is_some() {}
    assert_eq!(cursor.position(), cursor.len());
    while cursor.prev().is_some() {}
    assert_eq!(cursor.position(), 0);
});
