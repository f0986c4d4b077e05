//! Fuzz target: `Command::parse` and `WorkerArgs::parse`
//!
//! Splits arbitrary bytes into whitespace-separated words, the way the
//! console loop does, and feeds them to both parsers.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Only `start`, `stop` and `status` parse as commands
//! - Every `start` parameter is either consumed as `-p <pulse>` or ignored
//!
//! cargo fuzz run fuzz_command_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use rovercontrol::app::commands::Command;
use rovercontrol::app::worker::WorkerArgs;

fuzz_target!(|data: &[u8]| {
    let line = String::from_utf8_lossy(data);
    let words: Vec<&str> = line.split_whitespace().collect();

    match Command::parse(&words) {
        Ok(Command::Start { params }) => {
            assert_eq!(words[0], "start");
            let args = WorkerArgs::parse(&params);
            let consumed = if args.drive_pulse_us.is_some() { 2 } else { 0 };
            assert!(args.ignored.len() + consumed <= params.len());
        }
        Ok(_) => assert!(matches!(words[0], "stop" | "status")),
        Err(_) => assert!(!matches!(words.first(), Some(&("start" | "stop" | "status")))),
    }
});
