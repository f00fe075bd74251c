#![no_main]
use geiger_core::console::Command;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    for line in data.lines() {
        match Command::parse(line) {
            None => assert!(line.trim().is_empty()),
            Some(Command::Unknown(token)) => assert_eq!(token, line.trim()),
            Some(_) => {}
        }
    }
});
