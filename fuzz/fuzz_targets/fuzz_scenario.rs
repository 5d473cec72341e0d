#![no_main]
//! Fuzz target for scenario replay
//!
//! Parses random bytes as a replay scenario and runs it. Any sequence of
//! client requests and compositor calls must leave the shell consistent:
//! rejected steps are errors, never panics.

use libfuzzer_sys::fuzz_target;

use rootshell::script::{replay, Scenario};
use rootshell::Config;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(scenario) = Scenario::parse(s) else {
        return;
    };

    let report = replay(&scenario, Config::default());

    // Every live view and popup holds exactly its own listeners
    assert_eq!(
        report.listeners,
        report.expected_listeners(),
        "listener count does not match live views and popups"
    );
});
