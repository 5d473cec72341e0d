#![no_main]
//! Fuzz target for config TOML parsing
//!
//! Feeds random bytes as TOML to the config parser to find panics
//! or hangs in deserialization.

use libfuzzer_sys::fuzz_target;

use rootshell::Config;

fuzz_target!(|data: &[u8]| {
    // Try parsing as TOML config - must never panic
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(config) = Config::from_toml(s) {
            // Capacity checks must not panic either
            let _ = config.view_capacity_left(usize::MAX);
            let _ = config.popup_capacity_left(0);
        }
    }
});
