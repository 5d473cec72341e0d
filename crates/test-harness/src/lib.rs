//! Test harness for rootshell
//!
//! Drives a [`rootshell::Shell`] from the client side without a display.
//!
//! # Modules
//!
//! - `headless`: Client-side driver over a [`ScriptDesktop`]
//! - `assertions`: Common test assertions
//! - `fixtures`: Test fixture helpers

pub mod assertions;
pub mod fixtures;
pub mod headless;

pub use headless::{ShellSnapshot, TestError, TestShell};
pub use rootshell::script::ScriptDesktop;
