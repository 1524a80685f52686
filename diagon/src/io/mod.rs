//! I/O helpers: operator prompts, configuration, file writes and child processes.

pub mod config;
pub mod dialog;
pub mod file_gate;
pub mod process;
pub mod prompter;
