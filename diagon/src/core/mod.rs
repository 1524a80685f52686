//! Pure, deterministic logic shared by the stop gate.
//!
//! Core modules must be free of I/O side effects. They operate on plain values
//! (attempt counters, elapsed durations, failure text) and return deterministic
//! outputs suitable for tests.

pub mod limits;
pub mod message;
pub mod types;
