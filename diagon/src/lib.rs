//! Human-in-the-loop stop gate.
//!
//! [`stop_until_resolved`] runs an action and, whenever it fails, blocks on an
//! operator prompt until the operator chooses to retry or abort:
//!
//! - **[`core`]**: pure logic (decisions, limits, prompt text). No I/O.
//! - **[`io`]**: prompters (console, terminal, desktop dialog), configuration,
//!   gated file writes and child-process actions.
//! - **[`gate`]**: the retry loop tying the two together.
//!
//! ```no_run
//! use diagon::{StopConfig, StopGate, select_prompter};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = StopConfig::default();
//! let mut gate = StopGate::new(select_prompter(config.prompt)?, config);
//! gate.run(|| std::fs::write("report.csv", b"a,b\n"))?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod exit_codes;
pub mod gate;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use crate::core::types::Decision;
pub use crate::gate::{GateError, StopGate, stop_until_resolved};
pub use crate::io::config::{PromptMode, StopConfig, load_config};
pub use crate::io::file_gate::{gate_write, write_atomic, write_until_resolved};
pub use crate::io::prompter::{
    Operator, OperatorInput, Prompter, answers_from_piped_stdin, select_prompter,
};
