//! Test-only helpers: scripted operators and actions that fail on cue.

use std::collections::VecDeque;
use std::io;

use anyhow::{Result, anyhow};

use crate::core::types::Decision;
use crate::io::prompter::{OperatorInput, Prompter, resolve_answer};

/// Operator that replays queued answers and records everything it was shown.
///
/// Asking past the end of the queue is an error, which tests use to simulate
/// a prompter that cannot be shown.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    decisions: VecDeque<Decision>,
    inputs: VecDeque<Option<String>>,
    /// `(title, message)` of every retry/abort prompt.
    pub asked: Vec<(String, String)>,
    /// Message of every text input request.
    pub inputs_asked: Vec<String>,
    pub notices: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(decisions: Vec<Decision>) -> Self {
        Self {
            decisions: decisions.into(),
            ..Self::default()
        }
    }

    pub fn with_inputs(mut self, inputs: Vec<Option<String>>) -> Self {
        self.inputs = inputs.into();
        self
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, title: &str, message: &str) -> Result<Decision> {
        self.asked.push((title.to_string(), message.to_string()));
        self.decisions
            .pop_front()
            .ok_or_else(|| anyhow!("scripted prompter has no decision left"))
    }
}

impl OperatorInput for ScriptedPrompter {
    fn input(&mut self, _title: &str, message: &str, default: &str) -> Result<Option<String>> {
        self.inputs_asked.push(message.to_string());
        let answer = self
            .inputs
            .pop_front()
            .ok_or_else(|| anyhow!("scripted prompter has no input left"))?;
        Ok(answer.and_then(|a| resolve_answer(&a, default)))
    }

    fn notify(&mut self, _title: Option<&str>, message: &str) -> Result<()> {
        self.notices.push(message.to_string());
        Ok(())
    }
}

/// Action that fails a fixed number of times, then succeeds.
#[derive(Debug)]
pub struct FlakyAction {
    failures: u32,
    kind: io::ErrorKind,
    pub calls: u32,
}

impl FlakyAction {
    pub fn new(failures: u32) -> Self {
        Self {
            failures,
            kind: io::ErrorKind::Other,
            calls: 0,
        }
    }

    pub fn always_failing() -> Self {
        Self::new(u32::MAX)
    }

    pub fn with_kind(mut self, kind: io::ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn call(&mut self) -> io::Result<()> {
        self.calls += 1;
        if self.calls <= self.failures {
            return Err(io::Error::new(
                self.kind,
                format!("simulated failure {}", self.calls),
            ));
        }
        Ok(())
    }
}
