//! Shared types for the stop gate loop.

use serde::{Deserialize, Serialize};

/// Operator answer to a failure prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Invoke the action again.
    Retry,
    /// Stop and report the failure to the caller.
    Abort,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Retry => "retry",
            Decision::Abort => "abort",
        }
    }

    /// Interpret a typed console answer. Only `r` or `retry` retries.
    pub fn from_answer(answer: &str) -> Self {
        let answer = answer.trim().to_ascii_lowercase();
        if answer == "r" || answer == "retry" {
            Decision::Retry
        } else {
            Decision::Abort
        }
    }
}
