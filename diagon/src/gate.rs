//! The stop gate: run an action, and after every failure ask a human whether
//! to try again.
//!
//! ```text
//! RUNNING ──ok──▶ SUCCESS
//!    │
//!   err ──limit hit──▶ EXHAUSTED
//!    │
//!    ▼
//! PROMPTING ──retry──▶ RUNNING
//!    │
//!  abort ──▶ ABORTED
//! ```
//!
//! The action is invoked on the caller's thread and never concurrently with
//! itself; each retry waits for the operator.

use std::error::Error as StdError;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::core::limits::{LimitHit, check_limits};
use crate::core::message::{failure_message, render_failure};
use crate::core::types::Decision;
use crate::io::config::StopConfig;
use crate::io::prompter::Prompter;

/// Boxed action failure kept as the `source` of a [`GateError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Why the gate returned without a successful attempt.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("aborted by operator after {attempts} failed attempt(s)")]
    Aborted {
        attempts: u32,
        #[source]
        last_failure: BoxError,
    },

    #[error("gave up after {attempts} failed attempt(s) (max_attempts = {max_attempts})")]
    AttemptsExhausted {
        attempts: u32,
        max_attempts: u32,
        #[source]
        last_failure: BoxError,
    },

    #[error("deadline of {deadline:?} reached after {attempts} failed attempt(s)")]
    DeadlineReached {
        attempts: u32,
        deadline: Duration,
        #[source]
        last_failure: BoxError,
    },

    /// The operator could not be asked; the action is not retried.
    #[error("could not prompt the operator after {attempts} failed attempt(s)")]
    PromptFailed {
        attempts: u32,
        #[source]
        source: BoxError,
    },
}

impl GateError {
    /// Number of failed attempts before the gate stopped.
    pub fn attempts(&self) -> u32 {
        match self {
            GateError::Aborted { attempts, .. }
            | GateError::AttemptsExhausted { attempts, .. }
            | GateError::DeadlineReached { attempts, .. }
            | GateError::PromptFailed { attempts, .. } => *attempts,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, GateError::Aborted { .. })
    }

    /// True when a configured attempt or deadline limit stopped the gate.
    pub fn is_limit(&self) -> bool {
        matches!(
            self,
            GateError::AttemptsExhausted { .. } | GateError::DeadlineReached { .. }
        )
    }

    /// The failure of the most recent attempt, if the gate stopped because of one.
    pub fn last_failure(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            GateError::Aborted { last_failure, .. }
            | GateError::AttemptsExhausted { last_failure, .. }
            | GateError::DeadlineReached { last_failure, .. } => Some(last_failure.as_ref()),
            GateError::PromptFailed { .. } => None,
        }
    }
}

fn limit_error(hit: LimitHit, attempts: u32, last_failure: anyhow::Error) -> GateError {
    let last_failure: BoxError = last_failure.into();
    match hit {
        LimitHit::Attempts { max_attempts, .. } => GateError::AttemptsExhausted {
            attempts,
            max_attempts,
            last_failure,
        },
        LimitHit::Deadline { deadline, .. } => GateError::DeadlineReached {
            attempts,
            deadline,
            last_failure,
        },
    }
}

/// Run `action` until it succeeds or the operator aborts.
///
/// Every failure is shown to the operator through `prompter`; nothing is
/// retried without an explicit retry decision. Configured limits end the loop
/// before prompting.
#[instrument(skip_all, fields(title = %config.title))]
pub fn stop_until_resolved<T, E, F, P>(
    mut action: F,
    prompter: &mut P,
    config: &StopConfig,
) -> Result<T, GateError>
where
    F: FnMut() -> Result<T, E>,
    E: Into<anyhow::Error>,
    P: Prompter + ?Sized,
{
    let limits = config.limits();
    let started = Instant::now();
    let mut attempts = 0u32;

    loop {
        let failure: anyhow::Error = match action() {
            Ok(value) => {
                if attempts > 0 {
                    info!(attempts = attempts + 1, "action succeeded after retry");
                } else {
                    debug!("action succeeded");
                }
                return Ok(value);
            }
            Err(err) => err.into(),
        };
        attempts = attempts.saturating_add(1);
        let details = render_failure(&failure);
        warn!(attempts, failure = %details, "action failed");

        if let Some(hit) = check_limits(&limits, attempts, started.elapsed()) {
            warn!(?hit, "limit reached, not prompting");
            return Err(limit_error(hit, attempts, failure));
        }

        let message = failure_message(config.show_details.then_some(details.as_str()));
        let decision = match prompter.ask(&config.title, &message) {
            Ok(decision) => decision,
            Err(err) => {
                error!(attempts, err = %format!("{err:#}"), "operator prompt failed");
                return Err(GateError::PromptFailed {
                    attempts,
                    source: err.into(),
                });
            }
        };
        info!(attempts, decision = decision.as_str(), "operator answered");

        if decision == Decision::Abort {
            return Err(GateError::Aborted {
                attempts,
                last_failure: failure.into(),
            });
        }
    }
}

/// A stop gate bound to a prompter chosen at construction.
pub struct StopGate<P> {
    prompter: P,
    config: StopConfig,
}

impl<P: Prompter> StopGate<P> {
    pub fn new(prompter: P, config: StopConfig) -> Self {
        Self { prompter, config }
    }

    pub fn with_defaults(prompter: P) -> Self {
        Self::new(prompter, StopConfig::default())
    }

    pub fn into_prompter(self) -> P {
        self.prompter
    }

    /// Run `action` under this gate. See [`stop_until_resolved`].
    pub fn run<T, E, F>(&mut self, action: F) -> Result<T, GateError>
    where
        F: FnMut() -> Result<T, E>,
        E: Into<anyhow::Error>,
    {
        stop_until_resolved(action, &mut self.prompter, &self.config)
    }

    /// Wrap `f` so every call of the returned closure runs it under this gate.
    pub fn wrap<T, E, F>(&mut self, mut f: F) -> impl FnMut() -> Result<T, GateError>
    where
        F: FnMut() -> Result<T, E>,
        E: Into<anyhow::Error>,
    {
        move || self.run(&mut f)
    }
}
