//! Attempt and deadline limits checked after each failed attempt.

use std::time::Duration;

/// Limits that end the loop without asking the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Limits {
    /// Stop once this many attempts have failed. `None` retries until the operator aborts.
    pub max_attempts: Option<u32>,
    /// Stop on the first failure observed after this much time has passed.
    pub deadline: Option<Duration>,
}

/// Which limit ended the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitHit {
    Attempts { attempts: u32, max_attempts: u32 },
    Deadline { elapsed: Duration, deadline: Duration },
}

/// Check limits after `attempts` failed attempts, `elapsed` since the gate started.
///
/// When both limits are hit by the same failure the deadline is reported.
pub fn check_limits(limits: &Limits, attempts: u32, elapsed: Duration) -> Option<LimitHit> {
    if let Some(deadline) = limits.deadline
        && elapsed >= deadline
    {
        return Some(LimitHit::Deadline { elapsed, deadline });
    }
    if let Some(max_attempts) = limits.max_attempts
        && attempts >= max_attempts
    {
        return Some(LimitHit::Attempts {
            attempts,
            max_attempts,
        });
    }
    None
}
