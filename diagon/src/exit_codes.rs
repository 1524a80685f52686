//! Stable exit codes for `diagon` commands.

/// The action succeeded (possibly after retries), or the file was written.
pub const OK: i32 = 0;
/// Invalid arguments/config, or an operator prompt could not be shown.
pub const INVALID: i32 = 1;
/// The operator chose to abort.
pub const ABORTED: i32 = 2;
/// `max_attempts` or `deadline_secs` was reached.
pub const LIMIT: i32 = 3;
/// `diagon write` was cancelled at the destination prompt.
pub const CANCELLED: i32 = 4;
