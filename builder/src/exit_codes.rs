//! Stable exit codes for builder CLI commands.
//!
//! Schedulers invoking `builder step` repeatedly (e.g. cron) rely on these to
//! detect backend or config failures without scraping logs.

/// Command succeeded and a step was executed.
pub const OK: i32 = 0;
/// Command failed (state, backend, parse, or commit error).
pub const INVALID: i32 = 1;
/// `builder step` found `next == "done"` and exited as a no-op.
pub const COMPLETE: i32 = 2;
