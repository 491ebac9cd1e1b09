//! Single-step, file-state-driven build controller.
//!
//! Each invocation loads the persisted project state (`project.md`,
//! `rules.json`, `progress.json`), asks a text-completion backend for exactly
//! one unit of work, parses the reply into file blocks, authorizes each block
//! against a strict write whitelist, commits only the approved changes, and
//! terminates. The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (parsing, authorization,
//!   progress transitions, prompt composition). No I/O, fully testable in
//!   isolation.
//! - **[`io`]**: Side-effecting operations (state store, model gateway,
//!   commit writer, run log). Isolated to enable fakes in tests.
//!
//! [`run`] coordinates core logic with I/O to implement one invocation.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod run;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
