//! Deterministic, pure logic shared by the controller.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod authorize;
pub mod blocks;
pub mod error;
pub mod progress;
pub mod prompt;
pub mod types;
