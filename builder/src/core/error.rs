//! Typed error kinds for the component boundaries.
//!
//! Authorization rejections are NOT errors: they are expected, logged
//! decisions represented by [`crate::core::types::Verdict`]. Everything here
//! aborts the run when it surfaces.

use std::path::PathBuf;

use thiserror::Error;

/// Failures of the state store (`project.md`, `rules.json`, `progress.json`).
#[derive(Debug, Error)]
pub enum StateError {
    /// A backing document does not exist.
    #[error("missing state document {path}")]
    Missing { path: PathBuf },

    /// A backing document exists but could not be read (permissions, it is a
    /// directory, I/O failure).
    #[error("failed to read state document {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    /// A backing document exists but cannot be parsed as its expected form.
    #[error("malformed state document {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// The new record could not be fully persisted. The old record stays
    /// readable (write-then-rename).
    #[error("failed to persist {path}: {reason}")]
    WriteFailure { path: PathBuf, reason: String },
}

/// Failures of the model gateway. No retry is performed internally; either
/// kind is terminal for the run.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure: the backend could not be reached (spawn
    /// failure, broken pipe, timeout).
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// The backend was reached but returned a non-success response.
    #[error("backend error: {0}")]
    Backend(String),
}

/// The whole reply contained zero recognizable file blocks.
///
/// A whitespace-only reply is NOT malformed; it parses to an empty block
/// sequence and simply results in no writes.
#[derive(Debug, Error)]
#[error("reply contains no recognizable file blocks")]
pub struct ParseMalformed;

/// Invalid progress transition reported by an otherwise accepted
/// `progress.json` block.
#[derive(Debug, Error)]
pub enum ProgressError {
    /// The progress signal named an empty next step.
    #[error("progress signal has empty next step")]
    EmptyNext,

    /// The reported next step already appears in `completed`.
    #[error("next step {step:?} is already completed")]
    AlreadyCompleted { step: String },

    /// The block content is not a JSON object with a string `next` field.
    #[error("progress signal is not a JSON object with a string `next` field: {reason}")]
    MalformedSignal { reason: String },
}
