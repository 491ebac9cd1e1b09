//! Write authorization against the fixed whitelist.
//!
//! A path is permitted iff it is exactly `progress.json` or lies strictly
//! within `output/` after normalization. Authorization is a pure decision
//! function with no I/O, which makes it independently testable against the
//! full space of adversarial paths a model reply might produce.

use crate::core::types::{FileBlock, RejectReason, Verdict, WriteDecision};

/// The progress document, writable only through the commit fold.
pub const PROGRESS_FILE: &str = "progress.json";
/// Namespace prefix for generated artifacts.
pub const OUTPUT_PREFIX: &str = "output/";

/// Decide whether one parsed block may be written.
///
/// Accepted decisions carry the normalized path so downstream consumers never
/// re-derive (or forget to re-derive) the whitelist-relative form.
pub fn authorize(block: &FileBlock) -> WriteDecision {
    match check(&block.target_path) {
        Ok(normalized) => WriteDecision {
            block: block.clone(),
            verdict: Verdict::Accepted,
            normalized_path: Some(normalized),
        },
        Err(reason) => WriteDecision {
            block: block.clone(),
            verdict: Verdict::Rejected(reason),
            normalized_path: None,
        },
    }
}

fn check(path: &str) -> Result<String, RejectReason> {
    // Traversal takes precedence: `output/../output/x` normalizes into the
    // whitelist but is rejected anyway.
    if path.split('/').any(|segment| segment == "..") {
        return Err(RejectReason::PathTraversal);
    }
    // Absolute paths and drive-style paths cannot override the namespace.
    if path.starts_with('/') || path.contains(':') {
        return Err(RejectReason::OutsideWhitelist);
    }
    let Some(normalized) = normalize(path) else {
        return Err(RejectReason::OutsideWhitelist);
    };
    if normalized == PROGRESS_FILE
        || normalized
            .strip_prefix(OUTPUT_PREFIX)
            .is_some_and(|rest| !rest.is_empty())
    {
        return Ok(normalized);
    }
    Err(RejectReason::OutsideWhitelist)
}

/// Collapse `.` segments and duplicate separators. Returns `None` for paths
/// with no real segments.
fn normalize(path: &str) -> Option<String> {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}
