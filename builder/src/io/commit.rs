//! Commit writer: applies accepted decisions and folds the progress
//! transition.
//!
//! Accepted `output/*` blocks fully replace the target file (the model is
//! expected to emit the complete desired content each time it touches a
//! path). An accepted `progress.json` block is never written verbatim; its
//! content is parsed as a progress signal and folded into the single
//! authoritative transition, which the state store persists atomically.
//!
//! The progress signal is validated BEFORE any output write so a malformed
//! signal aborts the run with nothing on disk changed.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::core::authorize::{OUTPUT_PREFIX, PROGRESS_FILE};
use crate::core::error::ProgressError;
use crate::core::progress::ProgressRecord;
use crate::core::types::WriteDecision;
use crate::io::paths::BuilderPaths;
use crate::io::state;

/// Result of applying one reply's decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Normalized relative paths written under `output/`, in application
    /// order.
    pub writes_performed: Vec<String>,
    /// The progress record after the run (unchanged when the reply carried no
    /// progress block).
    pub progress: ProgressRecord,
    /// Whether the progress transition was applied.
    pub advanced: bool,
}

/// Shape of an accepted `progress.json` block's content. Extra fields are
/// ignored; only the reported next step feeds the transition.
#[derive(Debug, Deserialize)]
struct ProgressSignal {
    next: String,
}

/// Apply accepted decisions in reply order (last block wins per path) and
/// persist the resulting progress record.
pub fn commit(
    paths: &BuilderPaths,
    decisions: &[WriteDecision],
    progress: &ProgressRecord,
) -> Result<CommitOutcome> {
    let accepted: Vec<&WriteDecision> = decisions.iter().filter(|d| d.is_accepted()).collect();

    // Resolve the progress transition first; malformed signals must abort
    // before anything lands on disk. The last accepted progress block wins.
    // Comparison uses the normalized path: `./progress.json` is still the
    // progress file.
    let updated = match accepted
        .iter()
        .rev()
        .find(|d| d.normalized_path.as_deref() == Some(PROGRESS_FILE))
    {
        Some(decision) => {
            let signal = parse_signal(&decision.block.content)?;
            Some(progress.advance(&signal.next)?)
        }
        None => None,
    };

    let mut writes_performed = Vec::new();
    for decision in &accepted {
        let Some(rel_path) = decision.normalized_path.as_deref() else {
            continue;
        };
        if rel_path == PROGRESS_FILE {
            continue;
        }
        let target = resolve_output_target(paths, rel_path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create output dir {}", parent.display()))?;
        }
        fs::write(&target, &decision.block.content)
            .with_context(|| format!("write {}", target.display()))?;
        debug!(path = rel_path, bytes = decision.block.content.len(), "output file written");
        writes_performed.push(rel_path.to_string());
    }

    let (progress, advanced) = match updated {
        Some(record) => {
            state::save_progress(paths, &record)?;
            info!(next = %record.next, "progress advanced");
            (record, true)
        }
        None => (progress.clone(), false),
    };

    Ok(CommitOutcome {
        writes_performed,
        progress,
        advanced,
    })
}

fn parse_signal(content: &str) -> Result<ProgressSignal, ProgressError> {
    serde_json::from_str(content).map_err(|err| ProgressError::MalformedSignal {
        reason: err.to_string(),
    })
}

/// `normalized` comes from the authorizer and starts with `output/`; strip
/// that prefix and anchor under the configured output directory.
fn resolve_output_target(paths: &BuilderPaths, normalized: &str) -> PathBuf {
    let rest = normalized.strip_prefix(OUTPUT_PREFIX).unwrap_or(normalized);
    paths.output_dir.join(rest)
}
