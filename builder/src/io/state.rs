//! State store for the three persisted documents.
//!
//! `project.md` and `rules.json` are read-only inputs; `progress.json` is the
//! only mutable state and is replaced atomically (temp file + rename) so the
//! old record stays readable if the new one cannot be fully written.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::core::error::StateError;
use crate::core::progress::ProgressRecord;
use crate::core::types::RuleSet;
use crate::io::paths::BuilderPaths;

/// Load the three state documents for one invocation.
pub fn load(paths: &BuilderPaths) -> Result<(String, RuleSet, ProgressRecord), StateError> {
    debug!(root = %paths.root.display(), "loading state documents");
    let project = read_document(&paths.project_path)?;
    let rules: RuleSet = parse_json_document(&paths.rules_path)?;
    let progress: ProgressRecord = parse_json_document(&paths.progress_path)?;
    debug!(
        completed = progress.completed.len(),
        next = %progress.next,
        "state loaded"
    );
    Ok((project, rules, progress))
}

/// Atomically persist the full progress record, replacing the prior value.
pub fn save_progress(paths: &BuilderPaths, record: &ProgressRecord) -> Result<(), StateError> {
    debug!(next = %record.next, completed = record.completed.len(), "writing progress record");
    let mut buf = serde_json::to_string_pretty(record).map_err(|err| StateError::WriteFailure {
        path: paths.progress_path.clone(),
        reason: err.to_string(),
    })?;
    buf.push('\n');
    write_atomic(&paths.progress_path, &buf)
}

fn read_document(path: &Path) -> Result<String, StateError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(StateError::Missing {
            path: path.to_path_buf(),
        }),
        Err(err) => Err(StateError::Unreadable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }),
    }
}

fn parse_json_document<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StateError> {
    let contents = read_document(path)?;
    serde_json::from_str(&contents).map_err(|err| StateError::Malformed {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Write-then-rename replace. The rename is the commit point; a failure
/// before it leaves the previous file untouched.
fn write_atomic(path: &Path, contents: &str) -> Result<(), StateError> {
    let write_failure = |reason: String| StateError::WriteFailure {
        path: path.to_path_buf(),
        reason,
    };
    let parent = path
        .parent()
        .ok_or_else(|| write_failure("path has no parent directory".to_string()))?;
    fs::create_dir_all(parent).map_err(|err| write_failure(err.to_string()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents).map_err(|err| write_failure(err.to_string()))?;
    fs::rename(&tmp_path, path).map_err(|err| write_failure(err.to_string()))
}
