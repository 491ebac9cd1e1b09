//! Append-only run log (`logs/run.jsonl`).
//!
//! One JSON line per invocation: the raw reply, the parse outcome, every
//! authorization decision, and the writes performed. The log is a trailing
//! audit record read by humans, never read back by the controller. Writes are
//! durably committed before the entry is finalized, so a crash between commit
//! and log-write can produce an un-logged but correctly-applied change; the
//! reverse (a logged write that never happened) cannot occur.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::core::types::{FileBlock, Verdict, WriteDecision};

/// How the invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    /// A full pipeline run that reached the commit stage.
    Step,
    /// `next == "done"` at load: nothing composed, called, or written.
    NoOp,
    /// The run aborted before commit; `error` names the failure.
    Aborted,
}

/// Flattened decision record: path, outcome, and reason for rejections.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRecord {
    pub path: String,
    #[serde(flatten)]
    pub verdict: Verdict,
}

impl From<&WriteDecision> for DecisionRecord {
    fn from(decision: &WriteDecision) -> Self {
        Self {
            path: decision.block.target_path.clone(),
            verdict: decision.verdict,
        }
    }
}

/// One append-only audit entry per invocation.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub kind: RunKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_reply: Option<String>,
    pub parsed_blocks: Vec<FileBlock>,
    pub decisions: Vec<DecisionRecord>,
    pub writes_performed: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LogEntry {
    pub fn new(kind: RunKind) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            kind,
            raw_reply: None,
            parsed_blocks: Vec::new(),
            decisions: Vec::new(),
            writes_performed: Vec::new(),
            error: None,
        }
    }
}

/// Append one entry as a single JSON line.
///
/// Callers degrade a failure here to a warning: logging must never roll back
/// file writes that already landed.
pub fn append(path: &Path, entry: &LogEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log dir {}", parent.display()))?;
    }
    let mut line = serde_json::to_string(entry).context("serialize log entry")?;
    line.push('\n');
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open run log {}", path.display()))?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("append run log {}", path.display()))
}
