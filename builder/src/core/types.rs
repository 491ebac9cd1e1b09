//! Shared deterministic types for the controller core.
//!
//! These types define stable contracts between core components. They should
//! not depend on external state or I/O and must remain deterministic across
//! runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Structured rule document (`rules.json`).
///
/// Either a mapping of rule-name to rule-text or a flat list of rule strings.
/// The map form uses `BTreeMap` so serialization order is stable, which keeps
/// composed prompts deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSet {
    Map(BTreeMap<String, String>),
    List(Vec<String>),
}

impl RuleSet {
    /// Render rules as stable, human-readable lines for prompt embedding.
    pub fn render_lines(&self) -> Vec<String> {
        match self {
            RuleSet::Map(map) => map.iter().map(|(k, v)| format!("{k}: {v}")).collect(),
            RuleSet::List(items) => items.clone(),
        }
    }
}

/// A parsed `(path, content)` unit extracted from a model reply.
///
/// Ephemeral: produced by the block parser, consumed immediately by the write
/// authorizer. A block with a malformed path token (empty, traversal) is
/// still represented here; the authorizer rejects it with a reason so every
/// rejection is logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileBlock {
    pub target_path: String,
    pub content: String,
}

/// Why the authorizer rejected a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The path is neither `progress.json` nor strictly inside `output/`.
    OutsideWhitelist,
    /// The path contains a `..` traversal segment.
    PathTraversal,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::OutsideWhitelist => "outside_whitelist",
            RejectReason::PathTraversal => "path_traversal",
        }
    }
}

/// Authorization verdict for one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "reason")]
pub enum Verdict {
    Accepted,
    Rejected(RejectReason),
}

impl Verdict {
    pub fn is_accepted(self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Decision produced by the write authorizer for one parsed block.
///
/// Consumed by the commit writer (only `Accepted` blocks apply) and by the
/// run logger (every decision is recorded with its reason).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteDecision {
    pub block: FileBlock,
    pub verdict: Verdict,
    /// Whitelist-relative path after normalization. `Some` iff accepted; the
    /// commit writer must use this, never the raw `target_path`, so that
    /// spellings like `./progress.json` and `output//x` resolve consistently.
    pub normalized_path: Option<String>,
}

impl WriteDecision {
    pub fn is_accepted(&self) -> bool {
        self.verdict.is_accepted()
    }
}
