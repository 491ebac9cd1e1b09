//! Orchestration for a single controller invocation.
//!
//! State machine per run: `Idle -> (next == "done"? -> Terminal) ->
//! Composing -> Calling -> Parsing -> Authorizing -> Committing -> Logged`.
//! The gateway call is the single external-failure boundary; every stage
//! after it is local and fails only on malformed input data. Store or gateway
//! failures abort before any write, so a failed run never leaves the record
//! or `output/` advanced past the previous successful run.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::core::authorize::authorize;
use crate::core::blocks::{clean_reply, parse_reply};
use crate::core::progress::ProgressRecord;
use crate::core::prompt::compose;
use crate::core::types::WriteDecision;
use crate::io::commit::commit;
use crate::io::gateway::ModelGateway;
use crate::io::lock::StateLock;
use crate::io::paths::BuilderPaths;
use crate::io::run_log::{DecisionRecord, LogEntry, RunKind, append};
use crate::io::state;

/// Result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The record was already terminal; nothing was composed, called, or
    /// written.
    Complete,
    /// A full pipeline run reached the commit stage.
    Step(StepReport),
}

/// Summary of a committed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// The step identifier this run asked the model to perform.
    pub step: String,
    /// Output paths written, in application order.
    pub writes_performed: Vec<String>,
    /// Number of blocks the authorizer rejected.
    pub rejected: usize,
    /// The record after the run.
    pub progress: ProgressRecord,
}

/// Execute one invocation of the pipeline against the state directory at
/// `root`.
///
/// Holds the exclusive state lock for the full load -> save -> log sequence.
pub fn run_once<G: ModelGateway>(root: &Path, gateway: &G) -> Result<RunOutcome> {
    let paths = BuilderPaths::new(root);
    let _lock = StateLock::acquire(&paths.lock_path)?;

    let (project, rules, progress) = match state::load(&paths) {
        Ok(loaded) => loaded,
        Err(err) => {
            log_abort(&paths, LogEntry::new(RunKind::Aborted), &err.to_string());
            return Err(err).context("load state");
        }
    };

    // Idempotency guarantee: repeated invocations after completion are
    // cost-free and state-preserving.
    if progress.is_done() {
        info!("progress record is terminal, exiting as no-op");
        log_best_effort(&paths, &LogEntry::new(RunKind::NoOp));
        return Ok(RunOutcome::Complete);
    }

    let step = progress.next.clone();
    let prompt = compose(&project, &rules, &progress);
    info!(step = %step, prompt_bytes = prompt.len(), "calling backend");

    let raw_reply = match gateway.complete(&prompt) {
        Ok(reply) => reply,
        Err(err) => {
            log_abort(&paths, LogEntry::new(RunKind::Aborted), &err.to_string());
            return Err(err).context("backend completion");
        }
    };

    let cleaned = clean_reply(&raw_reply);
    let blocks = match parse_reply(&cleaned) {
        Ok(blocks) => blocks,
        Err(err) => {
            let mut entry = LogEntry::new(RunKind::Aborted);
            entry.raw_reply = Some(raw_reply.clone());
            log_abort(&paths, entry, &err.to_string());
            return Err(err).context("parse reply");
        }
    };

    let decisions: Vec<WriteDecision> = blocks.iter().map(authorize).collect();
    for decision in decisions.iter().filter(|d| !d.is_accepted()) {
        warn!(path = %decision.block.target_path, verdict = ?decision.verdict, "block rejected");
    }
    let rejected = decisions.iter().filter(|d| !d.is_accepted()).count();

    let outcome = match commit(&paths, &decisions, &progress) {
        Ok(outcome) => outcome,
        Err(err) => {
            let mut entry = LogEntry::new(RunKind::Aborted);
            entry.raw_reply = Some(raw_reply.clone());
            entry.parsed_blocks = blocks.clone();
            entry.decisions = decisions.iter().map(DecisionRecord::from).collect();
            log_abort(&paths, entry, &format!("{err:#}"));
            return Err(err).context("commit");
        }
    };

    // Writes are durable at this point; the log entry is a trailing audit
    // record and its failure must not escalate.
    let mut entry = LogEntry::new(RunKind::Step);
    entry.raw_reply = Some(raw_reply);
    entry.parsed_blocks = blocks;
    entry.decisions = decisions.iter().map(DecisionRecord::from).collect();
    entry.writes_performed = outcome.writes_performed.clone();
    log_best_effort(&paths, &entry);

    info!(
        step = %step,
        writes = outcome.writes_performed.len(),
        rejected,
        advanced = outcome.advanced,
        "run committed"
    );
    Ok(RunOutcome::Step(StepReport {
        step,
        writes_performed: outcome.writes_performed,
        rejected,
        progress: outcome.progress,
    }))
}

fn log_abort(paths: &BuilderPaths, mut entry: LogEntry, error: &str) {
    entry.error = Some(error.to_string());
    log_best_effort(paths, &entry);
}

fn log_best_effort(paths: &BuilderPaths, entry: &LogEntry) {
    if let Err(err) = append(&paths.run_log_path, entry) {
        warn!(error = %format!("{err:#}"), "failed to append run log entry");
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::core::error::GatewayError;
    use crate::io::init::bootstrap;
    use crate::test_support::{ScriptedGateway, write_progress};

    fn setup() -> (tempfile::TempDir, BuilderPaths) {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = BuilderPaths::new(temp.path());
        bootstrap(&paths, false).expect("bootstrap");
        (temp, paths)
    }

    fn log_lines(paths: &BuilderPaths) -> Vec<serde_json::Value> {
        let contents = fs::read_to_string(&paths.run_log_path).expect("read run log");
        contents
            .lines()
            .map(|line| serde_json::from_str(line).expect("log line json"))
            .collect()
    }

    #[test]
    fn done_record_short_circuits_without_gateway_call() {
        let (_temp, paths) = setup();
        write_progress(&paths, &["init"], "done");
        let gateway = ScriptedGateway::never_called();

        for _ in 0..3 {
            let outcome = run_once(&paths.root, &gateway).expect("run");
            assert_eq!(outcome, RunOutcome::Complete);
        }

        // Record unchanged, no output writes, one no-op entry per invocation.
        let (_, _, progress) = state::load(&paths).expect("load");
        assert_eq!(progress.completed, vec!["init"]);
        assert!(progress.is_done());
        assert_eq!(fs::read_dir(&paths.output_dir).expect("dir").count(), 0);
        let lines = log_lines(&paths);
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|line| line["kind"] == "no_op"));
    }

    #[test]
    fn backend_failure_leaves_state_untouched() {
        let (_temp, paths) = setup();
        write_progress(&paths, &["init"], "style");
        let before = fs::read_to_string(&paths.progress_path).expect("read progress");
        let gateway = ScriptedGateway::failing(GatewayError::Unreachable("down".to_string()));

        let err = run_once(&paths.root, &gateway).expect_err("backend failure");
        assert!(err.to_string().contains("backend completion"));

        let after = fs::read_to_string(&paths.progress_path).expect("read progress");
        assert_eq!(before, after);
        assert_eq!(fs::read_dir(&paths.output_dir).expect("dir").count(), 0);
        let lines = log_lines(&paths);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["kind"], "aborted");
        assert!(lines[0]["error"].as_str().expect("error").contains("unreachable"));
    }

    #[test]
    fn unparsable_reply_aborts_with_logged_raw_reply() {
        let (_temp, paths) = setup();
        write_progress(&paths, &[], "init");
        let gateway = ScriptedGateway::replying("sorry, I have no files for you");

        let err = run_once(&paths.root, &gateway).expect_err("parse failure");
        assert!(err.to_string().contains("parse reply"));

        let lines = log_lines(&paths);
        assert_eq!(lines[0]["kind"], "aborted");
        assert_eq!(lines[0]["raw_reply"], "sorry, I have no files for you");
    }

    #[test]
    fn rejected_blocks_do_not_abort_the_run() {
        let (_temp, paths) = setup();
        write_progress(&paths, &[], "init");
        let gateway = ScriptedGateway::replying(
            "--- file: ../../etc/passwd ---\nowned\n--- file: output/ok.txt ---\nfine",
        );

        let outcome = run_once(&paths.root, &gateway).expect("run");
        let RunOutcome::Step(report) = outcome else {
            panic!("expected step outcome");
        };
        assert_eq!(report.rejected, 1);
        assert_eq!(report.writes_performed, vec!["output/ok.txt"]);
        assert_eq!(
            fs::read_to_string(paths.output_dir.join("ok.txt")).expect("read"),
            "fine"
        );
    }

    #[test]
    fn empty_reply_is_a_successful_run_with_no_writes() {
        let (_temp, paths) = setup();
        write_progress(&paths, &[], "init");
        let gateway = ScriptedGateway::replying("   \n");

        let outcome = run_once(&paths.root, &gateway).expect("run");
        let RunOutcome::Step(report) = outcome else {
            panic!("expected step outcome");
        };
        assert!(report.writes_performed.is_empty());
        // No progress block: record unchanged.
        assert_eq!(report.progress.next, "init");
        assert!(report.progress.completed.is_empty());
    }
}
