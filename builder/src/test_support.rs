//! Shared fixtures for unit and integration tests.
//!
//! Only compiled for tests or with the `test-support` feature enabled.

use std::collections::VecDeque;
use std::fs;
use std::sync::Mutex;

use crate::core::error::GatewayError;
use crate::core::progress::ProgressRecord;
use crate::io::gateway::ModelGateway;
use crate::io::paths::BuilderPaths;

/// Gateway that returns scripted replies without spawning processes.
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<String, GatewayError>>>,
    /// Panic when `complete` is invoked; used to prove the no-op path never
    /// reaches the backend.
    forbid_calls: bool,
}

impl ScriptedGateway {
    /// Queue of replies, served in order.
    pub fn queue(replies: Vec<Result<String, GatewayError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            forbid_calls: false,
        }
    }

    /// Single successful reply.
    pub fn replying(reply: &str) -> Self {
        Self::queue(vec![Ok(reply.to_string())])
    }

    /// Single failure.
    pub fn failing(error: GatewayError) -> Self {
        Self::queue(vec![Err(error)])
    }

    /// Panics if the pipeline attempts a backend call.
    pub fn never_called() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            forbid_calls: true,
        }
    }

    /// Panics unless every queued reply was consumed.
    pub fn assert_drained(&self) {
        let replies = self.replies.lock().expect("replies lock");
        assert!(
            replies.is_empty(),
            "{} scripted replies left unconsumed",
            replies.len()
        );
    }
}

impl ModelGateway for ScriptedGateway {
    fn complete(&self, _prompt: &str) -> Result<String, GatewayError> {
        if self.forbid_calls {
            panic!("gateway must not be called for this scenario");
        }
        self.replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .expect("scripted gateway ran out of replies")
    }
}

/// Overwrite `progress.json` with the given record parts.
pub fn write_progress(paths: &BuilderPaths, completed: &[&str], next: &str) {
    let record = ProgressRecord {
        completed: completed.iter().map(|s| s.to_string()).collect(),
        next: next.to_string(),
    };
    let mut payload = serde_json::to_string_pretty(&record).expect("serialize progress");
    payload.push('\n');
    fs::write(&paths.progress_path, payload).expect("write progress.json");
}
