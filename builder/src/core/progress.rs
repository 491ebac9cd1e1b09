//! Progress record and its single authoritative transition.

use serde::{Deserialize, Serialize};

use crate::core::error::ProgressError;

/// Reserved terminal value for [`ProgressRecord::next`]. Once reached the
/// record is frozen forever and every further invocation is a no-op.
pub const DONE: &str = "done";

/// The only mutable state the controller owns (`progress.json`).
///
/// Invariant: `next` never appears in `completed` except transiently during
/// the commit that appends it. Mutated exactly once per successful
/// progress-advancing run via [`ProgressRecord::advance`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Ordered, append-only step identifiers; insertion order = execution order.
    pub completed: Vec<String>,
    /// The single step to perform next, or the `"done"` sentinel.
    pub next: String,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            completed: Vec::new(),
            next: "init".to_string(),
        }
    }
}

impl ProgressRecord {
    /// Whether the record has reached the terminal state.
    pub fn is_done(&self) -> bool {
        self.next == DONE
    }

    /// Apply the single progress transition: append the current `next` to
    /// `completed` and adopt `new_next` as the step to perform next.
    ///
    /// Rejects an empty `new_next` and any `new_next` that was already
    /// completed (the model must not be allowed to reintroduce prior steps).
    /// `"done"` is always a legal `new_next`.
    pub fn advance(&self, new_next: &str) -> Result<ProgressRecord, ProgressError> {
        let new_next = new_next.trim();
        if new_next.is_empty() {
            return Err(ProgressError::EmptyNext);
        }
        if new_next != DONE
            && (self.completed.iter().any(|step| step == new_next) || new_next == self.next)
        {
            return Err(ProgressError::AlreadyCompleted {
                step: new_next.to_string(),
            });
        }
        let mut completed = self.completed.clone();
        completed.push(self.next.clone());
        Ok(ProgressRecord {
            completed,
            next: new_next.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(completed: &[&str], next: &str) -> ProgressRecord {
        ProgressRecord {
            completed: completed.iter().map(|s| s.to_string()).collect(),
            next: next.to_string(),
        }
    }

    #[test]
    fn advance_appends_exactly_one_step() {
        let before = record(&["init"], "add-basic-layout");
        let after = before.advance("style").expect("advance");

        assert_eq!(after.completed, vec!["init", "add-basic-layout"]);
        assert_eq!(after.next, "style");
        // The appended element appears exactly once.
        assert_eq!(
            after
                .completed
                .iter()
                .filter(|s| s.as_str() == "add-basic-layout")
                .count(),
            1
        );
    }

    #[test]
    fn advance_rejects_already_completed_step() {
        let before = record(&["init"], "style");
        let err = before.advance("init").expect_err("duplicate step");
        assert!(matches!(err, ProgressError::AlreadyCompleted { .. }));
    }

    #[test]
    fn advance_rejects_repeating_the_current_step() {
        let before = record(&[], "init");
        let err = before.advance("init").expect_err("current step");
        assert!(matches!(err, ProgressError::AlreadyCompleted { .. }));
    }

    #[test]
    fn advance_rejects_empty_next() {
        let before = record(&[], "init");
        let err = before.advance("  ").expect_err("empty next");
        assert!(matches!(err, ProgressError::EmptyNext));
    }

    #[test]
    fn advance_to_done_freezes_the_record() {
        let before = record(&["init"], "style");
        let after = before.advance(DONE).expect("advance to done");
        assert!(after.is_done());
        assert_eq!(after.completed, vec!["init", "style"]);
    }

    #[test]
    fn record_round_trips_through_json() {
        let rec = record(&["init"], "add-basic-layout");
        let json = serde_json::to_string(&rec).expect("serialize");
        let back: ProgressRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, rec);
    }
}
