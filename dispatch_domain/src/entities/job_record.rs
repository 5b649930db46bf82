// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Job Record
//!
//! The durable, polled view of a job. One worker owns the writes to a given
//! record at a time (enforced by the queue's single-consumer dequeue, not by
//! locking in the store itself - see
//! [`crate::services::job_state_store::JobStateStore`]).

use crate::value_objects::JobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A job's lifecycle state.
///
/// Transitions form a DAG: `Pending -> Processing -> {Completed, Error}`,
/// plus `Pending -> Error` directly when GPU admission times out before the
/// job ever starts running (the worker never wrote `Processing`). No other
/// edge is valid; [`JobRecord::transition_to`] rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Pending, JobStatus::Error)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Error)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

/// The durable state entry for a single job, identified by [`JobId`].
///
/// Exactly one of `result`, `error` is populated once `status` is terminal.
/// `progress` is monotonically non-decreasing within a single run of the
/// job; it is the worker's responsibility to uphold that, the record itself
/// only enforces the status DAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub status: JobStatus,
    pub progress: u8,
    /// Opaque-to-the-dispatcher result payload; shape depends on job kind.
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Attempting an invalid status transition, e.g. `Completed -> Processing`.
#[derive(Debug, thiserror::Error)]
#[error("invalid job status transition: {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: JobStatus,
    pub to: JobStatus,
}

impl JobRecord {
    /// A freshly submitted record: `Pending`, no progress, no result.
    pub fn pending(id: JobId, submitted_at: DateTime<Utc>) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            progress: 0,
            result: None,
            error: None,
            submitted_at,
        }
    }

    /// Move to `Processing`, clearing any stale error and resetting progress
    /// to 1 (matches the worker's first write after GPU admission succeeds).
    pub fn start_processing(&mut self) -> Result<(), InvalidTransition> {
        self.transition_to(JobStatus::Processing)?;
        self.progress = 1;
        self.error = None;
        Ok(())
    }

    /// Move to `Completed` with a result payload, progress pinned at 100.
    pub fn complete(&mut self, result: serde_json::Value) -> Result<(), InvalidTransition> {
        self.transition_to(JobStatus::Completed)?;
        self.progress = 100;
        self.result = Some(result);
        Ok(())
    }

    /// Move to `Error` with a diagnostic message. Valid from `Pending` (GPU
    /// admission timeout before the job started) or `Processing` (any later
    /// failure).
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), InvalidTransition> {
        self.transition_to(JobStatus::Error)?;
        self.error = Some(message.into());
        Ok(())
    }

    /// Update progress without changing status. A no-op once the record is
    /// terminal: a late progress callback racing a `complete`/`fail` write
    /// must never regress `progress` below its pinned terminal value (spec
    /// §3's "monotonically non-decreasing" invariant).
    pub fn set_progress(&mut self, progress: u8) {
        if self.status.is_terminal() {
            return;
        }
        self.progress = progress.min(100);
    }

    fn transition_to(&mut self, next: JobStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition { from: self.status, to: next });
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> JobRecord {
        JobRecord::pending(JobId::new(), Utc::now())
    }

    #[test]
    fn pending_to_processing_to_completed_is_valid() {
        let mut job = fresh();
        job.start_processing().unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        job.complete(serde_json::json!({"ok": true})).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert!(job.result.is_some());
        assert!(job.error.is_none());
    }

    #[test]
    fn pending_to_error_is_valid_on_admission_timeout() {
        let mut job = fresh();
        job.fail("gpu acquisition timeout").unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.error.as_deref(), Some("gpu acquisition timeout"));
    }

    #[test]
    fn completed_is_terminal_and_rejects_further_transitions() {
        let mut job = fresh();
        job.start_processing().unwrap();
        job.complete(serde_json::json!(null)).unwrap();
        assert!(job.start_processing().is_err());
        assert!(job.fail("late failure").is_err());
    }

    #[test]
    fn error_is_terminal() {
        let mut job = fresh();
        job.fail("boom").unwrap();
        assert!(job.start_processing().is_err());
        assert!(job.complete(serde_json::json!(null)).is_err());
    }

    #[test]
    fn set_progress_is_a_no_op_once_terminal() {
        let mut job = fresh();
        job.start_processing().unwrap();
        job.complete(serde_json::json!({"ok": true})).unwrap();
        assert_eq!(job.progress, 100);

        // A progress callback racing the terminal write must not regress it.
        job.set_progress(10);
        assert_eq!(job.progress, 100);
    }

    #[test]
    fn exactly_one_of_result_or_error_is_set_in_terminal_states() {
        let mut completed = fresh();
        completed.start_processing().unwrap();
        completed.complete(serde_json::json!({"a": 1})).unwrap();
        assert!(completed.result.is_some() && completed.error.is_none());

        let mut errored = fresh();
        errored.fail("nope").unwrap();
        assert!(errored.result.is_none() && errored.error.is_some());
    }
}

#[cfg(test)]
mod dag_invariant_proptest {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy)]
    enum Op {
        StartProcessing,
        Complete,
        Fail,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![Just(Op::StartProcessing), Just(Op::Complete), Just(Op::Fail)]
    }

    proptest! {
        // Quantified invariant from spec §8: no sequence of operations ever
        // puts a record in a state `can_transition_to` disagrees with, and
        // exactly one of result/error is set once a record goes terminal.
        #[test]
        fn arbitrary_operation_sequences_never_violate_the_status_dag(
            ops in prop::collection::vec(op_strategy(), 0..12)
        ) {
            let mut job = JobRecord::pending(JobId::new(), Utc::now());
            for op in ops {
                let before = job.status;
                let outcome = match op {
                    Op::StartProcessing => job.start_processing(),
                    Op::Complete => job.complete(serde_json::json!({"n": 1})),
                    Op::Fail => job.fail("synthetic failure"),
                };
                match outcome {
                    Ok(()) => prop_assert!(before.can_transition_to(job.status)),
                    Err(_) => prop_assert_eq!(job.status, before),
                }
                if job.status.is_terminal() {
                    prop_assert!(job.result.is_some() != job.error.is_some());
                }
            }
        }
    }
}
