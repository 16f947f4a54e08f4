//! Job and stage status models
//!
//! The engine never runs jobs. These types let an executor apply the
//! failure-propagation policy encoded in the plan.

use serde::{Deserialize, Serialize};

/// Status of a single job as reported by the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job has not started
    Pending,
    /// Job is currently running
    Running,
    /// Job finished successfully
    Passed,
    /// Job finished unsuccessfully
    Failed,
    /// Job was cancelled externally
    Cancelled,
}

impl JobStatus {
    /// Check if job is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Passed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    fn is_failure(&self) -> bool {
        matches!(self, JobStatus::Failed | JobStatus::Cancelled)
    }
}

/// Overall status of a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Outcome not yet decided
    Running,
    Passed,
    Failed,
}

/// Compute a stage's status from its jobs' `(allow_failure, status)` pairs
///
/// Jobs that are allowed to fail never fail the stage. With `fast_finish`
/// the outcome is decided as soon as it is known: failed on the first
/// required failure, passed once every required job passed, even while
/// other jobs are still running. Without it the stage waits for all jobs.
pub fn stage_status<I>(fast_finish: bool, jobs: I) -> StageStatus
where
    I: IntoIterator<Item = (bool, JobStatus)>,
{
    let mut any_required_failed = false;
    let mut required_pending = false;
    let mut any_pending = false;

    for (allow_failure, status) in jobs {
        if !status.is_terminal() {
            any_pending = true;
            if !allow_failure {
                required_pending = true;
            }
        } else if status.is_failure() && !allow_failure {
            any_required_failed = true;
        }
    }

    if fast_finish {
        if any_required_failed {
            StageStatus::Failed
        } else if required_pending {
            StageStatus::Running
        } else {
            StageStatus::Passed
        }
    } else if any_pending {
        StageStatus::Running
    } else if any_required_failed {
        StageStatus::Failed
    } else {
        StageStatus::Passed
    }
}
