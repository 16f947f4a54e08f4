//! Stage scheduler - decides which stages and jobs make it into the plan

use crate::core::{
    condition::is_active,
    context::ExecutionContext,
    job::{ConcreteJob, JobTemplate},
    pipeline::{PipelineSpec, Stage},
};
use crate::execution::matrix::MatrixExpander;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How many jobs of a stage an executor may run at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingStrategy {
    /// One job at a time
    Sequential,

    /// All jobs of a stage at once
    Parallel,

    /// At most N concurrent jobs
    LimitedParallel(usize),
}

impl Default for SchedulingStrategy {
    fn default() -> Self {
        SchedulingStrategy::Parallel
    }
}

impl SchedulingStrategy {
    /// Strategy implied by a declared concurrency bound
    pub fn from_max_parallel(max_parallel: Option<usize>) -> Self {
        match max_parallel {
            Some(1) => SchedulingStrategy::Sequential,
            Some(max) => SchedulingStrategy::LimitedParallel(max),
            None => SchedulingStrategy::Parallel,
        }
    }

    /// How many of `ready` jobs may start while `running` are in flight
    pub fn next_batch(&self, running: usize, ready: usize) -> usize {
        let limit = match self {
            SchedulingStrategy::Sequential => 1,
            SchedulingStrategy::Parallel => return ready,
            SchedulingStrategy::LimitedParallel(max) => *max,
        };
        limit.saturating_sub(running).min(ready)
    }
}

/// A job template that survived its condition, with its expanded jobs
#[derive(Debug, Clone)]
pub struct ScheduledJob<'a> {
    pub template: &'a JobTemplate,
    pub jobs: Vec<ConcreteJob>,
}

/// A stage that survived its condition
#[derive(Debug, Clone)]
pub struct ScheduledStage<'a> {
    pub stage: &'a Stage,
    pub jobs: Vec<ScheduledJob<'a>>,
}

impl ScheduledStage<'_> {
    pub fn job_count(&self) -> usize {
        self.jobs.iter().map(|j| j.jobs.len()).sum()
    }
}

/// The scheduler's decisions for one context
#[derive(Debug, Clone)]
pub struct Schedule<'a> {
    /// Surviving stages in ascending position
    pub stages: Vec<ScheduledStage<'a>>,

    /// Stages whose condition was false
    pub skipped_stages: Vec<&'a Stage>,
}

impl Schedule<'_> {
    pub fn job_count(&self) -> usize {
        self.stages.iter().map(|s| s.job_count()).sum()
    }
}

/// Visits stages in order and gates them against a context
pub struct StageScheduler<'a> {
    spec: &'a PipelineSpec,
}

impl<'a> StageScheduler<'a> {
    pub fn new(spec: &'a PipelineSpec) -> Self {
        Self { spec }
    }

    /// Gate and expand every stage
    ///
    /// Stages are gated independently: a stage's inclusion depends only on
    /// its own condition, never on earlier stages. A skipped stage's jobs
    /// are not expanded. A stage left with no jobs is dropped but not
    /// reported as skipped.
    pub fn schedule(&self, ctx: &ExecutionContext) -> Schedule<'a> {
        let mut stages = Vec::new();
        let mut skipped_stages = Vec::new();

        for stage in self.spec.stages_in_order() {
            if !is_active(stage.condition.as_ref(), ctx) {
                debug!("Stage '{}' skipped: condition is false", stage.name);
                skipped_stages.push(stage);
                continue;
            }

            let scheduled = ScheduledStage {
                stage,
                jobs: self.schedule_jobs(stage, ctx),
            };
            if scheduled.job_count() == 0 {
                debug!("Stage '{}' dropped: no jobs survived", stage.name);
                continue;
            }
            stages.push(scheduled);
        }

        Schedule {
            stages,
            skipped_stages,
        }
    }

    fn schedule_jobs(&self, stage: &'a Stage, ctx: &ExecutionContext) -> Vec<ScheduledJob<'a>> {
        stage
            .jobs
            .iter()
            .filter(|template| {
                let active = is_active(template.condition.as_ref(), ctx);
                if !active {
                    debug!(
                        "Job '{}' in stage '{}' skipped: condition is false",
                        template.name, stage.name
                    );
                }
                active
            })
            .map(|template| ScheduledJob {
                template,
                jobs: MatrixExpander::expand(template),
            })
            .collect()
    }
}
