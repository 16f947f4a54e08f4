//! Execution plan - the engine's only output

use crate::core::{
    context::ExecutionContext,
    error::CompositionError,
    job::ConcreteJob,
    state::{stage_status, JobStatus, StageStatus},
};
use crate::execution::{
    deploy::DeployResolver,
    scheduler::{Schedule, SchedulingStrategy},
};
use serde::{Deserialize, Serialize};

/// Stage entry of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub name: String,
    pub position: u32,

    /// Stage fails on the first required job failure; siblings keep running
    pub fast_finish: bool,

    /// Indices into `ExecutionPlan::jobs`
    pub jobs: Vec<usize>,
}

/// Ordered list of concrete jobs for an external executor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub pipeline: String,

    /// Context the plan was evaluated against
    pub context: ExecutionContext,

    /// Concurrency policy for jobs within a stage
    pub strategy: SchedulingStrategy,

    /// Stages contributing jobs, in execution order
    pub stages: Vec<StageRecord>,

    /// Flat job list, stage by stage
    pub jobs: Vec<ConcreteJob>,

    /// Stages dropped because their condition was false
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_stages: Vec<String>,
}

impl ExecutionPlan {
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn stage(&self, name: &str) -> Option<&StageRecord> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Jobs of one stage in plan order
    pub fn stage_jobs<'a>(&'a self, stage: &'a StageRecord) -> impl Iterator<Item = &'a ConcreteJob> + 'a {
        stage.jobs.iter().filter_map(move |&i| self.jobs.get(i))
    }

    /// Total number of attached deploy actions
    pub fn deploy_count(&self) -> usize {
        self.jobs.iter().map(|j| j.deploy.len()).sum()
    }

    /// Stage status given each job's status as reported by the executor
    pub fn stage_status<F>(&self, stage: &StageRecord, status_of: F) -> StageStatus
    where
        F: Fn(&ConcreteJob) -> JobStatus,
    {
        stage_status(
            stage.fast_finish,
            self.stage_jobs(stage)
                .map(|job| (job.allow_failure, status_of(job))),
        )
    }
}

/// Projects a schedule into a plan, attaching deploy actions
///
/// Makes no scheduling decisions of its own.
pub struct PlanEmitter;

impl PlanEmitter {
    /// Build the plan; any composition error discards the whole plan
    pub fn emit(
        pipeline: &str,
        schedule: Schedule<'_>,
        resolver: &DeployResolver<'_>,
        ctx: &ExecutionContext,
        strategy: SchedulingStrategy,
    ) -> Result<ExecutionPlan, CompositionError> {
        let mut stages = Vec::new();
        let mut jobs = Vec::new();

        for scheduled in schedule.stages {
            let stage_number = stages.len() + 1;
            let mut indices = Vec::with_capacity(scheduled.job_count());

            for scheduled_job in scheduled.jobs {
                for mut job in scheduled_job.jobs {
                    job.deploy = resolver.resolve(&job, &scheduled_job.template.deploy, ctx)?;
                    job.number = format!("{}.{}", stage_number, indices.len() + 1);
                    indices.push(jobs.len());
                    jobs.push(job);
                }
            }

            stages.push(StageRecord {
                name: scheduled.stage.name.clone(),
                position: scheduled.stage.position,
                fast_finish: scheduled.stage.fast_finish,
                jobs: indices,
            });
        }

        Ok(ExecutionPlan {
            pipeline: pipeline.to_string(),
            context: ctx.clone(),
            strategy,
            stages,
            jobs,
            skipped_stages: schedule
                .skipped_stages
                .iter()
                .map(|s| s.name.clone())
                .collect(),
        })
    }
}
