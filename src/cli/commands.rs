//! CLI command definitions

use crate::core::{EventType, ExecutionContext};
use crate::execution::SchedulingStrategy;
use anyhow::{bail, Context, Result};
use clap::{builder::RangedU64ValueParser, Args};

/// Job limit for `parallel-limited` when `--max-parallel` is not given
pub const DEFAULT_PARALLEL_LIMIT: usize = 4;

/// Build an execution plan
#[derive(Debug, Args, Clone)]
pub struct PlanCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Branch being built
    #[arg(long)]
    pub branch: Option<String>,

    /// Tag being built, if any
    #[arg(long)]
    pub tag: Option<String>,

    /// Event that triggered the build
    #[arg(long, value_enum, default_value_t = EventTypeArg::Push)]
    pub event: EventTypeArg,

    /// Repository slug (owner/name)
    #[arg(long)]
    pub repo: Option<String>,

    /// Read the trigger context from a YAML file
    #[arg(long, conflicts_with_all = ["from_env", "branch"])]
    pub context: Option<String>,

    /// Read the trigger context from TRAVIS_* environment variables
    #[arg(long, conflicts_with = "branch")]
    pub from_env: bool,

    /// Scheduling strategy (defaults to the pipeline's max_parallel)
    #[arg(long, value_enum)]
    pub strategy: Option<SchedulingStrategyArg>,

    /// Job limit for the parallel-limited strategy
    #[arg(long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub max_parallel: Option<usize>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

impl PlanCommand {
    /// Trigger context from whichever source was given
    pub fn execution_context(&self) -> Result<ExecutionContext> {
        let mut ctx = if let Some(path) = &self.context {
            ExecutionContext::from_file(path)?
        } else if self.from_env {
            ExecutionContext::from_env().context("Failed to read trigger context")?
        } else {
            let Some(branch) = &self.branch else {
                bail!("--branch is required unless --context or --from-env is given");
            };
            ExecutionContext::new(branch.clone(), self.event.into())
        };

        if let Some(tag) = &self.tag {
            ctx = ctx.with_tag(tag.clone());
        }
        if let Some(repo) = &self.repo {
            ctx = ctx.with_repository(repo.clone());
        }
        Ok(ctx)
    }

    /// Strategy override, if any
    pub fn scheduling_strategy(&self) -> Option<SchedulingStrategy> {
        match (self.strategy, self.max_parallel) {
            (Some(SchedulingStrategyArg::ParallelLimited), max) => {
                Some(SchedulingStrategy::LimitedParallel(
                    max.unwrap_or(DEFAULT_PARALLEL_LIMIT),
                ))
            }
            (Some(arg), _) => Some(arg.into()),
            (None, Some(max)) => Some(SchedulingStrategy::from_max_parallel(Some(max))),
            (None, None) => None,
        }
    }
}

/// Validate a pipeline document
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Scheduling strategy argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SchedulingStrategyArg {
    Sequential,
    Parallel,
    #[clap(name = "parallel-limited")]
    ParallelLimited,
}

impl From<SchedulingStrategyArg> for SchedulingStrategy {
    fn from(arg: SchedulingStrategyArg) -> Self {
        match arg {
            SchedulingStrategyArg::Sequential => SchedulingStrategy::Sequential,
            SchedulingStrategyArg::Parallel => SchedulingStrategy::Parallel,
            SchedulingStrategyArg::ParallelLimited => {
                SchedulingStrategy::LimitedParallel(DEFAULT_PARALLEL_LIMIT)
            }
        }
    }
}

/// Event type argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EventTypeArg {
    Push,
    #[value(name = "pull-request", alias = "pull_request")]
    PullRequest,
    #[value(alias = "cron")]
    Schedule,
    Api,
}

impl From<EventTypeArg> for EventType {
    fn from(arg: EventTypeArg) -> Self {
        match arg {
            EventTypeArg::Push => EventType::Push,
            EventTypeArg::PullRequest => EventType::PullRequest,
            EventTypeArg::Schedule => EventType::Schedule,
            EventTypeArg::Api => EventType::Api,
        }
    }
}
