//! Planning engine - evaluates a pipeline against a context

use crate::{
    core::{ExecutionContext, PipelineSpec, PlanError},
    execution::{DeployResolver, ExecutionPlan, PlanEmitter, SchedulingStrategy, StageScheduler},
};
use std::sync::Arc;
use tracing::{info, warn};

/// Events that can occur while a plan is built
#[derive(Debug, Clone)]
pub enum PlanEvent {
    PlanStarted {
        pipeline: String,
        context: String,
    },
    StageScheduled {
        stage: String,
        jobs: usize,
    },
    StageSkipped {
        stage: String,
    },
    PlanCompleted {
        jobs: usize,
        deploys: usize,
    },
    PlanRejected {
        error: String,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(PlanEvent) + Send + Sync>;

/// Turns a validated pipeline into execution plans
///
/// Planning is pure: the same pipeline and context always give the same plan,
/// and a failed plan leaves nothing behind.
pub struct PlanningEngine<'a> {
    spec: &'a PipelineSpec,
    strategy: SchedulingStrategy,
    event_handlers: Vec<EventHandler>,
}

impl<'a> PlanningEngine<'a> {
    pub fn new(spec: &'a PipelineSpec) -> Self {
        Self {
            spec,
            strategy: SchedulingStrategy::from_max_parallel(spec.max_parallel),
            event_handlers: Vec::new(),
        }
    }

    /// Override the strategy implied by the pipeline's `max_parallel`
    pub fn with_strategy(mut self, strategy: SchedulingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> SchedulingStrategy {
        self.strategy
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(PlanEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    fn emit_event(&self, event: PlanEvent) {
        for handler in &self.event_handlers {
            handler(event.clone());
        }
    }

    /// Build the execution plan for one context
    pub fn plan(&self, ctx: &ExecutionContext) -> Result<ExecutionPlan, PlanError> {
        info!("Planning pipeline: {} ({})", self.spec.name, ctx);
        self.emit_event(PlanEvent::PlanStarted {
            pipeline: self.spec.name.clone(),
            context: ctx.to_string(),
        });

        let schedule = StageScheduler::new(self.spec).schedule(ctx);

        for stage in &schedule.skipped_stages {
            self.emit_event(PlanEvent::StageSkipped {
                stage: stage.name.clone(),
            });
        }
        for stage in &schedule.stages {
            self.emit_event(PlanEvent::StageScheduled {
                stage: stage.stage.name.clone(),
                jobs: stage.job_count(),
            });
        }

        let resolver = DeployResolver::new(&self.spec.deploy_templates);
        let plan = match PlanEmitter::emit(&self.spec.name, schedule, &resolver, ctx, self.strategy)
        {
            Ok(plan) => plan,
            Err(e) => {
                warn!("Plan rejected: {}", e);
                self.emit_event(PlanEvent::PlanRejected {
                    error: e.to_string(),
                });
                return Err(e.into());
            }
        };

        info!(
            "Plan ready: {} jobs in {} stages, {} deploys",
            plan.jobs.len(),
            plan.stages.len(),
            plan.deploy_count()
        );
        self.emit_event(PlanEvent::PlanCompleted {
            jobs: plan.jobs.len(),
            deploys: plan.deploy_count(),
        });

        Ok(plan)
    }
}

/// Load, validate and plan a pipeline document in one step
pub fn plan_yaml(
    yaml: &str,
    ctx: &ExecutionContext,
    strategy: Option<SchedulingStrategy>,
) -> Result<ExecutionPlan, PlanError> {
    let spec = PipelineSpec::from_yaml(yaml)?;
    let mut engine = PlanningEngine::new(&spec);
    if let Some(strategy) = strategy {
        engine = engine.with_strategy(strategy);
    }
    engine.plan(ctx)
}
