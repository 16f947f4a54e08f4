//! stagegate - evaluates staged CI pipelines into execution plans
//!
//! A pipeline document declares stages of job templates with optional
//! activation conditions, build matrices and deploy clauses. Given a
//! trigger context (branch, tag, event, repository) the engine produces
//! an ordered, fully expanded [`ExecutionPlan`] for an external executor,
//! or an error and no plan at all.

pub mod cli;
pub mod core;
pub mod execution;

// Re-export commonly used types
pub use crate::core::{
    CompositionError, ConcreteJob, EventType, ExecutionContext, PipelineSpec, PlanError, SpecError,
};
pub use crate::core::config::PipelineConfig;
pub use crate::execution::{plan_yaml, ExecutionPlan, PlanningEngine, SchedulingStrategy};
