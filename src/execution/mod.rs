//! Pipeline evaluation: from validated pipeline to execution plan

pub mod deploy;
pub mod engine;
pub mod matrix;
pub mod plan;
pub mod scheduler;

pub use deploy::DeployResolver;
pub use engine::{plan_yaml, PlanEvent, PlanningEngine};
pub use matrix::MatrixExpander;
pub use plan::{ExecutionPlan, PlanEmitter, StageRecord};
pub use scheduler::{Schedule, ScheduledJob, ScheduledStage, SchedulingStrategy, StageScheduler};
