//! Pipeline domain model

use crate::core::{
    condition::Condition,
    config::PipelineConfig,
    deploy::DeployClause,
    error::SpecError,
    job::JobTemplate,
};
use std::collections::BTreeMap;

/// A named, ordered phase of the pipeline
#[derive(Debug, Clone)]
pub struct Stage {
    pub name: String,

    /// Unique ordering position
    pub position: u32,

    /// Activation condition (absent = always active)
    pub condition: Option<Condition>,

    /// Stage fails as soon as one of its jobs fails
    pub fast_finish: bool,

    /// Job templates in declaration order
    pub jobs: Vec<JobTemplate>,
}

impl Stage {
    pub fn job(&self, name: &str) -> Option<&JobTemplate> {
        self.jobs.iter().find(|j| j.name == name)
    }
}

/// A validated pipeline, immutable once loaded
#[derive(Debug, Clone)]
pub struct PipelineSpec {
    pub name: String,

    /// Declared concurrency bound
    pub max_parallel: Option<usize>,

    /// Stages sorted by ascending position
    pub stages: Vec<Stage>,

    /// Reusable deploy clauses by name
    pub deploy_templates: BTreeMap<String, DeployClause>,
}

impl PipelineSpec {
    /// Parse and validate a pipeline document
    pub fn from_yaml(yaml: &str) -> Result<Self, SpecError> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.to_spec()
    }

    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Stages in the order the scheduler visits them
    pub fn stages_in_order(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter()
    }
}
