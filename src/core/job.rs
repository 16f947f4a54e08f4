//! Job domain model

use crate::core::{
    condition::Condition,
    deploy::{DeployAction, DeployClause},
    env::EnvMap,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named matrix dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixAxis {
    /// Axis name, also the env variable the value is exported as
    pub name: String,

    /// Values in declared order (never empty)
    pub values: Vec<String>,
}

/// One coordinate of a matrix cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisValue {
    pub axis: String,
    pub value: String,
}

/// Axis-value constraints; axes not listed are wildcards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisMatch(pub BTreeMap<String, String>);

impl AxisMatch {
    pub fn matches(&self, cell: &[AxisValue]) -> bool {
        self.0.iter().all(|(axis, value)| {
            cell.iter()
                .any(|coord| &coord.axis == axis && &coord.value == value)
        })
    }
}

/// Extra environment applied to matching matrix cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixOverride {
    pub when: AxisMatch,
    pub env: EnvMap,
}

/// Opaque command reference handed to the executor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRef {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub install: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub script: Vec<String>,
}

/// A job before matrix expansion
#[derive(Debug, Clone)]
pub struct JobTemplate {
    /// Name of the owning stage
    pub stage: String,

    pub name: String,

    /// Base environment (pipeline env overlaid by the job's own)
    pub env: EnvMap,

    pub axes: Vec<MatrixAxis>,

    pub exclusions: Vec<AxisMatch>,

    pub overrides: Vec<MatrixOverride>,

    pub allow_failures: Vec<AxisMatch>,

    pub commands: CommandRef,

    pub condition: Option<Condition>,

    /// Deploy clauses in declaration order
    pub deploy: Vec<DeployClause>,
}

impl JobTemplate {
    /// Create a template with no matrix, condition or deploys
    pub fn new(stage: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            name: name.into(),
            env: EnvMap::new(),
            axes: Vec::new(),
            exclusions: Vec::new(),
            overrides: Vec::new(),
            allow_failures: Vec::new(),
            commands: CommandRef::default(),
            condition: None,
            deploy: Vec::new(),
        }
    }

    /// Number of cells in the full cross product (before exclusions)
    pub fn cross_product_size(&self) -> usize {
        self.axes.iter().map(|axis| axis.values.len()).product()
    }
}

/// A fully resolved, matrix-expanded job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcreteJob {
    /// `<stage index>.<job index>`, assigned when the plan is emitted
    #[serde(default)]
    pub number: String,

    /// Originating stage
    pub stage: String,

    /// Originating job template
    pub template: String,

    /// Display name including the matrix cell
    pub name: String,

    /// Matrix coordinates in axis order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matrix: Vec<AxisValue>,

    pub env: EnvMap,

    pub commands: CommandRef,

    /// Failure of this job does not fail its stage
    #[serde(default)]
    pub allow_failure: bool,

    /// Deploy actions attached for the current context
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deploy: Vec<DeployAction>,
}

impl ConcreteJob {
    /// Plain value of an environment variable
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env.get(key).and_then(|v| v.as_plain())
    }

    /// Value of a matrix coordinate
    pub fn axis_value(&self, axis: &str) -> Option<&str> {
        self.matrix
            .iter()
            .find(|coord| coord.axis == axis)
            .map(|coord| coord.value.as_str())
    }
}
