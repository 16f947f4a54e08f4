//! Pipeline document as written in YAML

use crate::core::{
    condition::Condition,
    deploy::{DeployClause, DeployOn},
    env::{EnvMap, Scalar},
    error::SpecError,
    job::{AxisMatch, CommandRef, JobTemplate, MatrixAxis, MatrixOverride},
    pipeline::{PipelineSpec, Stage},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Top-level pipeline document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name
    pub name: String,

    /// Maximum number of jobs an executor should run at once
    #[serde(default)]
    pub max_parallel: Option<usize>,

    /// Environment shared by every job (job env wins on conflicts)
    #[serde(default)]
    pub env: EnvMap,

    /// Reusable deploy clauses, referenced by name
    #[serde(default)]
    pub deploy_templates: BTreeMap<String, DeployClauseConfig>,

    /// Stages in declaration order
    pub stages: Vec<StageConfig>,
}

/// Stage as declared in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    pub name: String,

    /// Ordering position (defaults to the 1-based declaration index)
    #[serde(default)]
    pub position: Option<u32>,

    /// Activation condition
    #[serde(default, rename = "if")]
    pub condition: Option<ConditionConfig>,

    /// Fail the stage as soon as one of its jobs fails
    #[serde(default)]
    pub fast_finish: bool,

    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

/// Job template as declared in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,

    #[serde(default)]
    pub env: EnvMap,

    /// Matrix axes; mapping order is the expansion order
    #[serde(default)]
    pub matrix: Mapping,

    /// Axis-value combinations to skip
    #[serde(default)]
    pub exclude: Vec<BTreeMap<String, Value>>,

    /// Extra environment for matching matrix cells
    #[serde(default)]
    pub overrides: Vec<OverrideConfig>,

    /// Matrix cells whose failure does not fail the stage
    #[serde(default)]
    pub allow_failures: Vec<BTreeMap<String, Value>>,

    #[serde(default)]
    pub install: Vec<String>,

    #[serde(default)]
    pub script: Vec<String>,

    #[serde(default, rename = "if")]
    pub condition: Option<ConditionConfig>,

    #[serde(default)]
    pub deploy: Vec<DeployEntry>,
}

/// Per-cell environment override
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideConfig {
    #[serde(rename = "match")]
    pub when: BTreeMap<String, Value>,

    #[serde(default)]
    pub env: EnvMap,
}

/// Structured predicate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionConfig {
    Eq { field: String, value: Scalar },
    In { field: String, values: Vec<Scalar> },
    Matches { field: String, pattern: String },
    PullRequest,
    All(Vec<ConditionConfig>),
    Any(Vec<ConditionConfig>),
    Not(Box<ConditionConfig>),
}

/// A deploy entry on a job: a template name or an inline clause
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeployEntry {
    Template(String),
    Clause(DeployClauseConfig),
}

/// Deploy clause; every field is optional so it can override a base
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployClauseConfig {
    /// Name of the template this clause is composed over
    #[serde(default)]
    pub extends: Option<String>,

    #[serde(default)]
    pub provider: Option<String>,

    #[serde(default)]
    pub params: EnvMap,

    #[serde(default)]
    pub on: DeployOnConfig,
}

/// Deploy gate fields
///
/// Unknown keys are rejected: a misspelt `tag:` would otherwise leave the
/// gate open on every build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployOnConfig {
    #[serde(default)]
    pub branch: Option<BranchList>,

    #[serde(default)]
    pub all_branches: Option<bool>,

    #[serde(default)]
    pub tags: Option<bool>,

    #[serde(default)]
    pub repo: Option<String>,

    /// Required plain values in the job's resolved environment
    #[serde(default)]
    pub env: Option<BTreeMap<String, Scalar>>,

    #[serde(default)]
    pub condition: Option<ConditionConfig>,
}

/// `branch: master` or `branch: [master, release]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BranchList {
    One(String),
    Many(Vec<String>),
}

impl BranchList {
    fn into_vec(self) -> Vec<String> {
        match self {
            BranchList::One(branch) => vec![branch],
            BranchList::Many(branches) => branches,
        }
    }
}

impl PipelineConfig {
    /// Load pipeline configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline file: {}", path.display()))?;
        Ok(Self::from_yaml(&content)?)
    }

    /// Parse pipeline configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, SpecError> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the pipeline configuration
    pub fn validate(&self) -> Result<(), SpecError> {
        self.to_spec().map(|_| ())
    }

    /// Convert the document into a validated pipeline model
    pub fn to_spec(&self) -> Result<PipelineSpec, SpecError> {
        if self.max_parallel == Some(0) {
            return Err(SpecError::InvalidMaxParallel);
        }

        let mut deploy_templates = BTreeMap::new();
        for (name, template) in &self.deploy_templates {
            let location = format!("deploy template '{}'", name);
            if let Some(base) = &template.extends {
                if !self.deploy_templates.contains_key(base) {
                    return Err(SpecError::DanglingComposition {
                        location,
                        base: base.clone(),
                    });
                }
            }
            deploy_templates.insert(name.clone(), compile_clause(template, &location)?);
        }

        let mut stage_names = HashSet::new();
        let mut positions: HashMap<u32, &str> = HashMap::new();
        let mut stages = Vec::with_capacity(self.stages.len());

        for (index, stage) in self.stages.iter().enumerate() {
            if !stage_names.insert(stage.name.as_str()) {
                return Err(SpecError::DuplicateStageName(stage.name.clone()));
            }

            let position = stage.position.unwrap_or(index as u32 + 1);
            if let Some(first) = positions.insert(position, &stage.name) {
                return Err(SpecError::DuplicateStagePosition {
                    position,
                    first: first.to_string(),
                    second: stage.name.clone(),
                });
            }

            stages.push(self.compile_stage(stage, position)?);
        }

        stages.sort_by_key(|stage| stage.position);

        Ok(PipelineSpec {
            name: self.name.clone(),
            max_parallel: self.max_parallel,
            stages,
            deploy_templates,
        })
    }

    fn compile_stage(&self, config: &StageConfig, position: u32) -> Result<Stage, SpecError> {
        let location = format!("stage '{}'", config.name);
        let condition = config
            .condition
            .as_ref()
            .map(|c| Condition::compile(c, &location))
            .transpose()?;

        let mut job_names = HashSet::new();
        let mut jobs = Vec::with_capacity(config.jobs.len());
        for job in &config.jobs {
            if !job_names.insert(job.name.as_str()) {
                return Err(SpecError::DuplicateJobName {
                    location,
                    job: job.name.clone(),
                });
            }
            jobs.push(self.compile_job(&config.name, job)?);
        }

        Ok(Stage {
            name: config.name.clone(),
            position,
            condition,
            fast_finish: config.fast_finish,
            jobs,
        })
    }

    fn compile_job(&self, stage: &str, config: &JobConfig) -> Result<JobTemplate, SpecError> {
        let location = format!("stage '{}', job '{}'", stage, config.name);

        let axes = parse_axes(&config.matrix, &location)?;

        let exclusions = config
            .exclude
            .iter()
            .map(|m| compile_axis_match(m, &axes, &location))
            .collect::<Result<Vec<_>, _>>()?;

        let overrides = config
            .overrides
            .iter()
            .map(|o| {
                Ok(MatrixOverride {
                    when: compile_axis_match(&o.when, &axes, &location)?,
                    env: o.env.clone(),
                })
            })
            .collect::<Result<Vec<_>, SpecError>>()?;

        let allow_failures = config
            .allow_failures
            .iter()
            .map(|m| compile_axis_match(m, &axes, &location))
            .collect::<Result<Vec<_>, _>>()?;

        let condition = config
            .condition
            .as_ref()
            .map(|c| Condition::compile(c, &location))
            .transpose()?;

        let mut deploy = Vec::with_capacity(config.deploy.len());
        for entry in &config.deploy {
            let clause = match entry {
                DeployEntry::Template(name) => {
                    if !self.deploy_templates.contains_key(name) {
                        return Err(SpecError::UnknownDeployTemplate {
                            location,
                            name: name.clone(),
                        });
                    }
                    DeployClause::from_template(name)
                }
                DeployEntry::Clause(clause) => {
                    if let Some(base) = &clause.extends {
                        if !self.deploy_templates.contains_key(base) {
                            return Err(SpecError::DanglingComposition {
                                location,
                                base: base.clone(),
                            });
                        }
                    }
                    compile_clause(clause, &location)?
                }
            };
            deploy.push(clause);
        }

        let mut env = self.env.clone();
        env.extend(config.env.clone());

        Ok(JobTemplate {
            stage: stage.to_string(),
            name: config.name.clone(),
            env,
            axes,
            exclusions,
            overrides,
            allow_failures,
            commands: CommandRef {
                install: config.install.clone(),
                script: config.script.clone(),
            },
            condition,
            deploy,
        })
    }

    /// Total number of job templates across all stages
    pub fn job_count(&self) -> usize {
        self.stages.iter().map(|s| s.jobs.len()).sum()
    }
}

fn parse_axes(matrix: &Mapping, location: &str) -> Result<Vec<MatrixAxis>, SpecError> {
    let invalid = |message: String| SpecError::InvalidMatrix {
        location: location.to_string(),
        message,
    };

    let mut axes: Vec<MatrixAxis> = Vec::with_capacity(matrix.len());
    for (key, values) in matrix {
        let name = Scalar::try_from(key.clone())
            .map_err(|e| invalid(format!("axis name: {}", e)))?
            .0;

        if axes.iter().any(|axis| axis.name == name) {
            return Err(SpecError::DuplicateAxis {
                location: location.to_string(),
                axis: name,
            });
        }

        let values: Vec<String> = match values {
            Value::Sequence(items) => items
                .iter()
                .map(|item| Scalar::try_from(item.clone()).map(String::from))
                .collect::<Result<Vec<String>, String>>()
                .map_err(|e| invalid(format!("axis '{}': {}", name, e)))?,
            scalar => vec![Scalar::try_from(scalar.clone())
                .map_err(|e| invalid(format!("axis '{}': {}", name, e)))?
                .0],
        };

        if values.is_empty() {
            return Err(SpecError::EmptyAxis {
                location: location.to_string(),
                axis: name,
            });
        }

        for (i, value) in values.iter().enumerate() {
            if values[..i].contains(value) {
                return Err(SpecError::DuplicateAxisValue {
                    location: location.to_string(),
                    axis: name,
                    value: value.clone(),
                });
            }
        }

        axes.push(MatrixAxis { name, values });
    }

    Ok(axes)
}

fn compile_axis_match(
    pairs: &BTreeMap<String, Value>,
    axes: &[MatrixAxis],
    location: &str,
) -> Result<AxisMatch, SpecError> {
    if pairs.is_empty() {
        return Err(SpecError::EmptyAxisMatch {
            location: location.to_string(),
        });
    }

    let mut selected = BTreeMap::new();
    for (axis_name, value) in pairs {
        let axis = axes
            .iter()
            .find(|axis| &axis.name == axis_name)
            .ok_or_else(|| SpecError::UnknownAxis {
                location: location.to_string(),
                axis: axis_name.clone(),
            })?;

        let value = Scalar::try_from(value.clone())
            .map_err(|e| SpecError::InvalidMatrix {
                location: location.to_string(),
                message: format!("axis '{}': {}", axis_name, e),
            })?
            .0;

        if !axis.values.contains(&value) {
            return Err(SpecError::UnknownAxisValue {
                location: location.to_string(),
                axis: axis_name.clone(),
                value,
            });
        }

        selected.insert(axis_name.clone(), value);
    }

    Ok(AxisMatch(selected))
}

fn compile_clause(config: &DeployClauseConfig, location: &str) -> Result<DeployClause, SpecError> {
    let on = &config.on;
    Ok(DeployClause {
        extends: config.extends.clone(),
        provider: config.provider.clone(),
        params: config.params.clone(),
        on: DeployOn {
            branch: on.branch.clone().map(BranchList::into_vec),
            all_branches: on.all_branches,
            tags: on.tags,
            repo: on.repo.clone(),
            env: on.env.as_ref().map(|env| {
                env.iter()
                    .map(|(k, v)| (k.clone(), v.to_string()))
                    .collect()
            }),
            condition: on
                .condition
                .as_ref()
                .map(|c| Condition::compile(c, location))
                .transpose()?,
        },
    })
}
