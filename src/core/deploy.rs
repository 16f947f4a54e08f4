//! Deploy clause model and per-field composition

use crate::core::{
    condition::{is_active, Condition},
    context::ExecutionContext,
    env::EnvMap,
    job::ConcreteJob,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Gate fields of a deploy clause
///
/// Every field is optional: `None` means "no constraint" on a resolved
/// clause and "inherit" while composing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployOn {
    pub branch: Option<Vec<String>>,
    pub all_branches: Option<bool>,
    pub tags: Option<bool>,
    pub repo: Option<String>,
    pub env: Option<BTreeMap<String, String>>,
    pub condition: Option<Condition>,
}

impl DeployOn {
    /// Overlay `specific` on `self`; fields set on `specific` win
    pub fn overlay(&self, specific: &DeployOn) -> DeployOn {
        DeployOn {
            branch: specific.branch.clone().or_else(|| self.branch.clone()),
            all_branches: specific.all_branches.or(self.all_branches),
            tags: specific.tags.or(self.tags),
            repo: specific.repo.clone().or_else(|| self.repo.clone()),
            env: specific.env.clone().or_else(|| self.env.clone()),
            condition: specific.condition.clone().or_else(|| self.condition.clone()),
        }
    }

    /// Whether the gate holds for a job in a context
    pub fn is_satisfied(&self, job: &ConcreteJob, ctx: &ExecutionContext) -> bool {
        if let Some(tags) = self.tags {
            if ctx.tag_present() != tags {
                return false;
            }
        }

        // A tag build deploys regardless of the branch it was cut from
        let tag_build = self.tags == Some(true) && ctx.tag_present();
        if !tag_build && !self.all_branches.unwrap_or(false) {
            if let Some(branches) = &self.branch {
                if !branches.iter().any(|b| b == &ctx.branch) {
                    return false;
                }
            }
        }

        if let Some(repo) = &self.repo {
            if repo != &ctx.repository {
                return false;
            }
        }

        if let Some(env) = &self.env {
            if !env
                .iter()
                .all(|(key, value)| job.env_value(key) == Some(value.as_str()))
            {
                return false;
            }
        }

        is_active(self.condition.as_ref(), ctx)
    }
}

/// A deploy clause as declared, possibly composed over a template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployClause {
    /// Template this clause overrides
    pub extends: Option<String>,
    pub provider: Option<String>,
    pub params: EnvMap,
    pub on: DeployOn,
}

impl DeployClause {
    /// A bare reference to a named template
    pub fn from_template(name: impl Into<String>) -> Self {
        Self {
            extends: Some(name.into()),
            ..Default::default()
        }
    }

    /// Overlay `specific` on `self` field by field
    ///
    /// Parameters merge per key. The result inherits `self.extends`
    /// since the specific clause's base is `self`.
    pub fn overlay(&self, specific: &DeployClause) -> DeployClause {
        let mut params = self.params.clone();
        params.extend(specific.params.clone());

        DeployClause {
            extends: self.extends.clone(),
            provider: specific.provider.clone().or_else(|| self.provider.clone()),
            params,
            on: self.on.overlay(&specific.on),
        }
    }
}

/// A fully composed clause, ready to be checked against a context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedClause {
    pub provider: String,
    pub params: EnvMap,
    pub on: DeployOn,

    /// Templates composed into this clause, most specific first
    pub chain: Vec<String>,
}

impl ResolvedClause {
    pub fn is_active(&self, job: &ConcreteJob, ctx: &ExecutionContext) -> bool {
        self.on.is_satisfied(job, ctx)
    }

    pub fn to_action(&self) -> DeployAction {
        DeployAction {
            provider: self.provider.clone(),
            params: self.params.clone(),
            template: self.chain.first().cloned(),
        }
    }
}

/// A deploy action attached to a concrete job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployAction {
    /// Opaque provider identifier (e.g. `pypi`, `releases`, `helm`)
    pub provider: String,

    /// Provider parameters; secrets stay opaque tokens
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: EnvMap,

    /// Template the clause was composed from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}
