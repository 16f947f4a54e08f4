//! Deploy resolution - composes deploy clauses and gates them per job

use crate::core::{
    context::ExecutionContext,
    deploy::{DeployAction, DeployClause, ResolvedClause},
    error::CompositionError,
    job::ConcreteJob,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Resolves deploy clauses against the pipeline's templates
pub struct DeployResolver<'a> {
    templates: &'a BTreeMap<String, DeployClause>,
}

impl<'a> DeployResolver<'a> {
    pub fn new(templates: &'a BTreeMap<String, DeployClause>) -> Self {
        Self { templates }
    }

    /// Fold a clause's composition chain into one clause
    ///
    /// The chain is walked from the clause to its root template; fields are
    /// then overlaid from the root down so the most specific value wins.
    /// Pure: composing the same clause twice gives equal results.
    pub fn compose(
        &self,
        clause: &DeployClause,
        location: &str,
    ) -> Result<ResolvedClause, CompositionError> {
        let mut chain: Vec<String> = Vec::new();
        let mut layers: Vec<&DeployClause> = vec![clause];
        let mut next = clause.extends.as_ref();

        while let Some(name) = next {
            if chain.contains(name) {
                chain.push(name.clone());
                return Err(CompositionError::Cycle {
                    location: location.to_string(),
                    chain,
                });
            }

            let base = self
                .templates
                .get(name)
                .ok_or_else(|| CompositionError::MissingBase {
                    location: location.to_string(),
                    base: name.clone(),
                })?;

            chain.push(name.clone());
            layers.push(base);
            next = base.extends.as_ref();
        }

        let mut layers = layers.into_iter().rev();
        let root = layers.next().cloned().unwrap_or_default();
        let composed = layers.fold(root, |acc, specific| acc.overlay(specific));

        let provider = composed
            .provider
            .ok_or_else(|| CompositionError::MissingProvider {
                location: location.to_string(),
            })?;

        Ok(ResolvedClause {
            provider,
            params: composed.params,
            on: composed.on,
            chain,
        })
    }

    /// Deploy actions that fire for a job, in clause declaration order
    ///
    /// Every clause is composed before any gate is checked, so a broken
    /// chain is reported even when its gate would be false.
    pub fn resolve(
        &self,
        job: &ConcreteJob,
        clauses: &[DeployClause],
        ctx: &ExecutionContext,
    ) -> Result<Vec<DeployAction>, CompositionError> {
        let mut actions = Vec::new();

        for (index, clause) in clauses.iter().enumerate() {
            let location = format!(
                "stage '{}', job '{}', deploy #{}",
                job.stage,
                job.template,
                index + 1
            );
            let resolved = self.compose(clause, &location)?;

            if resolved.is_active(job, ctx) {
                actions.push(resolved.to_action());
            } else {
                debug!(
                    "Deploy '{}' not attached to '{}': gate is false",
                    resolved.provider, job.name
                );
            }
        }

        Ok(actions)
    }
}
