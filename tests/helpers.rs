//! Test utility functions for stagegate
#![allow(dead_code)]

use stagegate::core::config::PipelineConfig;
use stagegate::core::deploy::DeployAction;
use stagegate::{ConcreteJob, EventType, ExecutionContext, ExecutionPlan, PipelineSpec, PlanningEngine};
use std::path::PathBuf;

pub const REPO: &str = "SwissDataScienceCenter/renku-python";

/// Push to a branch of the upstream repository
pub fn push(branch: &str) -> ExecutionContext {
    ExecutionContext::new(branch, EventType::Push).with_repository(REPO)
}

/// Tag build; the branch is the tag name, as CI services report it
pub fn tag(name: &str) -> ExecutionContext {
    ExecutionContext::new(name, EventType::Push)
        .with_tag(name)
        .with_repository(REPO)
}

pub fn pull_request(branch: &str) -> ExecutionContext {
    ExecutionContext::new(branch, EventType::PullRequest).with_repository(REPO)
}

pub fn scheduled(branch: &str) -> ExecutionContext {
    ExecutionContext::new(branch, EventType::Schedule).with_repository(REPO)
}

/// Every combination of the trigger facts the predicates can observe
pub fn all_contexts() -> Vec<ExecutionContext> {
    let events = [
        EventType::Push,
        EventType::PullRequest,
        EventType::Schedule,
        EventType::Api,
    ];
    let mut contexts = Vec::new();
    for branch in ["master", "develop", "v1.2.3"] {
        for event in events {
            for tag in [None, Some("v1.2.3")] {
                for repo in [REPO, "someone/fork"] {
                    let mut ctx = ExecutionContext::new(branch, event).with_repository(repo);
                    if let Some(tag) = tag {
                        ctx = ctx.with_tag(tag);
                    }
                    contexts.push(ctx);
                }
            }
        }
    }
    contexts
}

pub fn spec_from_yaml(yaml: &str) -> PipelineSpec {
    PipelineSpec::from_yaml(yaml).unwrap_or_else(|e| panic!("Invalid pipeline: {}", e))
}

/// Plan a document, panicking on any error
pub fn plan_yaml(yaml: &str, ctx: &ExecutionContext) -> ExecutionPlan {
    let spec = spec_from_yaml(yaml);
    PlanningEngine::new(&spec)
        .plan(ctx)
        .unwrap_or_else(|e| panic!("Planning failed: {}", e))
}

pub fn release_pipeline_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("pipelines/release.yml")
}

/// The sample release pipeline shipped with the crate
pub fn release_spec() -> PipelineSpec {
    PipelineConfig::from_file(release_pipeline_path())
        .and_then(|config| Ok(config.to_spec()?))
        .unwrap_or_else(|e| panic!("Invalid release pipeline: {:#}", e))
}

pub fn stage_names(plan: &ExecutionPlan) -> Vec<&str> {
    plan.stages.iter().map(|s| s.name.as_str()).collect()
}

pub fn job_names(plan: &ExecutionPlan) -> Vec<&str> {
    plan.jobs.iter().map(|j| j.name.as_str()).collect()
}

/// Jobs expanded from one template
pub fn jobs_of<'a>(plan: &'a ExecutionPlan, template: &str) -> Vec<&'a ConcreteJob> {
    plan.jobs.iter().filter(|j| j.template == template).collect()
}

pub fn find_job<'a>(plan: &'a ExecutionPlan, name: &str) -> &'a ConcreteJob {
    plan.jobs
        .iter()
        .find(|j| j.name == name)
        .unwrap_or_else(|| panic!("Job '{}' not in plan: {:?}", name, job_names(plan)))
}

pub fn providers(job: &ConcreteJob) -> Vec<&str> {
    job.deploy.iter().map(|d| d.provider.as_str()).collect()
}

pub fn deploy_by_template<'a>(job: &'a ConcreteJob, template: &str) -> Option<&'a DeployAction> {
    job.deploy
        .iter()
        .find(|d| d.template.as_deref() == Some(template))
}

/// Assert the plan's stages, in order
pub fn assert_stage_order(plan: &ExecutionPlan, expected: &[&str]) {
    assert_eq!(
        stage_names(plan),
        expected,
        "Unexpected stage order for context {}",
        plan.context
    );
}

/// Assert no stage of the plan contributes jobs for a name
pub fn assert_stage_absent(plan: &ExecutionPlan, stage: &str) {
    assert!(
        plan.stage(stage).is_none(),
        "Stage '{}' should not be in the plan, got {:?}",
        stage,
        stage_names(plan)
    );
    assert!(
        plan.jobs.iter().all(|j| j.stage != stage),
        "Jobs of stage '{}' leaked into the plan",
        stage
    );
}
