//! CLI output formatting

use crate::{
    core::{deploy::DeployAction, job::ConcreteJob, PipelineSpec},
    execution::{ExecutionPlan, PlanEvent, SchedulingStrategy},
};
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");

/// Format a scheduling strategy for display
pub fn format_strategy(strategy: SchedulingStrategy) -> String {
    match strategy {
        SchedulingStrategy::Sequential => style("sequential").dim().to_string(),
        SchedulingStrategy::Parallel => style("parallel").cyan().to_string(),
        SchedulingStrategy::LimitedParallel(max) => {
            style(format!("parallel (max {})", max)).cyan().to_string()
        }
    }
}

/// Format a planning event for display
pub fn format_plan_event(event: &PlanEvent) -> String {
    match event {
        PlanEvent::PlanStarted { pipeline, context } => format!(
            "{} Planning {} for {}",
            ROCKET,
            style(pipeline).bold(),
            style(context).dim()
        ),
        PlanEvent::StageScheduled { stage, jobs } => {
            format!("{} {} ({} jobs)", CHECK, style(stage).green(), jobs)
        }
        PlanEvent::StageSkipped { stage } => {
            format!("{} {} (condition false)", SKIP, style(stage).dim())
        }
        PlanEvent::PlanCompleted { jobs, deploys } => format!(
            "{} Plan ready: {} jobs, {} deploys",
            INFO,
            style(jobs).cyan(),
            style(deploys).cyan()
        ),
        PlanEvent::PlanRejected { error } => {
            format!("{} Plan rejected: {}", CROSS, style(error).red())
        }
    }
}

/// Format a deploy action; secret params show as `<secret>`
pub fn format_deploy(action: &DeployAction) -> String {
    let params: Vec<String> = action
        .params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();

    let mut line = format!("deploy {}", style(&action.provider).magenta());
    if let Some(template) = &action.template {
        line.push_str(&format!(" {}", style(format!("[{}]", template)).dim()));
    }
    if !params.is_empty() {
        line.push_str(&format!(" {}", params.join(" ")));
    }
    line
}

/// Format a concrete job line
pub fn format_job(job: &ConcreteJob) -> String {
    let mut line = format!("{} {}", style(&job.number).dim(), style(&job.name).bold());
    if job.allow_failure {
        line.push_str(&format!(" {}", style("(allowed to fail)").yellow()));
    }
    line
}

/// Render a whole plan as text
pub fn format_plan(plan: &ExecutionPlan) -> String {
    let mut out = Vec::new();

    out.push(format!(
        "{} {} for {} ({})",
        ROCKET,
        style(&plan.pipeline).bold(),
        style(&plan.context).dim(),
        format_strategy(plan.strategy)
    ));

    if plan.is_empty() {
        out.push(format!("{} No jobs to run", WARN));
    }

    for stage in &plan.stages {
        let mut header = format!("\n{} {}", style("Stage").bold(), style(&stage.name).cyan());
        if stage.fast_finish {
            header.push_str(&format!(" {}", style("(fast finish)").dim()));
        }
        out.push(header);

        for job in plan.stage_jobs(stage) {
            out.push(format!("  {}", format_job(job)));
            for action in &job.deploy {
                out.push(format!("      {}", format_deploy(action)));
            }
        }
    }

    for stage in &plan.skipped_stages {
        out.push(format!("{} {} skipped", SKIP, style(stage).dim()));
    }

    out.join("\n")
}

/// Summary lines for a validated pipeline
pub fn format_spec_summary(spec: &PipelineSpec) -> Vec<String> {
    let mut lines = vec![format!("  Name: {}", style(&spec.name).bold())];
    lines.push(format!("  Stages: {}", style(spec.stages.len()).cyan()));

    for stage in spec.stages_in_order() {
        let cells: usize = stage.jobs.iter().map(|j| j.cross_product_size()).sum();
        lines.push(format!(
            "    {}. {} ({} job templates, up to {} jobs){}",
            stage.position,
            style(&stage.name).cyan(),
            stage.jobs.len(),
            cells,
            if stage.condition.is_some() { " [conditional]" } else { "" }
        ));
    }

    lines.push(format!(
        "  Deploy templates: {}",
        style(spec.deploy_templates.len()).cyan()
    ));
    lines
}
