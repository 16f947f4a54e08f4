use anyhow::{Context, Result};
use stagegate::cli::commands::{PlanCommand, ValidateCommand};
use stagegate::cli::output::*;
use stagegate::cli::{Cli, Command};
use stagegate::core::config::PipelineConfig;
use stagegate::execution::PlanningEngine;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Plan(cmd) => plan_pipeline(cmd, cli.verbose)?,
        Command::Validate(cmd) => validate_pipeline(cmd)?,
    }

    Ok(())
}

fn plan_pipeline(cmd: &PlanCommand, verbose: bool) -> Result<()> {
    let config = PipelineConfig::from_file(&cmd.file).context("Failed to load pipeline config")?;
    let spec = config.to_spec()?;
    let ctx = cmd.execution_context()?;

    let mut engine = PlanningEngine::new(&spec);
    if let Some(strategy) = cmd.scheduling_strategy() {
        engine = engine.with_strategy(strategy);
    }

    // Events go to stderr so --json output stays parseable
    if verbose {
        engine.add_event_handler(|event| eprintln!("{}", format_plan_event(&event)));
    }

    match engine.plan(&ctx) {
        Ok(plan) => {
            if cmd.json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                println!("{}", format_plan(&plan));
            }
            Ok(())
        }
        Err(e) => {
            println!("{} No plan produced:", CROSS);
            println!("  {}", style(&e).red());
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating pipeline...", INFO);

    let result = PipelineConfig::from_file(&cmd.file).and_then(|config| {
        let spec = config.to_spec()?;
        Ok((config, spec))
    });

    match result {
        Ok((config, spec)) => {
            println!("{} Pipeline configuration is valid!", CHECK);
            for line in format_spec_summary(&spec) {
                println!("{}", line);
            }
            println!("  Job templates: {}", style(config.job_count()).cyan());

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(format!("{:#}", e)).red());
            std::process::exit(1);
        }
    }
}
