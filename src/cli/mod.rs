//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{PlanCommand, ValidateCommand};
use std::ffi::OsString;

/// Evaluate CI pipeline documents into execution plans
#[derive(Debug, Parser, Clone)]
#[command(name = "stagegate")]
#[command(version)]
#[command(about = "Evaluates staged CI pipelines against a trigger context", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Build the execution plan for a trigger context
    Plan(PlanCommand),

    /// Validate a pipeline document
    Validate(ValidateCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
