//! CLI argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::reporter::ReportFormat;

#[derive(Parser, Debug)]
#[command(name = "elasticdash")]
#[command(about = "Run trace-based tests for AI workflows")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every registered test file matching the patterns
    Test {
        /// Glob patterns selecting test files (defaults to `test_match` from config)
        patterns: Vec<String>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Run a single registered test file
    Run {
        /// Registered file path, or a suffix of it
        file: String,

        #[command(flatten)]
        run: RunArgs,
    },
}

impl Commands {
    pub fn run_args(&self) -> &RunArgs {
        match self {
            Commands::Test { run, .. } | Commands::Run { run, .. } => run,
        }
    }
}

/// Options shared by `test` and `run`
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Path to the configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Only run tests whose name contains this text
    #[arg(long)]
    pub filter: Option<String>,

    /// Report format
    #[arg(long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Per-test timeout in milliseconds
    #[arg(long = "timeout-ms")]
    pub timeout_ms: Option<u64>,

    /// Do not record LLM traffic automatically
    #[arg(long)]
    pub no_intercept: bool,
}
