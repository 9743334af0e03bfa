//! Command-line front end for ElasticDash test binaries
//!
//! A test binary registers its files on a [`Session`] and hands control to
//! [`run_cli`]:
//!
//! ```no_run
//! use elasticdash_core::Session;
//!
//! #[tokio::main]
//! async fn main() -> std::process::ExitCode {
//!     let session = Session::new();
//!     // register suites here
//!     elasticdash_cli::run_cli(&session).await
//! }
//! ```

pub mod args;
pub mod config;
pub mod discovery;
pub mod logging;
pub mod reporter;

pub use args::{Cli, Commands, RunArgs};
pub use config::DashConfig;
pub use reporter::{ConsoleReporter, JsonReporter, ReportFormat};

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use elasticdash_core::{
    JudgeDefaults, RunOptions, RunSummary, Runner, Session, install_ai_interceptor,
    set_judge_defaults, uninstall_ai_interceptor,
};

use discovery::{resolve_file, select_files};
use logging::init_logging;

/// Parse process arguments, run the selected tests and map the outcome to an exit code
pub async fn run_cli(session: &Session) -> ExitCode {
    let cli = Cli::parse();
    match run_with_cli(session, cli).await {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Run with already-parsed arguments
pub async fn run_with_cli(session: &Session, cli: Cli) -> Result<RunSummary> {
    dotenv::dotenv().ok();

    let args = cli.command.run_args().clone();
    let config = DashConfig::load(args.config.as_deref())?;
    let level = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    init_logging(level);
    debug!("Loaded configuration: {:?}", config);

    set_judge_defaults(JudgeDefaults::from(&config.judge));

    let registered = session.files();
    let files = match &cli.command {
        Commands::Test { patterns, .. } => {
            let patterns = if patterns.is_empty() {
                &config.test_match
            } else {
                patterns
            };
            select_files(&registered, patterns)?
        }
        Commands::Run { file, .. } => vec![resolve_file(&registered, file)?],
    };
    if files.is_empty() {
        warn!(
            "No registered test files matched ({} registered)",
            registered.len()
        );
    }

    let mut options = RunOptions::new();
    if let Some(timeout) = args
        .timeout_ms
        .map(Duration::from_millis)
        .or_else(|| config.test_timeout())
    {
        options = options.with_test_timeout(timeout);
    }
    if let Some(filter) = args.filter {
        options = options.with_name_filter(filter);
    }

    let format = args.format.unwrap_or(config.report_format);
    let mut runner = Runner::new(session).with_options(options);
    if format == ReportFormat::Table {
        runner = runner.with_observer(Arc::new(ConsoleReporter::new()));
    }

    // Leave an interceptor installed by the caller alone
    let installed_here = config.intercept && !args.no_intercept && install_ai_interceptor();
    let summary = runner.run_files(&files).await;
    if installed_here {
        uninstall_ai_interceptor();
    }

    if format == ReportFormat::Json {
        println!("{}", JsonReporter::generate(&summary)?);
    }
    Ok(summary)
}
