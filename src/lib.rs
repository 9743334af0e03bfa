//! ElasticDash: trace-based tests for LLM-driven workflows
//!
//! Re-exports the core library and the command-line entry point so test
//! binaries need a single dependency.

pub use elasticdash_cli::{Cli, DashConfig, ReportFormat, run_cli, run_with_cli};
pub use elasticdash_core::*;
