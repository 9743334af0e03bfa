//! Test execution
//!
//! Files run in order; within a file each test gets a fresh [`Trace`] bound to
//! the running task, runs between its `beforeEach` and `afterEach` hooks and
//! ends with the trace sealed.
//!
//! [`Trace`]: crate::trace::Trace

pub mod executor;
pub mod observer;
pub mod options;
pub mod types;

pub use executor::Runner;
pub use observer::RunObserver;
pub use options::RunOptions;
pub use types::{FileResult, RunSummary, TestResult, TestStatus, error_json};

use crate::registry::Session;

/// Run every file registered in `session`
pub async fn run_all(session: &Session, options: RunOptions) -> RunSummary {
    Runner::new(session).with_options(options).run_all().await
}

/// Run the given files of `session` in order
pub async fn run_files(session: &Session, files: &[String], options: RunOptions) -> RunSummary {
    Runner::new(session).with_options(options).run_files(files).await
}

/// Run a single file of `session`
pub async fn run_file(session: &Session, file: &str, options: RunOptions) -> FileResult {
    Runner::new(session).with_options(options).run_file(file).await
}
