//! Run progress callbacks

use super::types::{FileResult, RunSummary, TestResult};

/// Receives progress events while a run executes. All methods default to no-ops.
pub trait RunObserver: Send + Sync {
    fn on_run_start(&self, _files: &[String]) {}

    fn on_file_start(&self, _file: &str) {}

    fn on_test_finish(&self, _result: &TestResult) {}

    fn on_file_finish(&self, _result: &FileResult) {}

    fn on_run_finish(&self, _summary: &RunSummary) {}
}
