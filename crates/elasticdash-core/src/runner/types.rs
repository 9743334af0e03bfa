//! Result types produced by the runner

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;

use crate::error::{DashError, UnifiedError};
use crate::trace::Trace;

/// Final state of a test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
}

impl TestStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, TestStatus::Passed)
    }
}

/// Outcome of one test
#[derive(Debug, Clone)]
pub struct TestResult {
    pub name: String,
    pub file: String,
    pub status: TestStatus,
    pub duration: Duration,
    /// Primary failure
    pub error: Option<DashError>,
    /// Hook failures reported alongside the primary failure
    pub secondary_errors: Vec<DashError>,
    /// Sealed trace recorded while the test ran
    pub trace: Trace,
}

impl TestResult {
    pub fn passed(
        name: impl Into<String>,
        file: impl Into<String>,
        duration: Duration,
        trace: Trace,
    ) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            status: TestStatus::Passed,
            duration,
            error: None,
            secondary_errors: Vec::new(),
            trace,
        }
    }

    pub fn failed(
        name: impl Into<String>,
        file: impl Into<String>,
        duration: Duration,
        error: DashError,
        trace: Trace,
    ) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            status: TestStatus::Failed,
            duration,
            error: Some(error),
            secondary_errors: Vec::new(),
            trace,
        }
    }

    pub fn is_passed(&self) -> bool {
        self.status.is_success()
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration.as_millis() as u64
    }

    /// Primary error followed by secondary errors
    pub fn errors(&self) -> impl Iterator<Item = &DashError> {
        self.error.iter().chain(self.secondary_errors.iter())
    }

    /// Attach further failures; the first one becomes primary if the test had none
    pub(crate) fn attach_errors(&mut self, errors: impl IntoIterator<Item = DashError>) {
        for error in errors {
            if self.error.is_none() {
                self.error = Some(error);
            } else {
                self.secondary_errors.push(error);
            }
            self.status = TestStatus::Failed;
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "file": self.file,
            "status": self.status,
            "duration_ms": self.duration_ms(),
            "error": self.error.as_ref().map(error_json),
            "secondary_errors": self.secondary_errors.iter().map(error_json).collect::<Vec<_>>(),
            "trace": self.trace.to_json(),
        })
    }
}

/// JSON view of an error for reports
pub fn error_json(error: &DashError) -> Value {
    json!({
        "code": error.error_code(),
        "message": error.to_string(),
    })
}

/// Outcome of one source file
#[derive(Debug, Clone)]
pub struct FileResult {
    pub file: String,
    pub tests: Vec<TestResult>,
    pub before_all_error: Option<DashError>,
    pub after_all_errors: Vec<DashError>,
    pub duration: Duration,
}

impl FileResult {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            tests: Vec::new(),
            before_all_error: None,
            after_all_errors: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    pub fn passed(&self) -> usize {
        self.tests.iter().filter(|t| t.is_passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.tests.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.before_all_error.is_none() && self.after_all_errors.is_empty()
    }

    pub fn to_json(&self) -> Value {
        json!({
            "file": self.file,
            "duration_ms": self.duration.as_millis() as u64,
            "before_all_error": self.before_all_error.as_ref().map(error_json),
            "after_all_errors": self.after_all_errors.iter().map(error_json).collect::<Vec<_>>(),
            "tests": self.tests.iter().map(TestResult::to_json).collect::<Vec<_>>(),
        })
    }
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub files: Vec<FileResult>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new(files: Vec<FileResult>, elapsed: Duration) -> Self {
        Self { files, elapsed }
    }

    pub fn total(&self) -> usize {
        self.files.iter().map(|f| f.tests.len()).sum()
    }

    pub fn passed(&self) -> usize {
        self.files.iter().map(FileResult::passed).sum()
    }

    pub fn failed(&self) -> usize {
        self.files.iter().map(FileResult::failed).sum()
    }

    pub fn is_success(&self) -> bool {
        self.files.iter().all(FileResult::is_success)
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }

    pub fn to_json(&self) -> Value {
        json!({
            "total": self.total(),
            "passed": self.passed(),
            "failed": self.failed(),
            "elapsed_ms": self.elapsed_ms(),
            "files": self.files.iter().map(FileResult::to_json).collect::<Vec<_>>(),
        })
    }
}
