//! Console reporter

use colored::Colorize;

use elasticdash_core::{FileResult, RunObserver, RunSummary, TestResult};

/// Prints results as each test finishes
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

impl RunObserver for ConsoleReporter {
    fn on_run_start(&self, files: &[String]) {
        if files.is_empty() {
            println!("{}", "No test files matched".yellow());
        }
    }

    fn on_file_start(&self, file: &str) {
        println!("\n{}", file.bold());
    }

    fn on_test_finish(&self, result: &TestResult) {
        println!("{}", format_test_line(result));
    }

    fn on_file_finish(&self, result: &FileResult) {
        for line in format_file_errors(result) {
            println!("{}", line);
        }
    }

    fn on_run_finish(&self, summary: &RunSummary) {
        println!("\n{}", format_summary(summary));
    }
}

/// `✓ name (0.12s)` followed by one `    → ` line per error line
pub fn format_test_line(result: &TestResult) -> String {
    let mark = if result.is_passed() {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    let mut line = format!(
        "{} {} ({:.2}s)",
        mark,
        result.name,
        result.duration.as_secs_f64()
    );
    for error in result.errors() {
        for message in error.to_string().lines() {
            line.push_str(&format!("\n    → {}", message));
        }
    }
    line
}

/// File-level hook failures
pub fn format_file_errors(result: &FileResult) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(error) = &result.before_all_error {
        lines.push(
            format!("✗ {} beforeAll failed: {}", result.file, error)
                .red()
                .to_string(),
        );
    }
    for error in &result.after_all_errors {
        lines.push(
            format!("✗ {} afterAll failed: {}", result.file, error)
                .red()
                .to_string(),
        );
    }
    lines
}

/// `N passed M failed` and the total
pub fn format_summary(summary: &RunSummary) -> String {
    let mut parts = vec![format!("{} passed", summary.passed()).green().to_string()];
    if summary.failed() > 0 {
        parts.push(format!("{} failed", summary.failed()).red().to_string());
    }
    let hook_failures: usize = summary
        .files
        .iter()
        .map(|f| usize::from(f.before_all_error.is_some()) + f.after_all_errors.len())
        .sum();
    if hook_failures > 0 {
        parts.push(
            format!("{} hook failure(s)", hook_failures)
                .yellow()
                .to_string(),
        );
    }
    format!(
        "{}\nTotal: {} ({:.2}s)",
        parts.join(" "),
        summary.total(),
        summary.elapsed.as_secs_f64()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use elasticdash_core::{DashError, Trace};
    use std::time::Duration;

    fn failed(name: &str, error: DashError) -> TestResult {
        TestResult::failed(name, "a.ai_test.rs", Duration::from_millis(1500), error, Trace::new())
    }

    #[test]
    fn test_passed_line() {
        colored::control::set_override(false);
        let result = TestResult::passed(
            "greets",
            "a.ai_test.rs",
            Duration::from_millis(120),
            Trace::new(),
        );
        assert_eq!(format_test_line(&result), "✓ greets (0.12s)");
    }

    #[test]
    fn test_failed_line_lists_errors() {
        colored::control::set_override(false);
        let mut result = failed("books flight", DashError::assertion("Expected tool call 'book'"));
        result.secondary_errors.push(DashError::hook_failure("afterEach", "cleanup failed"));

        let text = format_test_line(&result);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "✗ books flight (1.50s)");
        assert!(lines[1].starts_with("    → "));
        assert!(lines[1].contains("Expected tool call 'book'"));
        assert!(lines[2].contains("cleanup failed"));
    }

    #[test]
    fn test_file_errors() {
        colored::control::set_override(false);
        let mut file = FileResult::new("a.ai_test.rs");
        file.before_all_error = Some(DashError::hook_failure("beforeAll", "db down"));
        file.after_all_errors.push(DashError::hook_failure("afterAll", "teardown"));

        let lines = format_file_errors(&file);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("✗ a.ai_test.rs beforeAll failed:"));
        assert!(lines[1].starts_with("✗ a.ai_test.rs afterAll failed:"));
    }

    #[test]
    fn test_summary_counts() {
        colored::control::set_override(false);
        let mut file = FileResult::new("a.ai_test.rs");
        file.tests.push(TestResult::passed("one", "a.ai_test.rs", Duration::ZERO, Trace::new()));
        file.tests.push(failed("two", DashError::assertion("nope")));
        let summary = RunSummary::new(vec![file], Duration::from_millis(2000));

        let text = format_summary(&summary);
        assert!(text.starts_with("1 passed 1 failed"));
        assert!(text.ends_with("Total: 2 (2.00s)"));
    }

    #[test]
    fn test_summary_omits_zero_failures() {
        colored::control::set_override(false);
        let summary = RunSummary::default();
        let text = format_summary(&summary);
        assert!(text.starts_with("0 passed\n"));
        assert!(!text.contains("failed"));
    }
}
