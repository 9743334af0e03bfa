//! Run reports
//!
//! Live console output while tests run, or a JSON document once the run ends.

mod console;
mod json;

pub use console::{ConsoleReporter, format_file_errors, format_summary, format_test_line};
pub use json::JsonReporter;

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use elasticdash_core::RunSummary;

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
}

/// Render a finished run in the given format
pub fn generate_report(summary: &RunSummary, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => JsonReporter::generate(summary),
        ReportFormat::Table => {
            let mut output = String::new();
            for file in &summary.files {
                for test in &file.tests {
                    output.push_str(&format_test_line(test));
                    output.push('\n');
                }
                for line in format_file_errors(file) {
                    output.push_str(&line);
                    output.push('\n');
                }
            }
            output.push_str(&format_summary(summary));
            Ok(output)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elasticdash_core::{FileResult, TestResult, Trace};
    use std::time::Duration;

    #[test]
    fn test_table_report_lists_every_test() {
        colored::control::set_override(false);
        let mut file = FileResult::new("flows/login.ai_test.rs");
        file.tests.push(TestResult::passed(
            "logs in",
            "flows/login.ai_test.rs",
            Duration::from_millis(20),
            Trace::new(),
        ));
        let summary = RunSummary::new(vec![file], Duration::from_millis(25));

        let report = generate_report(&summary, ReportFormat::Table).unwrap();
        assert!(report.contains("✓ logs in"));
        assert!(report.contains("1 passed"));
        assert!(report.contains("Total: 1"));
    }

    #[test]
    fn test_format_serde_names() {
        let format: ReportFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, ReportFormat::Json);
        assert_eq!(ReportFormat::default(), ReportFormat::Table);
    }
}
