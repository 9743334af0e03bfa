//! JSON report generation

use anyhow::Result;
use chrono::Utc;

use elasticdash_core::RunSummary;

/// JSON report generator
pub struct JsonReporter;

impl JsonReporter {
    /// Generate a JSON report
    pub fn generate(summary: &RunSummary) -> Result<String> {
        let mut report = summary.to_json();
        if let Some(object) = report.as_object_mut() {
            object.insert("success".into(), summary.is_success().into());
            object.insert("generated_at".into(), Utc::now().to_rfc3339().into());
        }
        Ok(serde_json::to_string_pretty(&report)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elasticdash_core::{DashError, FileResult, TestResult, Trace};
    use serde_json::Value;
    use std::time::Duration;

    #[test]
    fn test_json_generation() {
        let trace = Trace::new();
        trace.record_tool_call(elasticdash_core::ToolCall::new("search"));

        let mut file = FileResult::new("a.ai_test.rs");
        file.tests.push(TestResult::passed(
            "finds",
            "a.ai_test.rs",
            Duration::from_millis(3),
            trace,
        ));
        file.tests.push(TestResult::failed(
            "fails",
            "a.ai_test.rs",
            Duration::from_millis(4),
            DashError::assertion("missing step"),
            Trace::new(),
        ));
        let summary = RunSummary::new(vec![file], Duration::from_millis(10));

        let json = JsonReporter::generate(&summary).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["total"], 2);
        assert_eq!(value["passed"], 1);
        assert_eq!(value["failed"], 1);
        assert_eq!(value["success"], false);
        assert!(value["generated_at"].is_string());
        let tests = value["files"][0]["tests"].as_array().unwrap();
        assert_eq!(tests[0]["status"], "passed");
        assert_eq!(tests[1]["error"]["code"], "DASH_ASSERTION");
        assert!(json.contains('\n'));
    }
}
