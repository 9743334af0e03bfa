//! A recorded workflow checked with deterministic and judged matchers

use async_trait::async_trait;
use clap::Parser;
use elasticdash::{
    Cli, CustomStepMatcher, DashError, DashResult, HttpRequest, HttpResponse, HttpTransport,
    JudgeOptions, LlmStep, MetricCondition, MetricOptions, Session, TestStatus, ToolCall,
    UnifiedError, expect, run_with_cli,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Anthropic-shaped judge that agrees on meaning and scores everything 0.9
struct FakeAnthropic;

#[async_trait]
impl HttpTransport for FakeAnthropic {
    async fn send(&self, request: HttpRequest) -> DashResult<HttpResponse> {
        assert_eq!(request.header("x-api-key"), Some("test-key"));
        let body = request.json().unwrap_or_default();
        let system = body["system"].as_str().unwrap_or_default();
        let reply = if system.contains("semantic equivalence") {
            "Yes."
        } else {
            "0.9"
        };
        Ok(HttpResponse::new(
            200,
            json!({"content": [{"type": "text", "text": reply}]}).to_string(),
        ))
    }
}

fn judge() -> JudgeOptions {
    JudgeOptions::new()
        .with_provider("anthropic")
        .with_api_key("test-key")
        .with_transport(Arc::new(FakeAnthropic))
}

fn record_booking(trace: &elasticdash::Trace) {
    trace.record_llm_step(
        LlmStep::new("claude-3-5-haiku-latest")
            .with_prompt("Book a table for two at 7pm")
            .with_completion("Your table for two is booked for 7pm."),
    );
    trace.record_tool_call(
        ToolCall::new("reserve")
            .with_arg("party", 2)
            .with_arg("time", "19:00"),
    );
    trace.record_custom_step(
        elasticdash::CustomStep::new("rag")
            .with_name("menu lookup")
            .with_tag("retrieval")
            .with_result(json!({"documents": 3})),
    );
}

#[tokio::test]
async fn judged_and_deterministic_matchers_in_one_run() {
    let session = Session::new();
    let suite = session.file("flows/booking.ai_test.rs");

    suite
        .test("books a table", |ctx| async move {
            record_booking(&ctx.trace);
            let expectation = expect(&ctx.trace);
            expectation
                .to_call_tool(elasticdash::ToolCallMatcher::new("reserve").args_contains("19:00"))?
                .to_have_custom_step(CustomStepMatcher::new().kind("rag").tag("retrieval"))?;
            expectation
                .to_match_semantic_output(
                    "The reservation for 2 people at 7pm is confirmed",
                    judge(),
                )
                .await?;
            let score = expectation
                .to_evaluate_output_metric(
                    "Is the reply polite?",
                    MetricOptions::new().judge(judge()),
                )
                .await?;
            anyhow::ensure!(score > 0.8, "unexpected score {score}");
            Ok(())
        })
        .unwrap();

    suite
        .test("demands a perfect score", |ctx| async move {
            record_booking(&ctx.trace);
            expect(&ctx.trace)
                .to_evaluate_output_metric(
                    "Is the reply perfect?",
                    MetricOptions::new()
                        .condition(MetricCondition::AtLeast(0.95))
                        .judge(judge()),
                )
                .await?;
            Ok(())
        })
        .unwrap();

    let cli = Cli::try_parse_from([
        "elasticdash",
        "test",
        "flows/*.ai_test.rs",
        "--no-intercept",
        "--format",
        "json",
    ])
    .unwrap();
    let summary = run_with_cli(&session, cli).await.unwrap();

    assert_eq!(summary.total(), 2);
    let tests = &summary.files[0].tests;
    assert_eq!(tests[0].status, TestStatus::Passed, "{:?}", tests[0].error);
    assert_eq!(tests[1].status, TestStatus::Failed);

    let error = tests[1].error.as_ref().unwrap();
    assert!(matches!(error, DashError::MetricConditionFailed { .. }), "{error}");
    assert_eq!(error.error_code(), "DASH_METRIC_CONDITION");
}

/// Counts requests and never answers usefully
#[derive(Default)]
struct CountingTransport {
    requests: AtomicUsize,
}

#[async_trait]
impl HttpTransport for CountingTransport {
    async fn send(&self, _request: HttpRequest) -> DashResult<HttpResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(HttpResponse::new(500, "unreachable"))
    }
}

#[tokio::test]
async fn judge_without_credentials_fails_before_any_request() {
    let transport = Arc::new(CountingTransport::default());
    let session = Session::new();
    let judge_transport = transport.clone();
    session
        .file("flows/nokey.ai_test.rs")
        .test("needs a key", move |ctx| {
            let options = JudgeOptions::new()
                .with_provider("gemini")
                .with_credential_lookup(|_| None)
                .with_transport(judge_transport.clone());
            async move {
                record_booking(&ctx.trace);
                expect(&ctx.trace)
                    .to_match_semantic_output("confirmed", options)
                    .await?;
                Ok(())
            }
        })
        .unwrap();

    let cli = Cli::try_parse_from([
        "elasticdash",
        "run",
        "nokey.ai_test.rs",
        "--no-intercept",
        "--format",
        "json",
    ])
    .unwrap();
    let summary = run_with_cli(&session, cli).await.unwrap();

    let result = &summary.files[0].tests[0];
    assert_eq!(
        result.error,
        Some(DashError::missing_credential(
            "gemini",
            &["GEMINI_API_KEY", "GOOGLE_API_KEY"]
        ))
    );
    assert_eq!(transport.requests.load(Ordering::SeqCst), 0);
}
