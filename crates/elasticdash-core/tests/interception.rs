//! Interceptor behaviour end to end through the runner

use async_trait::async_trait;
use elasticdash_core::interceptor::{STREAMED_PLACEHOLDER, install, uninstall};
use elasticdash_core::{
    DashResult, HttpRequest, HttpResponse, HttpTransport, LlmProvider, LlmStepMatcher,
    RunOptions, Session, TransportSlot, expect, runner, spawn_traced,
};
use serde_json::json;
use std::sync::Arc;

/// Fake OpenAI-compatible endpoint
struct FakeOpenAi;

#[async_trait]
impl HttpTransport for FakeOpenAi {
    async fn send(&self, request: HttpRequest) -> DashResult<HttpResponse> {
        let body = request.json().unwrap_or_default();
        if body["stream"].as_bool() == Some(true) {
            return Ok(HttpResponse::new(200, "data: [DONE]\n\n"));
        }
        let completion = format!(
            "echo: {}",
            body["messages"][0]["content"].as_str().unwrap_or_default()
        );
        Ok(HttpResponse::new(
            200,
            json!({"choices": [{"message": {"role": "assistant", "content": completion}}]})
                .to_string(),
        ))
    }
}

impl elasticdash_core::BlockingHttpTransport for FakeOpenAi {
    fn send(&self, _request: HttpRequest) -> DashResult<HttpResponse> {
        Ok(HttpResponse::new(200, "{}"))
    }
}

fn chat(content: &str, stream: bool) -> HttpRequest {
    HttpRequest::post("https://api.openai.com/v1/chat/completions").with_json(&json!({
        "model": "gpt-4o-mini",
        "stream": stream,
        "messages": [{"role": "user", "content": content}]
    }))
}

fn slot() -> Arc<TransportSlot> {
    let fake = Arc::new(FakeOpenAi);
    Arc::new(TransportSlot::new(fake.clone(), fake))
}

#[tokio::test]
async fn intercepted_calls_land_in_the_running_tests_trace() {
    let transports = slot();
    install(&transports);

    let session = Session::new();
    let suite = session.file("chat.ai_test.rs");
    let t = transports.clone();
    suite
        .test("greets", move |ctx| {
            let t = t.clone();
            async move {
                t.http().send(chat("hello", false)).await?;
                // Spawned work keeps the binding
                let background = t.clone();
                spawn_traced(async move { background.http().send(chat("bye", true)).await })
                    .await??;

                expect(&ctx.trace)
                    .to_have_llm_step(
                        LlmStepMatcher::new()
                            .provider(LlmProvider::OpenAI)
                            .output_contains("echo: hello"),
                    )?
                    .to_have_llm_step(
                        LlmStepMatcher::new()
                            .prompt_contains("bye")
                            .output_contains(STREAMED_PLACEHOLDER),
                    )?;
                Ok(())
            }
        })
        .unwrap();

    let summary = runner::run_all(&session, RunOptions::default()).await;
    assert!(summary.is_success(), "{:?}", summary.files[0].tests[0].error);
    assert_eq!(summary.files[0].tests[0].trace.llm_steps().len(), 2);
    uninstall(&transports);
}

#[tokio::test]
async fn uninstalled_transport_is_untouched() {
    let transports = slot();
    install(&transports);
    uninstall(&transports);

    let session = Session::new();
    let t = transports.clone();
    session
        .file("a.rs")
        .test("plain", move |ctx| {
            let t = t.clone();
            async move {
                let response = t.http().send(chat("hi", false)).await?;
                let direct = HttpTransport::send(&FakeOpenAi, chat("hi", false)).await?;
                anyhow::ensure!(response == direct, "response altered");
                anyhow::ensure!(ctx.trace.is_empty(), "recorded while uninstalled");
                Ok(())
            }
        })
        .unwrap();

    let summary = runner::run_all(&session, RunOptions::default()).await;
    assert!(summary.is_success(), "{:?}", summary.files[0].tests[0].error);
}

#[tokio::test]
async fn calls_outside_a_test_are_not_recorded() {
    let transports = slot();
    install(&transports);
    let response = transports.http().send(chat("hi", false)).await.unwrap();
    assert!(response.is_success());
    uninstall(&transports);
}
