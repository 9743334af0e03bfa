//! A passing flow and two deliberately failing ones
//!
//! ```sh
//! cargo run --example simple_flow -- test
//! ```

use elasticdash::{
    CustomStep, LlmProvider, LlmStep, LlmStepMatcher, PromptMatcher, Session, ToolCall, expect,
    install_ai_interceptor, uninstall_ai_interceptor,
};
use std::process::ExitCode;

fn register(session: &Session) -> anyhow::Result<()> {
    let suite = session.file("demos/simple_flow.ai_test.rs");

    suite
        .before_all(|| async {
            install_ai_interceptor();
            Ok(())
        })
        .after_all(|| async {
            uninstall_ai_interceptor();
            Ok(())
        })
        .before_each(|ctx| async move {
            ctx.trace
                .record_custom_step(CustomStep::new("setup").with_name("before-each"));
            Ok(())
        })
        .after_each(|ctx| async move {
            ctx.trace
                .record_custom_step(CustomStep::new("teardown").with_name("after-each"));
            Ok(())
        });

    suite.test("dummy flow", |ctx| async move {
        ctx.trace.record_llm_step(
            LlmStep::new("gpt-4o-mini")
                .with_provider(LlmProvider::OpenAI)
                .with_prompt("hello")
                .with_completion("world"),
        );
        ctx.trace
            .record_tool_call(ToolCall::new("chargeCard").with_arg("amount", 100));

        expect(&ctx.trace)
            .to_have_llm_step(LlmStepMatcher::new().model("gpt-4o-mini"))?
            .to_call_tool("chargeCard")?;
        Ok(())
    })?;

    suite.test("failing prompt order", |ctx| async move {
        for step in ["step B", "step A"] {
            ctx.trace.record_llm_step(
                LlmStep::new("gpt-4o-mini")
                    .with_prompt(step)
                    .with_completion(format!("done {}", &step[5..])),
            );
        }
        expect(&ctx.trace)
            .to_have_prompt_where(PromptMatcher::new().nth(1).require_contains("step A"))?;
        Ok(())
    })?;

    suite.test("failing missing tool", |ctx| async move {
        ctx.trace.record_llm_step(
            LlmStep::new("gpt-4o-mini")
                .with_prompt("hello")
                .with_completion("world"),
        );
        expect(&ctx.trace).to_call_tool("nonexistentTool")?;
        Ok(())
    })?;

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let session = Session::new();
    if let Err(e) = register(&session) {
        eprintln!("Failed to register tests: {:#}", e);
        return ExitCode::FAILURE;
    }
    elasticdash::run_cli(&session).await
}
