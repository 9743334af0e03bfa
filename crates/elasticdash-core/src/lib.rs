//! ElasticDash Core Library
//!
//! Trace-based testing for AI workflows: tests run against a [`Trace`] of the
//! LLM calls, tool calls and custom steps a workflow performed, and assert on
//! it with deterministic or LLM-judged matchers.

pub mod error;
pub mod interceptor;
pub mod judge;
pub mod matchers;
pub mod registry;
pub mod runner;
pub mod trace;

// Re-export commonly used types
pub use error::{DashError, DashResult, UnifiedError};
pub use interceptor::{
    BlockingHttpTransport, HttpRequest, HttpResponse, HttpTransport, RecordingTransport,
    TransportSlot, global_transports, install_ai_interceptor, uninstall_ai_interceptor,
};
pub use judge::{JudgeDefaults, JudgeOptions, JudgeProvider, set_judge_defaults};
pub use matchers::{
    CustomStepMatcher, Expectation, LlmStepMatcher, MetricCondition, MetricOptions, MetricTarget,
    PromptMatcher, ToolCallMatcher, expect,
};
pub use registry::{FileSuite, HookKind, Registry, Session};
pub use runner::{
    FileResult, RunObserver, RunOptions, RunSummary, Runner, TestResult, TestStatus,
};
pub use trace::{
    CustomStep, LlmProvider, LlmStep, Step, StepKind, TestContext, ToolCall, Trace,
    clear_current_trace, get_current_trace, set_current_trace, spawn_blocking_traced,
    spawn_traced, with_trace,
};
