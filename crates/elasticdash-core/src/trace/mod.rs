//! Trace recording
//!
//! A [`Trace`] is the ordered record of everything an AI workflow did during one
//! test: LLM calls, tool calls and custom workflow steps. The runner creates one
//! per test and binds it to the running task so application code and the
//! interceptor can reach it through [`get_current_trace`].

pub mod context;
pub mod handle;
pub mod step;

pub use context::{
    clear_current_trace, get_current_trace, set_current_trace, spawn_blocking_traced,
    spawn_traced, with_trace,
};
pub use handle::{TestContext, Trace};
pub use step::{CustomStep, LlmProvider, LlmStep, Step, StepKind, ToolCall};
