//! Trace assertions
//!
//! [`expect`] binds an [`Expectation`] to a trace. Deterministic matchers count
//! steps satisfying a configuration struct; judged matchers ask an LLM judge.

pub mod config;
pub mod expectation;
pub mod judged;
mod text;

pub use config::{
    CustomStepMatcher, LlmStepMatcher, MetricCondition, MetricOptions, MetricTarget,
    Occurrences, PromptMatcher, ToolCallMatcher,
};
pub use expectation::Expectation;

use crate::trace::Trace;

/// Start asserting on `trace`
pub fn expect(trace: &Trace) -> Expectation {
    Expectation::new(trace)
}
