//! Trace handle shared between the runner, application code and the interceptor

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::step::{CustomStep, LlmStep, Step, ToolCall};

#[derive(Default)]
struct TraceState {
    steps: Vec<Step>,
    last_timestamp: Option<DateTime<Utc>>,
    // Under the same lock as `steps` so no append can slip in after sealing
    sealed: bool,
}

impl TraceState {
    /// Timestamps never go backwards inside one trace
    fn stamp(&mut self, proposed: DateTime<Utc>) -> DateTime<Utc> {
        let stamped = match self.last_timestamp {
            Some(last) if proposed < last => last,
            _ => proposed,
        };
        self.last_timestamp = Some(stamped);
        stamped
    }
}

struct TraceInner {
    id: Uuid,
    state: Mutex<TraceState>,
}

/// Append-only record of the steps observed during one test.
///
/// Cloning is cheap and every clone refers to the same trace. Readers always get
/// a snapshot, so iterating the result of [`Trace::all_steps`] is unaffected by
/// steps recorded afterwards.
#[derive(Clone)]
pub struct Trace {
    inner: Arc<TraceInner>,
}

impl Trace {
    /// Create an empty, open trace
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TraceInner {
                id: Uuid::new_v4(),
                state: Mutex::new(TraceState::default()),
            }),
        }
    }

    /// Unique identifier of this trace
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Record an LLM call
    pub fn record_llm_step(&self, mut step: LlmStep) {
        self.append(|state| {
            step.timestamp = state.stamp(Utc::now());
            Step::Llm {
                seq: state.steps.len(),
                step,
            }
        });
    }

    /// Record a tool call
    pub fn record_tool_call(&self, mut call: ToolCall) {
        self.append(|state| {
            call.timestamp = state.stamp(Utc::now());
            Step::ToolCall {
                seq: state.steps.len(),
                call,
            }
        });
    }

    /// Record a custom workflow step
    pub fn record_custom_step(&self, mut step: CustomStep) {
        self.append(|state| {
            step.timestamp = state.stamp(Utc::now());
            Step::Custom {
                seq: state.steps.len(),
                step,
            }
        });
    }

    fn append(&self, build: impl FnOnce(&mut TraceState) -> Step) {
        let mut state = self.inner.state.lock();
        if state.sealed {
            warn!(trace_id = %self.inner.id, "Dropping step recorded after the test finished");
            return;
        }
        let step = build(&mut state);
        debug!(trace_id = %self.inner.id, seq = step.seq(), "Recorded step");
        state.steps.push(step);
    }

    /// Snapshot of every step in recording order
    pub fn all_steps(&self) -> Vec<Step> {
        self.inner.state.lock().steps.clone()
    }

    /// Snapshot of the LLM steps in recording order
    pub fn llm_steps(&self) -> Vec<LlmStep> {
        self.collect(Step::as_llm)
    }

    /// Snapshot of the tool calls in recording order
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.collect(Step::as_tool_call)
    }

    /// Snapshot of the custom steps in recording order
    pub fn custom_steps(&self) -> Vec<CustomStep> {
        self.collect(Step::as_custom)
    }

    fn collect<T: Clone>(&self, pick: impl Fn(&Step) -> Option<&T>) -> Vec<T> {
        self.inner
            .state
            .lock()
            .steps
            .iter()
            .filter_map(|step| pick(step).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the owning test has finished
    pub fn is_sealed(&self) -> bool {
        self.inner.state.lock().sealed
    }

    /// Make the trace read-only. Called by the runner when the test ends.
    pub(crate) fn seal(&self) {
        self.inner.state.lock().sealed = true;
    }

    /// Whether two handles refer to the same trace
    pub fn ptr_eq(&self, other: &Trace) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Serialize the steps as a JSON array
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self.all_steps()).unwrap_or(Value::Array(Vec::new()))
    }
}

impl Default for Trace {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trace")
            .field("id", &self.inner.id)
            .field("steps", &self.len())
            .field("sealed", &self.is_sealed())
            .finish()
    }
}

/// Context handed to test bodies and per-test hooks
#[derive(Debug, Clone)]
pub struct TestContext {
    /// Trace of the running test
    pub trace: Trace,
    /// Name of the running test
    pub test_name: String,
    /// Source file the test was registered from
    pub file: String,
}

impl TestContext {
    pub fn new(trace: Trace, test_name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            trace,
            test_name: test_name.into(),
            file: file.into(),
        }
    }
}
