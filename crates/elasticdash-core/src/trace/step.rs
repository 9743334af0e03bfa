//! Step types recorded into a trace

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Provider that served an LLM call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI (GPT models)
    OpenAI,
    /// Google (Gemini models)
    Gemini,
    /// xAI (Grok models)
    Grok,
    /// Any other provider
    Other,
}

impl LlmProvider {
    /// Provider name as used in reports and matchers
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "openai",
            LlmProvider::Gemini => "gemini",
            LlmProvider::Grok => "grok",
            LlmProvider::Other => "other",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a custom workflow step
///
/// The well-known kinds get their own variant; anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepKind {
    Rag,
    Code,
    Fixed,
    Custom,
    Named(String),
}

impl StepKind {
    pub fn as_str(&self) -> &str {
        match self {
            StepKind::Rag => "rag",
            StepKind::Code => "code",
            StepKind::Fixed => "fixed",
            StepKind::Custom => "custom",
            StepKind::Named(name) => name,
        }
    }
}

impl From<&str> for StepKind {
    fn from(value: &str) -> Self {
        match value {
            "rag" => StepKind::Rag,
            "code" => StepKind::Code,
            "fixed" => StepKind::Fixed,
            "custom" => StepKind::Custom,
            other => StepKind::Named(other.to_string()),
        }
    }
}

impl From<String> for StepKind {
    fn from(value: String) -> Self {
        StepKind::from(value.as_str())
    }
}

impl From<StepKind> for String {
    fn from(kind: StepKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single LLM call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmStep {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<LlmProvider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl LlmStep {
    /// Start describing an LLM call made with `model`
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            provider: None,
            prompt: None,
            completion: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_provider(mut self, provider: LlmProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_completion(mut self, completion: impl Into<String>) -> Self {
        self.completion = Some(completion.into());
        self
    }
}

/// A tool invocation made by the workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub args: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Map::new(),
            timestamp: Utc::now(),
        }
    }

    /// Add a single argument
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// Replace the arguments with the fields of a JSON object.
    /// Non-object values are stored under the `"value"` key.
    pub fn with_args(mut self, args: Value) -> Self {
        self.args = match args {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        self
    }
}

/// A workflow step that is neither an LLM call nor a tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomStep {
    pub kind: StepKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl CustomStep {
    pub fn new(kind: impl Into<StepKind>) -> Self {
        Self {
            kind: kind.into(),
            name: None,
            tags: Vec::new(),
            payload: Value::Null,
            result: Value::Null,
            metadata: Map::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_payload(mut self, payload: impl Into<Value>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn with_result(mut self, result: impl Into<Value>) -> Self {
        self.result = result.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A recorded step; the position in the trace is `seq`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    Llm {
        seq: usize,
        #[serde(flatten)]
        step: LlmStep,
    },
    ToolCall {
        seq: usize,
        #[serde(flatten)]
        call: ToolCall,
    },
    Custom {
        seq: usize,
        #[serde(flatten)]
        step: CustomStep,
    },
}

impl Step {
    /// Position of the step in its trace (0-based)
    pub fn seq(&self) -> usize {
        match self {
            Step::Llm { seq, .. } | Step::ToolCall { seq, .. } | Step::Custom { seq, .. } => *seq,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Step::Llm { step, .. } => step.timestamp,
            Step::ToolCall { call, .. } => call.timestamp,
            Step::Custom { step, .. } => step.timestamp,
        }
    }

    pub fn as_llm(&self) -> Option<&LlmStep> {
        match self {
            Step::Llm { step, .. } => Some(step),
            _ => None,
        }
    }

    pub fn as_tool_call(&self) -> Option<&ToolCall> {
        match self {
            Step::ToolCall { call, .. } => Some(call),
            _ => None,
        }
    }

    pub fn as_custom(&self) -> Option<&CustomStep> {
        match self {
            Step::Custom { step, .. } => Some(step),
            _ => None,
        }
    }
}
