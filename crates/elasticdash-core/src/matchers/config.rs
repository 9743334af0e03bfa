//! Matcher configuration
//!
//! Every field is optional; supplied fields combine with AND. String predicates
//! are case-insensitive substring tests unless noted otherwise.

use std::fmt;

use crate::judge::JudgeOptions;
use crate::trace::LlmProvider;

/// Occurrence bounds shared by the counting matchers
///
/// `times` wins when set; otherwise the count must lie in
/// `min_times.unwrap_or(1)..=max_times.unwrap_or(usize::MAX)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Occurrences {
    pub times: Option<usize>,
    pub min_times: Option<usize>,
    pub max_times: Option<usize>,
}

impl Occurrences {
    pub fn accepts(&self, count: usize) -> bool {
        match self.times {
            Some(times) => count == times,
            None => {
                count >= self.min_times.unwrap_or(1)
                    && count <= self.max_times.unwrap_or(usize::MAX)
            }
        }
    }
}

impl fmt::Display for Occurrences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(times) = self.times {
            return write!(f, "exactly {} time(s)", times);
        }
        let min = self.min_times.unwrap_or(1);
        match self.max_times {
            Some(max) => write!(f, "between {} and {} time(s)", min, max),
            None => write!(f, "at least {} time(s)", min),
        }
    }
}

macro_rules! occurrence_builders {
    () => {
        pub fn times(mut self, times: usize) -> Self {
            self.times = Some(times);
            self
        }

        pub fn min_times(mut self, min_times: usize) -> Self {
            self.min_times = Some(min_times);
            self
        }

        pub fn max_times(mut self, max_times: usize) -> Self {
            self.max_times = Some(max_times);
            self
        }

        pub(crate) fn occurrences(&self) -> Occurrences {
            Occurrences {
                times: self.times,
                min_times: self.min_times,
                max_times: self.max_times,
            }
        }
    };
}

/// Predicates over LLM steps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmStepMatcher {
    /// Exact model name
    pub model: Option<String>,
    /// Found in the prompt or the completion
    pub contains: Option<String>,
    pub prompt_contains: Option<String>,
    pub output_contains: Option<String>,
    pub provider: Option<LlmProvider>,
    pub times: Option<usize>,
    pub min_times: Option<usize>,
    pub max_times: Option<usize>,
}

impl LlmStepMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn contains(mut self, needle: impl Into<String>) -> Self {
        self.contains = Some(needle.into());
        self
    }

    pub fn prompt_contains(mut self, needle: impl Into<String>) -> Self {
        self.prompt_contains = Some(needle.into());
        self
    }

    pub fn output_contains(mut self, needle: impl Into<String>) -> Self {
        self.output_contains = Some(needle.into());
        self
    }

    pub fn provider(mut self, provider: LlmProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    occurrence_builders!();
}

/// Predicates over tool calls
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCallMatcher {
    /// Exact tool name
    pub name: String,
    /// Found in the serialized arguments
    pub args_contains: Option<String>,
    pub times: Option<usize>,
    pub min_times: Option<usize>,
    pub max_times: Option<usize>,
}

impl ToolCallMatcher {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn args_contains(mut self, needle: impl Into<String>) -> Self {
        self.args_contains = Some(needle.into());
        self
    }

    occurrence_builders!();
}

impl From<&str> for ToolCallMatcher {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Predicates over custom steps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomStepMatcher {
    /// Exact kind, e.g. `rag` or a user-defined kind
    pub kind: Option<String>,
    /// Exact step name
    pub name: Option<String>,
    /// Exact tag membership
    pub tag: Option<String>,
    /// Found in the serialized payload
    pub contains: Option<String>,
    pub result_contains: Option<String>,
    pub metadata_contains: Option<String>,
    pub times: Option<usize>,
    pub min_times: Option<usize>,
    pub max_times: Option<usize>,
}

impl CustomStepMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn contains(mut self, needle: impl Into<String>) -> Self {
        self.contains = Some(needle.into());
        self
    }

    pub fn result_contains(mut self, needle: impl Into<String>) -> Self {
        self.result_contains = Some(needle.into());
        self
    }

    pub fn metadata_contains(mut self, needle: impl Into<String>) -> Self {
        self.metadata_contains = Some(needle.into());
        self
    }

    occurrence_builders!();
}

/// Constraints over the prompts sent to LLMs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptMatcher {
    /// Selects which prompts are checked; all prompts when unset
    pub filter_contains: Option<String>,
    pub require_contains: Option<String>,
    pub require_not_contains: Option<String>,
    /// Minimum number of selected prompts, 1 when unset
    pub min_times: Option<usize>,
    pub max_times: Option<usize>,
    /// Check only the nth (1-based) selected prompt
    pub nth: Option<usize>,
}

impl PromptMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter_contains(mut self, needle: impl Into<String>) -> Self {
        self.filter_contains = Some(needle.into());
        self
    }

    pub fn require_contains(mut self, needle: impl Into<String>) -> Self {
        self.require_contains = Some(needle.into());
        self
    }

    pub fn require_not_contains(mut self, needle: impl Into<String>) -> Self {
        self.require_not_contains = Some(needle.into());
        self
    }

    pub fn min_times(mut self, min_times: usize) -> Self {
        self.min_times = Some(min_times);
        self
    }

    pub fn max_times(mut self, max_times: usize) -> Self {
        self.max_times = Some(max_times);
        self
    }

    pub fn nth(mut self, nth: usize) -> Self {
        self.nth = Some(nth);
        self
    }

    pub(crate) fn occurrences(&self) -> Occurrences {
        Occurrences {
            times: None,
            min_times: self.min_times,
            max_times: self.max_times,
        }
    }
}

/// Which side of an LLM step a metric is computed on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MetricTarget {
    /// The completion
    #[default]
    Result,
    Prompt,
}

/// Condition a judge score must satisfy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricCondition {
    GreaterThan(f64),
    LessThan(f64),
    AtLeast(f64),
    AtMost(f64),
    /// Equal within 1e-6
    Equals(f64),
}

impl MetricCondition {
    pub const EQUALS_TOLERANCE: f64 = 1e-6;

    pub fn is_satisfied(&self, score: f64) -> bool {
        match *self {
            MetricCondition::GreaterThan(bound) => score > bound,
            MetricCondition::LessThan(bound) => score < bound,
            MetricCondition::AtLeast(bound) => score >= bound,
            MetricCondition::AtMost(bound) => score <= bound,
            MetricCondition::Equals(expected) => {
                (score - expected).abs() <= Self::EQUALS_TOLERANCE
            }
        }
    }
}

impl Default for MetricCondition {
    fn default() -> Self {
        MetricCondition::AtLeast(0.7)
    }
}

impl fmt::Display for MetricCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricCondition::GreaterThan(v) => write!(f, "greater than {}", v),
            MetricCondition::LessThan(v) => write!(f, "less than {}", v),
            MetricCondition::AtLeast(v) => write!(f, "at least {}", v),
            MetricCondition::AtMost(v) => write!(f, "at most {}", v),
            MetricCondition::Equals(v) => write!(f, "equal to {}", v),
        }
    }
}

/// Options for `to_evaluate_output_metric`
#[derive(Debug, Clone, Default)]
pub struct MetricOptions {
    pub target: MetricTarget,
    /// 1-based LLM step index; the last step when unset
    pub nth: Option<usize>,
    pub condition: MetricCondition,
    pub judge: JudgeOptions,
}

impl MetricOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(mut self, target: MetricTarget) -> Self {
        self.target = target;
        self
    }

    pub fn nth(mut self, nth: usize) -> Self {
        self.nth = Some(nth);
        self
    }

    pub fn condition(mut self, condition: MetricCondition) -> Self {
        self.condition = condition;
        self
    }

    pub fn judge(mut self, judge: JudgeOptions) -> Self {
        self.judge = judge;
        self
    }
}
