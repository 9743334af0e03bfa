//! Deterministic trace assertions

use tracing::debug;

use super::config::{
    CustomStepMatcher, LlmStepMatcher, Occurrences, PromptMatcher, ToolCallMatcher,
};
use super::text::{contains_ci, map_text, opt_contains, preview, serialized_text};
use crate::error::{DashError, DashResult};
use crate::trace::{StepKind, Trace};

/// Assertions bound to one trace, created with [`expect`](super::expect)
#[derive(Debug, Clone)]
pub struct Expectation {
    pub(crate) trace: Trace,
}

impl Expectation {
    pub fn new(trace: &Trace) -> Self {
        Self {
            trace: trace.clone(),
        }
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub(crate) fn ensure_open(&self) -> DashResult<()> {
        if self.trace.is_sealed() {
            return Err(DashError::TraceClosed);
        }
        Ok(())
    }

    /// Count LLM steps satisfying every supplied predicate
    pub fn to_have_llm_step(&self, matcher: LlmStepMatcher) -> DashResult<&Self> {
        self.ensure_open()?;
        let steps = self.trace.llm_steps();
        let count = steps
            .iter()
            .filter(|step| {
                matcher.model.as_ref().is_none_or(|m| &step.model == m)
                    && matcher.provider.is_none_or(|p| step.provider == Some(p))
                    && matcher.contains.as_deref().is_none_or(|needle| {
                        opt_contains(step.prompt.as_deref(), needle)
                            || opt_contains(step.completion.as_deref(), needle)
                    })
                    && matcher
                        .prompt_contains
                        .as_deref()
                        .is_none_or(|needle| opt_contains(step.prompt.as_deref(), needle))
                    && matcher
                        .output_contains
                        .as_deref()
                        .is_none_or(|needle| opt_contains(step.completion.as_deref(), needle))
            })
            .count();

        let mut described = Vec::new();
        if let Some(model) = &matcher.model {
            described.push(format!("with model {:?}", model));
        }
        if let Some(provider) = matcher.provider {
            described.push(format!("from provider {}", provider));
        }
        if let Some(needle) = &matcher.contains {
            described.push(format!("containing {:?}", needle));
        }
        if let Some(needle) = &matcher.prompt_contains {
            described.push(format!("with prompt containing {:?}", needle));
        }
        if let Some(needle) = &matcher.output_contains {
            described.push(format!("with output containing {:?}", needle));
        }

        check_count(
            "LLM step",
            &described,
            matcher.occurrences(),
            count,
            steps.len(),
        )?;
        Ok(self)
    }

    /// Count calls of the named tool
    pub fn to_call_tool(&self, matcher: impl Into<ToolCallMatcher>) -> DashResult<&Self> {
        self.ensure_open()?;
        let matcher = matcher.into();
        let calls = self.trace.tool_calls();
        let count = calls
            .iter()
            .filter(|call| call.name == matcher.name)
            .filter(|call| {
                matcher.args_contains.as_deref().is_none_or(|needle| {
                    opt_contains(map_text(&call.args).as_deref(), needle)
                })
            })
            .count();

        let mut described = vec![format!("{:?}", matcher.name)];
        if let Some(needle) = &matcher.args_contains {
            described.push(format!("with arguments containing {:?}", needle));
        }
        check_count(
            "tool call",
            &described,
            matcher.occurrences(),
            count,
            calls.len(),
        )?;
        Ok(self)
    }

    /// Count custom steps satisfying every supplied predicate
    pub fn to_have_custom_step(&self, matcher: CustomStepMatcher) -> DashResult<&Self> {
        self.ensure_open()?;
        let steps = self.trace.custom_steps();
        let kind = matcher.kind.as_deref().map(StepKind::from);
        let count = steps
            .iter()
            .filter(|step| {
                kind.as_ref().is_none_or(|k| &step.kind == k)
                    && matcher
                        .name
                        .as_ref()
                        .is_none_or(|n| step.name.as_ref() == Some(n))
                    && matcher.tag.as_ref().is_none_or(|t| step.tags.contains(t))
                    && matcher.contains.as_deref().is_none_or(|needle| {
                        opt_contains(serialized_text(&step.payload).as_deref(), needle)
                    })
                    && matcher.result_contains.as_deref().is_none_or(|needle| {
                        opt_contains(serialized_text(&step.result).as_deref(), needle)
                    })
                    && matcher.metadata_contains.as_deref().is_none_or(|needle| {
                        opt_contains(map_text(&step.metadata).as_deref(), needle)
                    })
            })
            .count();

        let mut described = Vec::new();
        if let Some(kind) = &matcher.kind {
            described.push(format!("of kind {:?}", kind));
        }
        if let Some(name) = &matcher.name {
            described.push(format!("named {:?}", name));
        }
        if let Some(tag) = &matcher.tag {
            described.push(format!("tagged {:?}", tag));
        }
        if let Some(needle) = &matcher.contains {
            described.push(format!("with payload containing {:?}", needle));
        }
        if let Some(needle) = &matcher.result_contains {
            described.push(format!("with result containing {:?}", needle));
        }
        if let Some(needle) = &matcher.metadata_contains {
            described.push(format!("with metadata containing {:?}", needle));
        }

        check_count(
            "custom step",
            &described,
            matcher.occurrences(),
            count,
            steps.len(),
        )?;
        Ok(self)
    }

    /// Constrain the prompts sent to LLMs
    ///
    /// Prompts are selected by `filter_contains` in trace order. With `nth`
    /// only that selected prompt is checked; otherwise every selected prompt
    /// must satisfy the requirements and the selection size must lie within
    /// `min_times`/`max_times`.
    pub fn to_have_prompt_where(&self, matcher: PromptMatcher) -> DashResult<&Self> {
        self.ensure_open()?;
        let prompts: Vec<String> = self
            .trace
            .llm_steps()
            .into_iter()
            .filter_map(|step| step.prompt)
            .filter(|prompt| {
                matcher
                    .filter_contains
                    .as_deref()
                    .is_none_or(|needle| contains_ci(prompt, needle))
            })
            .collect();
        let selection = match &matcher.filter_contains {
            Some(needle) => format!("prompts containing {:?}", needle),
            None => "prompts".to_string(),
        };
        debug!(selected = prompts.len(), %selection, "Checking prompts");

        if let Some(nth) = matcher.nth {
            if nth == 0 || nth > prompts.len() {
                return Err(DashError::index_out_of_range(nth, prompts.len(), selection));
            }
            check_prompt(&matcher, nth, &prompts[nth - 1])?;
            return Ok(self);
        }

        let occurrences = matcher.occurrences();
        if !occurrences.accepts(prompts.len()) {
            return Err(DashError::assertion(format!(
                "Expected {} {}; observed {}",
                selection,
                occurrences,
                prompts.len()
            )));
        }
        for (index, prompt) in prompts.iter().enumerate() {
            check_prompt(&matcher, index + 1, prompt)?;
        }
        Ok(self)
    }
}

fn check_prompt(matcher: &PromptMatcher, position: usize, prompt: &str) -> DashResult<()> {
    if let Some(needle) = &matcher.require_contains {
        if !contains_ci(prompt, needle) {
            return Err(DashError::assertion_with_context(
                format!("Prompt #{} is missing {:?}", position, needle),
                format!("prompt: {:?}", preview(prompt)),
            ));
        }
    }
    if let Some(needle) = &matcher.require_not_contains {
        if contains_ci(prompt, needle) {
            return Err(DashError::assertion_with_context(
                format!("Prompt #{} must not contain {:?}", position, needle),
                format!("prompt: {:?}", preview(prompt)),
            ));
        }
    }
    Ok(())
}

fn check_count(
    label: &str,
    described: &[String],
    occurrences: Occurrences,
    count: usize,
    total: usize,
) -> DashResult<()> {
    if occurrences.accepts(count) {
        return Ok(());
    }
    let predicates = if described.is_empty() {
        String::new()
    } else {
        format!(" {}", described.join(", "))
    };
    Err(DashError::assertion(format!(
        "Expected {}{} {}; observed {} ({} {}(s) recorded)",
        label, predicates, occurrences, count, total, label
    )))
}
