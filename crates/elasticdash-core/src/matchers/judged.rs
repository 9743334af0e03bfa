//! Assertions decided by an LLM judge

use serde_json::Value;
use tracing::{debug, info};

use super::config::{MetricOptions, MetricTarget};
use super::expectation::Expectation;
use super::text::preview;
use crate::error::{DashError, DashResult};
use crate::judge::{Judge, JudgeOptions};

const SEMANTIC_SYSTEM_PROMPT: &str = "You compare two texts for semantic equivalence. \
Answer with a single word: yes if the actual output conveys the same meaning as the \
expected output, no otherwise.";

const METRIC_SYSTEM_PROMPT: &str = "You grade model output against an evaluation prompt. \
Reply with a single decimal number between 0 and 1 and nothing else, where 1 means the \
text fully satisfies the evaluation prompt.";

impl Expectation {
    /// Ask the judge whether the trace's output means the same as `expected`
    ///
    /// The output is every recorded completion, in trace order.
    pub async fn to_match_semantic_output(
        &self,
        expected: &str,
        options: JudgeOptions,
    ) -> DashResult<()> {
        self.ensure_open()?;
        let completions: Vec<String> = self
            .trace
            .llm_steps()
            .into_iter()
            .filter_map(|step| step.completion)
            .collect();
        if completions.is_empty() {
            return Err(DashError::assertion(format!(
                "Expected output equivalent to {:?} but no LLM completions were recorded",
                preview(expected)
            )));
        }
        let actual = completions.join("\n\n");

        let judge = Judge::resolve(&options)?;
        let user = format!(
            "Expected output:\n{}\n\nActual output:\n{}\n\nDo they have the same meaning?",
            expected, actual
        );
        let reply = judge.ask(SEMANTIC_SYSTEM_PROMPT, &user).await?;
        debug!(verdict = %reply, "Semantic verdict");

        if is_affirmative(&reply) {
            Ok(())
        } else {
            Err(DashError::semantic_mismatch(expected, reply.trim()))
        }
    }

    /// Score one LLM step with the judge and check the score against a condition
    ///
    /// Returns the score on success.
    pub async fn to_evaluate_output_metric(
        &self,
        evaluation_prompt: &str,
        options: MetricOptions,
    ) -> DashResult<f64> {
        self.ensure_open()?;
        let steps = self.trace.llm_steps();
        let step = match options.nth {
            Some(nth) => {
                if nth == 0 || nth > steps.len() {
                    return Err(DashError::index_out_of_range(nth, steps.len(), "LLM steps"));
                }
                &steps[nth - 1]
            }
            None => steps
                .last()
                .ok_or_else(|| DashError::assertion("No LLM steps recorded to evaluate"))?,
        };
        let text = match options.target {
            MetricTarget::Result => step.completion.clone(),
            MetricTarget::Prompt => step.prompt.clone(),
        }
        .unwrap_or_default();

        let judge = Judge::resolve(&options.judge)?;
        let user = format!(
            "Evaluation prompt:\n{}\n\nText to grade:\n{}",
            evaluation_prompt, text
        );
        let reply = judge.ask(METRIC_SYSTEM_PROMPT, &user).await?;
        let score = parse_score(&reply).ok_or_else(|| DashError::unparsable_score(reply.trim()))?;

        if !options.condition.is_satisfied(score) {
            return Err(DashError::metric_condition_failed(
                score,
                options.condition.to_string(),
            ));
        }
        info!(score, condition = %options.condition, "Metric condition satisfied");
        Ok(score)
    }
}

/// A verdict counts as positive only when it starts with "yes"
fn is_affirmative(reply: &str) -> bool {
    reply
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
        .starts_with("yes")
}

/// Parse a score in [0, 1] from a bare decimal or a `{"score": x}` object
fn parse_score(reply: &str) -> Option<f64> {
    let trimmed = reply.trim().trim_end_matches('.');
    let score = match trimmed.parse::<f64>() {
        Ok(score) => score,
        Err(_) => serde_json::from_str::<Value>(trimmed)
            .ok()?
            .get("score")?
            .as_f64()?,
    };
    (score.is_finite() && (0.0..=1.0).contains(&score)).then_some(score)
}
