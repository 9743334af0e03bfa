//! Constructor methods for DashError

use super::types::DashError;

impl DashError {
    /// Create a duplicate registration error
    pub fn duplicate_name(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self::DuplicateName {
            name: name.into(),
            file: file.into(),
        }
    }

    /// Create a new assertion failure
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailure {
            message: message.into(),
            context: None,
        }
    }

    /// Create an assertion failure with context
    pub fn assertion_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::AssertionFailure {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create an out-of-range error for a 1-based index
    pub fn index_out_of_range(index: usize, available: usize, subject: impl Into<String>) -> Self {
        Self::IndexOutOfRange {
            index,
            available,
            subject: subject.into(),
        }
    }

    /// Create a missing credential error
    pub fn missing_credential(provider: impl Into<String>, env_vars: &[&str]) -> Self {
        Self::MissingCredential {
            provider: provider.into(),
            env_hint: env_vars.join(" or "),
        }
    }

    /// Create a judge availability error
    pub fn judge_unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JudgeUnavailable {
            provider: provider.into(),
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a judge availability error carrying the HTTP status
    pub fn judge_status(
        provider: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::JudgeUnavailable {
            provider: provider.into(),
            message: message.into(),
            status_code: Some(status),
        }
    }

    /// Create a semantic mismatch error
    pub fn semantic_mismatch(expected: impl Into<String>, verdict: impl Into<String>) -> Self {
        Self::SemanticMismatch {
            expected: expected.into(),
            verdict: verdict.into(),
        }
    }

    /// Create an unparsable score error
    pub fn unparsable_score(reply: impl Into<String>) -> Self {
        Self::UnparsableScore {
            reply: reply.into(),
        }
    }

    /// Create a metric condition error
    pub fn metric_condition_failed(score: f64, condition: impl Into<String>) -> Self {
        Self::MetricConditionFailed {
            score,
            condition: condition.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout(millis: u64) -> Self {
        Self::Timeout {
            millis,
            context: None,
        }
    }

    /// Create a timeout error with context
    pub fn timeout_with_context(millis: u64, context: impl Into<String>) -> Self {
        Self::Timeout {
            millis,
            context: Some(context.into()),
        }
    }

    /// Create a hook failure
    pub fn hook_failure(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HookFailure {
            hook: hook.into(),
            message: message.into(),
        }
    }

    /// Create a body failure
    pub fn body_failure(message: impl Into<String>) -> Self {
        Self::BodyFailure {
            message: message.into(),
        }
    }

    /// Create a new transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            url: None,
            status_code: None,
        }
    }

    /// Create a transport error for a URL
    pub fn transport_for_url(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            url: Some(url.into()),
            status_code: None,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }
}
