//! UnifiedError trait implementation for DashError

use super::types::{DashError, UnifiedError};

impl UnifiedError for DashError {
    fn error_code(&self) -> &str {
        match self {
            Self::DuplicateName { .. } => "DASH_DUPLICATE_NAME",
            Self::AssertionFailure { .. } => "DASH_ASSERTION",
            Self::IndexOutOfRange { .. } => "DASH_INDEX_OUT_OF_RANGE",
            Self::MissingCredential { .. } => "DASH_MISSING_CREDENTIAL",
            Self::JudgeUnavailable { .. } => "DASH_JUDGE_UNAVAILABLE",
            Self::SemanticMismatch { .. } => "DASH_SEMANTIC_MISMATCH",
            Self::UnparsableScore { .. } => "DASH_UNPARSABLE_SCORE",
            Self::MetricConditionFailed { .. } => "DASH_METRIC_CONDITION",
            Self::Timeout { .. } => "DASH_TIMEOUT",
            Self::TraceClosed => "DASH_TRACE_CLOSED",
            Self::HookFailure { .. } => "DASH_HOOK_FAILURE",
            Self::BodyFailure { .. } => "DASH_BODY_FAILURE",
            Self::Transport { .. } => "DASH_TRANSPORT",
            Self::Config { .. } => "DASH_CONFIG",
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::JudgeUnavailable { .. } | Self::Transport { .. } | Self::Timeout { .. }
        )
    }

    fn is_assertion(&self) -> bool {
        matches!(
            self,
            Self::AssertionFailure { .. }
                | Self::IndexOutOfRange { .. }
                | Self::SemanticMismatch { .. }
                | Self::MetricConditionFailed { .. }
        )
    }
}
