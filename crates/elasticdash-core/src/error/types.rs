//! Core error types and traits for ElasticDash

use thiserror::Error;

/// Result type alias for ElasticDash operations
pub type DashResult<T> = Result<T, DashError>;

/// Unified error trait implemented by [`DashError`].
///
/// - error_code(): stable code for programmatic handling and JSON reports
/// - is_retryable(): whether running the same operation again may succeed
/// - is_assertion(): whether the error is a verdict about the trace rather than
///   an infrastructure problem
pub trait UnifiedError: std::error::Error + Send + Sync {
    /// Get the error code for programmatic handling
    fn error_code(&self) -> &str;

    /// Check if this error is retryable
    fn is_retryable(&self) -> bool {
        false
    }

    /// Check if this error is a matcher verdict
    fn is_assertion(&self) -> bool {
        false
    }
}

/// Main error type for ElasticDash
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DashError {
    /// A test with the same name is already registered for the file
    #[error("Duplicate test name '{name}' in {file}")]
    DuplicateName { name: String, file: String },

    /// Deterministic matcher mismatch
    #[error("{message}")]
    AssertionFailure {
        message: String,
        context: Option<String>,
    },

    /// A 1-based index pointed past the available elements
    #[error("Index {index} out of range: {available} {subject} available")]
    IndexOutOfRange {
        index: usize,
        available: usize,
        subject: String,
    },

    /// No API key was supplied or found in the environment
    #[error("Missing credential for {provider}: pass api_key or set {env_hint}")]
    MissingCredential { provider: String, env_hint: String },

    /// Network or provider failure during a judged matcher
    #[error("Judge unavailable ({provider}): {message}")]
    JudgeUnavailable {
        provider: String,
        message: String,
        status_code: Option<u16>,
    },

    /// The judge decided the outputs are not equivalent
    #[error("Semantic mismatch: expected output equivalent to {expected:?}, judge answered {verdict:?}")]
    SemanticMismatch { expected: String, verdict: String },

    /// The judge reply is not a decimal in [0, 1]
    #[error("Unparsable score from judge: {reply:?}")]
    UnparsableScore { reply: String },

    /// The judge score does not satisfy the requested condition
    #[error("Metric condition failed: score {score:.3} does not satisfy {condition}")]
    MetricConditionFailed { score: f64, condition: String },

    /// Operation cancelled by an imposed timeout
    #[error("Timed out after {millis} ms")]
    Timeout {
        millis: u64,
        context: Option<String>,
    },

    /// The trace belongs to a test that already finished
    #[error("Trace is closed: the test that recorded it has finished")]
    TraceClosed,

    /// A lifecycle hook returned an error
    #[error("{hook} hook failed: {message}")]
    HookFailure { hook: String, message: String },

    /// The test body returned an error that is not an ElasticDash error
    #[error("{message}")]
    BodyFailure { message: String },

    /// HTTP transport errors
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        url: Option<String>,
        status_code: Option<u16>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },
}
