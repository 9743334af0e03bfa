//! From trait implementations and user-error classification for DashError

use super::types::DashError;

impl From<reqwest::Error> for DashError {
    fn from(error: reqwest::Error) -> Self {
        let status_code = error.status().map(|s| s.as_u16());
        let url = error.url().map(|u| u.to_string());
        Self::Transport {
            message: error.to_string(),
            url,
            status_code,
        }
    }
}

impl From<serde_json::Error> for DashError {
    fn from(error: serde_json::Error) -> Self {
        Self::config(format!("JSON error: {}", error))
    }
}

/// Recover a structured [`DashError`] from an error returned by user code.
///
/// Errors produced by matchers keep their kind; anything else is wrapped by
/// `wrap` with the full context chain as message.
pub fn classify_user_error(
    error: anyhow::Error,
    wrap: impl FnOnce(String) -> DashError,
) -> DashError {
    match error.downcast_ref::<DashError>() {
        Some(dash) => dash.clone(),
        None => wrap(format!("{:#}", error)),
    }
}
