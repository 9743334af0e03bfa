//! Judge failures with credentials scrubbed
//!
//! Every message stored in a `JudgeUnavailable` passes through [`scrub`] with
//! the key that was actually sent, so provider echoes of it never reach a report.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::providers::JudgeProvider;
use crate::error::DashError;

const MAX_DETAIL_CHARS: usize = 512;
const MASK: &str = "[REDACTED]";

// Credential carriers used by the judge providers: bearer auth, the
// x-api-key / x-goog-api-key headers and the Gemini `key` query parameter
static CREDENTIAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(bearer\s+|\b(?:x-goog-api-key|x-api-key|api_key|key)"?\s*[:=]\s*"?)[^\s"&,}]+"#,
    )
    .expect("valid credential regex")
});

/// Mask `api_key` and any credential-looking value, then cap the length
pub fn scrub(text: &str, api_key: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return "<empty response body>".to_string();
    }
    let text = if api_key.trim().len() >= 4 {
        text.replace(api_key.trim(), MASK)
    } else {
        text.to_string()
    };
    let masked = CREDENTIAL_RE.replace_all(&text, format!("${{1}}{}", MASK));
    cap(&masked)
}

fn cap(text: &str) -> String {
    match text.char_indices().nth(MAX_DETAIL_CHARS) {
        Some((cut, _)) => format!(
            "{}... ({} more chars)",
            &text[..cut],
            text[cut..].chars().count()
        ),
        None => text.to_string(),
    }
}

/// The request never produced a response
pub(crate) fn transport_failure(
    provider: JudgeProvider,
    error: &DashError,
    api_key: &str,
) -> DashError {
    DashError::judge_unavailable(provider.name(), scrub(&error.to_string(), api_key))
}

/// The provider answered with a non-2xx status
pub(crate) fn status_failure(
    provider: JudgeProvider,
    status: u16,
    body: &str,
    api_key: &str,
) -> DashError {
    DashError::judge_status(
        provider.name(),
        status,
        format!("{} judge returned status {}: {}", provider, status, scrub(body, api_key)),
    )
}

/// The reply was not JSON, or held no text where the provider puts it
pub(crate) fn reply_failure(
    provider: JudgeProvider,
    payload: Option<&Value>,
    api_key: &str,
) -> DashError {
    let detail = match payload {
        Some(payload) => format!(
            "no reply text in judge response: {}",
            scrub(&payload.to_string(), api_key)
        ),
        None => "judge response is not JSON".to_string(),
    };
    DashError::judge_unavailable(provider.name(), detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sent_key_is_masked_wherever_it_appears() {
        let body = r#"{"error": {"message": "Incorrect API key provided: sk-live-abc123"}}"#;
        let scrubbed = scrub(body, "sk-live-abc123");
        assert!(!scrubbed.contains("sk-live-abc123"));
        assert!(scrubbed.contains("Incorrect API key provided: [REDACTED]"));
    }

    #[test]
    fn test_credential_carriers_are_masked() {
        let text = "GET /v1beta/models/m:generateContent?key=AIzaOther failed; \
                    Authorization: Bearer sk-other-token; \"x-api-key\": \"ant-xyz\"";
        let scrubbed = scrub(text, "unrelated-key");
        assert!(!scrubbed.contains("AIzaOther"));
        assert!(!scrubbed.contains("sk-other-token"));
        assert!(!scrubbed.contains("ant-xyz"));
        assert!(scrubbed.contains("generateContent"));
    }

    #[test]
    fn test_long_text_is_capped() {
        let scrubbed = scrub(&"é".repeat(600), "");
        assert!(scrubbed.ends_with("... (88 more chars)"));
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(scrub(" \n", "k"), "<empty response body>");
    }

    #[test]
    fn test_status_failure_keeps_status_and_masks_key() {
        let err = status_failure(
            JudgeProvider::Anthropic,
            429,
            r#"{"error": "rate limited for key ant-secret-1"}"#,
            "ant-secret-1",
        );
        match err {
            DashError::JudgeUnavailable {
                provider,
                message,
                status_code,
            } => {
                assert_eq!(provider, "anthropic");
                assert_eq!(status_code, Some(429));
                assert!(message.starts_with("anthropic judge returned status 429"));
                assert!(!message.contains("ant-secret-1"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_reply_failure_messages() {
        let not_json = reply_failure(JudgeProvider::OpenAI, None, "k");
        assert!(not_json.to_string().contains("not JSON"));

        let payload = json!({"choices": [], "echo": "sk-test-999"});
        let empty = reply_failure(JudgeProvider::OpenAI, Some(&payload), "sk-test-999");
        assert!(!empty.to_string().contains("sk-test-999"));
    }
}
