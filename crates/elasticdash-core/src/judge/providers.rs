//! Judge provider table

use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;

use crate::error::DashError;
use crate::interceptor::HttpRequest;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const JUDGE_MAX_TOKENS: u32 = 256;

/// LLM providers that can act as a judge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JudgeProvider {
    OpenAI,
    Anthropic,
    Gemini,
    Grok,
}

impl JudgeProvider {
    pub fn name(&self) -> &'static str {
        match self {
            JudgeProvider::OpenAI => "openai",
            JudgeProvider::Anthropic => "anthropic",
            JudgeProvider::Gemini => "gemini",
            JudgeProvider::Grok => "grok",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            JudgeProvider::OpenAI => "gpt-4o-mini",
            JudgeProvider::Anthropic => "claude-3-5-haiku-latest",
            JudgeProvider::Gemini => "gemini-1.5-flash",
            JudgeProvider::Grok => "grok-2-latest",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            JudgeProvider::OpenAI => "https://api.openai.com/v1",
            JudgeProvider::Anthropic => "https://api.anthropic.com",
            JudgeProvider::Gemini => "https://generativelanguage.googleapis.com",
            JudgeProvider::Grok => "https://api.x.ai/v1",
        }
    }

    /// Environment variables searched for the API key, in order
    pub fn env_vars(&self) -> &'static [&'static str] {
        match self {
            JudgeProvider::OpenAI => &["OPENAI_API_KEY"],
            JudgeProvider::Anthropic => &["ANTHROPIC_API_KEY", "CLAUDE_API_KEY"],
            JudgeProvider::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
            JudgeProvider::Grok => &["GROK_API_KEY", "XAI_API_KEY"],
        }
    }

    /// First non-empty key among [`env_vars`](Self::env_vars) as seen by `lookup`
    pub fn api_key_from(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        self.env_vars()
            .iter()
            .filter_map(|var| lookup(var))
            .find(|value| !value.trim().is_empty())
    }

    /// Build a single-turn request with a system instruction and a user message
    pub fn build_request(
        &self,
        base_url: &str,
        model: &str,
        api_key: &str,
        system: &str,
        user: &str,
    ) -> HttpRequest {
        let base_url = base_url.trim_end_matches('/');
        match self {
            JudgeProvider::OpenAI | JudgeProvider::Grok => {
                let body = json!({
                    "model": model,
                    "messages": [
                        {"role": "system", "content": system},
                        {"role": "user", "content": user},
                    ],
                    "temperature": 0,
                });
                HttpRequest::post(format!("{}/chat/completions", base_url))
                    .with_header("Authorization", format!("Bearer {}", api_key))
                    .with_json(&body)
            }
            JudgeProvider::Anthropic => {
                let body = json!({
                    "model": model,
                    "system": system,
                    "messages": [{"role": "user", "content": user}],
                    "max_tokens": JUDGE_MAX_TOKENS,
                    "temperature": 0,
                });
                HttpRequest::post(format!("{}/v1/messages", base_url))
                    .with_header("x-api-key", api_key)
                    .with_header("anthropic-version", ANTHROPIC_VERSION)
                    .with_json(&body)
            }
            JudgeProvider::Gemini => {
                let body = json!({
                    "systemInstruction": {"parts": [{"text": system}]},
                    "contents": [{"role": "user", "parts": [{"text": user}]}],
                    "generationConfig": {"temperature": 0},
                });
                HttpRequest::post(format!(
                    "{}/v1beta/models/{}:generateContent",
                    base_url, model
                ))
                .with_header("x-goog-api-key", api_key)
                .with_json(&body)
            }
        }
    }

    /// Pull the reply text out of a provider response
    pub fn extract_text(&self, response: &Value) -> Option<String> {
        match self {
            JudgeProvider::OpenAI | JudgeProvider::Grok => response
                .get("choices")?
                .get(0)?
                .get("message")?
                .get("content")?
                .as_str()
                .map(str::to_string),
            JudgeProvider::Anthropic => join_text_parts(response.get("content")?),
            JudgeProvider::Gemini => join_text_parts(
                response
                    .get("candidates")?
                    .get(0)?
                    .get("content")?
                    .get("parts")?,
            ),
        }
    }
}

fn join_text_parts(parts: &Value) -> Option<String> {
    let texts: Vec<&str> = parts
        .as_array()?
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    (!texts.is_empty()).then(|| texts.concat())
}

impl FromStr for JudgeProvider {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(JudgeProvider::OpenAI),
            "anthropic" | "claude" => Ok(JudgeProvider::Anthropic),
            "gemini" | "google" => Ok(JudgeProvider::Gemini),
            "grok" | "xai" => Ok(JudgeProvider::Grok),
            other => Err(DashError::config(format!(
                "Unknown judge provider '{}' (expected openai, anthropic, gemini or grok)",
                other
            ))),
        }
    }
}

impl fmt::Display for JudgeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!("Claude".parse::<JudgeProvider>().unwrap(), JudgeProvider::Anthropic);
        assert_eq!("google".parse::<JudgeProvider>().unwrap(), JudgeProvider::Gemini);
        assert_eq!("xai".parse::<JudgeProvider>().unwrap(), JudgeProvider::Grok);
        assert!("mistral".parse::<JudgeProvider>().is_err());
    }

    #[test]
    fn test_openai_request_shape() {
        let request = JudgeProvider::OpenAI.build_request(
            "https://proxy.local/v1/",
            "gpt-4o-mini",
            "sk-test",
            "system text",
            "user text",
        );
        assert_eq!(request.url, "https://proxy.local/v1/chat/completions");
        assert_eq!(request.header("authorization"), Some("Bearer sk-test"));
        let body = request.json().unwrap();
        assert_eq!(body["messages"][1]["content"], "user text");
    }

    #[test]
    fn test_gemini_request_shape() {
        let provider = JudgeProvider::Gemini;
        let request = provider.build_request(
            provider.default_base_url(),
            "gemini-1.5-flash",
            "g-key",
            "sys",
            "usr",
        );
        assert!(request.url.ends_with("/v1beta/models/gemini-1.5-flash:generateContent"));
        assert_eq!(request.header("x-goog-api-key"), Some("g-key"));
        assert!(!request.url.contains("g-key"));
    }

    #[test]
    fn test_extract_text_per_provider() {
        let openai = json!({"choices": [{"message": {"content": "yes"}}]});
        assert_eq!(JudgeProvider::OpenAI.extract_text(&openai).as_deref(), Some("yes"));

        let anthropic = json!({"content": [{"type": "text", "text": "0.8"}]});
        assert_eq!(JudgeProvider::Anthropic.extract_text(&anthropic).as_deref(), Some("0.8"));

        let gemini = json!({"candidates": [{"content": {"parts": [{"text": "no"}]}}]});
        assert_eq!(JudgeProvider::Gemini.extract_text(&gemini).as_deref(), Some("no"));

        assert!(JudgeProvider::Grok.extract_text(&json!({})).is_none());
    }
}
