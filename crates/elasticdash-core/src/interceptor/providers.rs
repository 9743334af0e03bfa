//! Provider detection and LLM step extraction for intercepted traffic

use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use super::transport::{HttpRequest, HttpResponse};
use crate::trace::{LlmProvider, LlmStep};

/// Completion recorded for streaming requests
pub const STREAMED_PLACEHOLDER: &str = "(streamed)";

/// Model recorded when neither the body nor the URL names one
pub const UNKNOWN_MODEL: &str = "unknown";

/// Identify the LLM provider an URL belongs to
///
/// Grok is checked first because its API is OpenAI-compatible and would
/// otherwise be classified as OpenAI.
pub fn detect_provider(url: &str) -> Option<LlmProvider> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
    let path = parsed.path();

    if (host == "api.x.ai" || host.contains("grok")) && path.ends_with("/chat/completions") {
        return Some(LlmProvider::Grok);
    }
    if path.contains(":generateContent") || path.contains(":streamGenerateContent") {
        return Some(LlmProvider::Gemini);
    }
    if path.ends_with("/chat/completions") || path.ends_with("/completions") {
        return Some(LlmProvider::OpenAI);
    }
    None
}

/// Build the LLM step for an intercepted exchange
///
/// Returns `None` for non-LLM URLs and for malformed request or response JSON.
pub fn extract_llm_step(request: &HttpRequest, response: &HttpResponse) -> Option<LlmStep> {
    let provider = detect_provider(&request.url)?;
    let Some(body) = request.json() else {
        debug!(url = %request.url, "Skipping LLM step: request body is not JSON");
        return None;
    };

    let streamed = is_streaming(&request.url, &body);
    // A rejected call is still a call; it just has no completion
    let completion = if !response.is_success() {
        None
    } else if streamed {
        Some(STREAMED_PLACEHOLDER.to_string())
    } else {
        let Some(payload) = response.json() else {
            debug!(url = %request.url, "Skipping LLM step: response body is not JSON");
            return None;
        };
        match provider {
            LlmProvider::Gemini => gemini_completion(&payload),
            _ => chat_completion(&payload),
        }
    };

    let (model, prompt) = match provider {
        LlmProvider::Gemini => (model_from_url(&request.url), gemini_prompt(&body)),
        _ => (
            body.get("model").and_then(Value::as_str).map(str::to_string),
            chat_prompt(&body),
        ),
    };

    let mut step = LlmStep::new(model.unwrap_or_else(|| UNKNOWN_MODEL.to_string()))
        .with_provider(provider);
    if let Some(prompt) = prompt {
        step = step.with_prompt(prompt);
    }
    if let Some(completion) = completion {
        step = step.with_completion(completion);
    }
    Some(step)
}

fn is_streaming(url: &str, body: &Value) -> bool {
    body.get("stream").and_then(Value::as_bool).unwrap_or(false)
        || url.contains(":streamGenerateContent")
}

/// `models/{model}:generateContent` -> `{model}`
fn model_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed
        .path()
        .split('/')
        .skip_while(|part| *part != "models")
        .nth(1)?;
    let model = segment.split(':').next()?;
    (!model.is_empty()).then(|| model.to_string())
}

fn chat_prompt(body: &Value) -> Option<String> {
    let messages = body.get("messages")?.as_array()?;
    let parts: Vec<String> = messages
        .iter()
        .filter(|m| m.get("role").and_then(Value::as_str) == Some("user"))
        .filter_map(|m| message_text(m.get("content")?))
        .filter(|text| !text.is_empty())
        .collect();
    if parts.is_empty() {
        // Legacy completions endpoint
        return body
            .get("prompt")
            .and_then(Value::as_str)
            .map(str::to_string);
    }
    Some(parts.join("\n\n"))
}

/// Content is either a string or a list of typed parts
fn message_text(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => {
            let texts: Vec<&str> = parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect();
            (!texts.is_empty()).then(|| texts.join("\n"))
        }
        _ => None,
    }
}

fn gemini_prompt(body: &Value) -> Option<String> {
    let contents = body.get("contents")?.as_array()?;
    let parts: Vec<String> = contents
        .iter()
        .filter(|c| {
            // Gemini treats a missing role as the user
            c.get("role")
                .and_then(Value::as_str)
                .is_none_or(|role| role == "user")
        })
        .filter_map(|c| message_text(c.get("parts")?))
        .filter(|text| !text.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join("\n\n"))
}

fn chat_completion(payload: &Value) -> Option<String> {
    let choice = payload.get("choices")?.get(0)?;
    choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(message_text)
        .or_else(|| choice.get("text").and_then(Value::as_str).map(str::to_string))
}

fn gemini_completion(payload: &Value) -> Option<String> {
    let parts = payload
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?;
    message_text(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(url: &str, body: Value) -> HttpRequest {
        HttpRequest::post(url).with_json(&body)
    }

    fn response(body: Value) -> HttpResponse {
        HttpResponse::new(200, body.to_string())
    }

    #[test]
    fn test_detect_provider_table() {
        assert_eq!(
            detect_provider("https://api.x.ai/v1/chat/completions"),
            Some(LlmProvider::Grok)
        );
        assert_eq!(
            detect_provider("https://api.openai.com/v1/chat/completions"),
            Some(LlmProvider::OpenAI)
        );
        assert_eq!(
            detect_provider("https://api.openai.com/v1/completions"),
            Some(LlmProvider::OpenAI)
        );
        assert_eq!(
            detect_provider(
                "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent?key=x"
            ),
            Some(LlmProvider::Gemini)
        );
        assert_eq!(detect_provider("https://example.com/api/users"), None);
        assert_eq!(detect_provider("not a url"), None);
    }

    #[test]
    fn test_openai_step() {
        let req = request(
            "https://api.openai.com/v1/chat/completions",
            json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "first"},
                    {"role": "assistant", "content": "ok"},
                    {"role": "user", "content": [{"type": "text", "text": "second"}]}
                ]
            }),
        );
        let resp = response(json!({"choices": [{"message": {"content": "done"}}]}));

        let step = extract_llm_step(&req, &resp).unwrap();
        assert_eq!(step.model, "gpt-4o-mini");
        assert_eq!(step.provider, Some(LlmProvider::OpenAI));
        assert_eq!(step.prompt.as_deref(), Some("first\n\nsecond"));
        assert_eq!(step.completion.as_deref(), Some("done"));
    }

    #[test]
    fn test_gemini_step() {
        let req = request(
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent",
            json!({"contents": [{"role": "user", "parts": [{"text": "hello"}]}]}),
        );
        let resp = response(json!({
            "candidates": [{"content": {"parts": [{"text": "hi there"}]}}]
        }));

        let step = extract_llm_step(&req, &resp).unwrap();
        assert_eq!(step.model, "gemini-1.5-flash");
        assert_eq!(step.provider, Some(LlmProvider::Gemini));
        assert_eq!(step.prompt.as_deref(), Some("hello"));
        assert_eq!(step.completion.as_deref(), Some("hi there"));
    }

    #[test]
    fn test_streamed_placeholder() {
        let req = request(
            "https://api.x.ai/v1/chat/completions",
            json!({
                "model": "grok-2",
                "stream": true,
                "messages": [{"role": "user", "content": "q"}]
            }),
        );
        // Streamed bodies are SSE, not JSON
        let resp = HttpResponse::new(200, "data: {}\n\n");

        let step = extract_llm_step(&req, &resp).unwrap();
        assert_eq!(step.provider, Some(LlmProvider::Grok));
        assert_eq!(step.completion.as_deref(), Some(STREAMED_PLACEHOLDER));

        let gemini = request(
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:streamGenerateContent",
            json!({"contents": []}),
        );
        let step = extract_llm_step(&gemini, &resp).unwrap();
        assert_eq!(step.completion.as_deref(), Some(STREAMED_PLACEHOLDER));
    }

    #[test]
    fn test_malformed_json_yields_no_step() {
        let req =
            HttpRequest::post("https://api.openai.com/v1/chat/completions").with_body("{oops");
        assert!(extract_llm_step(&req, &response(json!({}))).is_none());

        let req = request(
            "https://api.openai.com/v1/chat/completions",
            json!({"model": "gpt-4o"}),
        );
        let resp = HttpResponse::new(200, "<html>");
        assert!(extract_llm_step(&req, &resp).is_none());
    }

    #[test]
    fn test_missing_model_is_unknown() {
        let req = request(
            "http://localhost:8080/v1/chat/completions",
            json!({"messages": []}),
        );
        let step = extract_llm_step(&req, &response(json!({"choices": []}))).unwrap();
        assert_eq!(step.model, UNKNOWN_MODEL);
        assert!(step.prompt.is_none());
        assert!(step.completion.is_none());
    }
}
