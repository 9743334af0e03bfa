//! Transport decorator that records LLM traffic into the current trace

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::providers::extract_llm_step;
use super::transport::{BlockingHttpTransport, HttpRequest, HttpResponse, HttpTransport};
use crate::error::DashResult;
use crate::trace::{Trace, get_current_trace};

/// Wraps a transport and appends an LLM step for every provider call that got a response
///
/// The inner transport's response is returned untouched. Calls answered with a
/// non-2xx status are recorded without a completion; calls that never got a
/// response are not recorded. Nothing is recorded when no trace is bound to the
/// calling task.
pub struct RecordingTransport<T: ?Sized> {
    inner: Arc<T>,
}

impl<T: ?Sized> RecordingTransport<T> {
    pub fn new(inner: Arc<T>) -> Self {
        Self { inner }
    }

    /// The wrapped transport
    pub fn inner(&self) -> &Arc<T> {
        &self.inner
    }
}

impl<T: ?Sized> Clone for RecordingTransport<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn record_exchange(trace: &Trace, request: &HttpRequest, response: &HttpResponse) {
    if let Some(step) = extract_llm_step(request, response) {
        debug!(
            url = %request.url,
            status = response.status,
            model = %step.model,
            trace_id = %trace.id(),
            "Recording intercepted LLM call"
        );
        trace.record_llm_step(step);
    }
}

#[async_trait]
impl<T> HttpTransport for RecordingTransport<T>
where
    T: HttpTransport + ?Sized,
{
    async fn send(&self, request: HttpRequest) -> DashResult<HttpResponse> {
        let Some(trace) = get_current_trace() else {
            return self.inner.send(request).await;
        };
        let response = self.inner.send(request.clone()).await?;
        record_exchange(&trace, &request, &response);
        Ok(response)
    }
}

impl<T> BlockingHttpTransport for RecordingTransport<T>
where
    T: BlockingHttpTransport + ?Sized,
{
    fn send(&self, request: HttpRequest) -> DashResult<HttpResponse> {
        let Some(trace) = get_current_trace() else {
            return self.inner.send(request);
        };
        let response = self.inner.send(request.clone())?;
        record_exchange(&trace, &request, &response);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashError;
    use crate::trace::{spawn_blocking_traced, with_trace};
    use serde_json::json;

    struct CannedTransport {
        response: HttpResponse,
    }

    #[async_trait]
    impl HttpTransport for CannedTransport {
        async fn send(&self, _request: HttpRequest) -> DashResult<HttpResponse> {
            Ok(self.response.clone())
        }
    }

    impl BlockingHttpTransport for CannedTransport {
        fn send(&self, _request: HttpRequest) -> DashResult<HttpResponse> {
            Ok(self.response.clone())
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl HttpTransport for FailingTransport {
        async fn send(&self, request: HttpRequest) -> DashResult<HttpResponse> {
            Err(DashError::transport_for_url("connection refused", request.url))
        }
    }

    fn chat_request() -> HttpRequest {
        HttpRequest::post("https://api.openai.com/v1/chat/completions").with_json(&json!({
            "model": "gpt-4o-mini",
            "messages": [{"role": "user", "content": "Summarize the ticket"}]
        }))
    }

    fn chat_response() -> HttpResponse {
        HttpResponse::new(
            200,
            json!({"choices": [{"message": {"content": "Ticket summary"}}]}).to_string(),
        )
    }

    #[tokio::test]
    async fn test_records_into_bound_trace() {
        let transport = RecordingTransport::new(Arc::new(CannedTransport {
            response: chat_response(),
        }));
        let trace = Trace::new();

        let response = with_trace(trace.clone(), async {
            HttpTransport::send(&transport, chat_request()).await
        })
        .await
        .unwrap();

        assert_eq!(response, chat_response());
        let steps = trace.llm_steps();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].prompt.as_deref(), Some("Summarize the ticket"));
        assert_eq!(steps[0].completion.as_deref(), Some("Ticket summary"));
    }

    #[tokio::test]
    async fn test_passthrough_without_trace() {
        let transport = RecordingTransport::new(Arc::new(CannedTransport {
            response: chat_response(),
        }));
        let response = HttpTransport::send(&transport, chat_request()).await.unwrap();
        assert_eq!(response, chat_response());
    }

    #[tokio::test]
    async fn test_failed_send_records_nothing() {
        let transport = RecordingTransport::new(Arc::new(FailingTransport));
        let trace = Trace::new();
        let result = with_trace(trace.clone(), transport.send(chat_request())).await;
        assert!(matches!(result, Err(DashError::Transport { .. })));
        assert!(trace.is_empty());
    }

    #[tokio::test]
    async fn test_error_status_recorded_without_completion() {
        let transport = RecordingTransport::new(Arc::new(CannedTransport {
            response: HttpResponse::new(429, r#"{"error":"rate limited"}"#),
        }));
        let trace = Trace::new();
        let response = with_trace(trace.clone(), async {
            HttpTransport::send(&transport, chat_request()).await
        })
        .await
        .unwrap();

        assert_eq!(response.status, 429);
        let steps = trace.llm_steps();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].model, "gpt-4o-mini");
        assert_eq!(steps[0].prompt.as_deref(), Some("Summarize the ticket"));
        assert_eq!(steps[0].completion, None);
    }

    #[tokio::test]
    async fn test_blocking_send_inside_traced_blocking_task() {
        let transport = Arc::new(RecordingTransport::new(Arc::new(CannedTransport {
            response: chat_response(),
        })));
        let trace = Trace::new();

        let worker = Arc::clone(&transport);
        with_trace(trace.clone(), async move {
            spawn_blocking_traced(move || {
                BlockingHttpTransport::send(worker.as_ref(), chat_request())
            })
            .await
            .unwrap()
            .unwrap();
        })
        .await;

        assert_eq!(trace.llm_steps().len(), 1);
    }

    #[tokio::test]
    async fn test_non_llm_url_not_recorded() {
        let transport = RecordingTransport::new(Arc::new(CannedTransport {
            response: HttpResponse::new(200, "{}"),
        }));
        let trace = Trace::new();
        with_trace(trace.clone(), async {
            HttpTransport::send(&transport, HttpRequest::get("https://example.com/users"))
                .await
                .unwrap();
        })
        .await;
        assert!(trace.is_empty());
    }
}
