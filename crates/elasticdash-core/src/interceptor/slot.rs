//! Registration point for the transports application code sends through

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use super::recording::RecordingTransport;
use super::transport::{
    BlockingHttpTransport, HttpTransport, ReqwestBlockingTransport, ReqwestTransport,
};

struct Originals {
    http: Arc<dyn HttpTransport>,
    blocking: Arc<dyn BlockingHttpTransport>,
}

struct SlotState {
    http: Arc<dyn HttpTransport>,
    blocking: Arc<dyn BlockingHttpTransport>,
    /// Present while the recording wrappers are installed
    originals: Option<Originals>,
}

/// Holds the async and blocking send entry points
///
/// Application code resolves its transport from a slot on every call, so
/// installing the interceptor affects every later request.
pub struct TransportSlot {
    state: RwLock<SlotState>,
}

impl TransportSlot {
    pub fn new(http: Arc<dyn HttpTransport>, blocking: Arc<dyn BlockingHttpTransport>) -> Self {
        Self {
            state: RwLock::new(SlotState {
                http,
                blocking,
                originals: None,
            }),
        }
    }

    /// Slot backed by the reqwest transports
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(ReqwestTransport::default()),
            Arc::new(ReqwestBlockingTransport::new()),
        )
    }

    /// Current async entry point
    pub fn http(&self) -> Arc<dyn HttpTransport> {
        Arc::clone(&self.state.read().http)
    }

    /// Current blocking entry point
    pub fn blocking(&self) -> Arc<dyn BlockingHttpTransport> {
        Arc::clone(&self.state.read().blocking)
    }

    /// Replace the async transport, keeping it wrapped if the interceptor is installed
    pub fn set_http(&self, transport: Arc<dyn HttpTransport>) {
        let mut state = self.state.write();
        match state.originals.as_mut() {
            Some(originals) => {
                originals.http = Arc::clone(&transport);
                state.http = Arc::new(RecordingTransport::new(transport));
            }
            None => state.http = transport,
        }
    }

    /// Replace the blocking transport, keeping it wrapped if the interceptor is installed
    pub fn set_blocking(&self, transport: Arc<dyn BlockingHttpTransport>) {
        let mut state = self.state.write();
        match state.originals.as_mut() {
            Some(originals) => {
                originals.blocking = Arc::clone(&transport);
                state.blocking = Arc::new(RecordingTransport::new(transport));
            }
            None => state.blocking = transport,
        }
    }

    pub fn is_installed(&self) -> bool {
        self.state.read().originals.is_some()
    }

    /// Swap both entry points for recording wrappers.
    ///
    /// Returns `false` if already installed; the wrappers are never stacked.
    pub fn install(&self) -> bool {
        let mut state = self.state.write();
        if state.originals.is_some() {
            return false;
        }
        let http = Arc::clone(&state.http);
        let blocking = Arc::clone(&state.blocking);
        state.http = Arc::new(RecordingTransport::new(Arc::clone(&http)));
        state.blocking = Arc::new(RecordingTransport::new(Arc::clone(&blocking)));
        state.originals = Some(Originals { http, blocking });
        debug!("Recording transports installed");
        true
    }

    /// Restore the transports that were active before [`install`](Self::install).
    ///
    /// Returns `false` (and changes nothing) when not installed.
    pub fn uninstall(&self) -> bool {
        let mut state = self.state.write();
        let Some(originals) = state.originals.take() else {
            return false;
        };
        state.http = originals.http;
        state.blocking = originals.blocking;
        debug!("Recording transports removed");
        true
    }
}

impl Default for TransportSlot {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for TransportSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportSlot")
            .field("installed", &self.is_installed())
            .finish()
    }
}

/// Install recording wrappers on `slot`
pub fn install(slot: &TransportSlot) -> bool {
    slot.install()
}

/// Remove recording wrappers from `slot`
pub fn uninstall(slot: &TransportSlot) -> bool {
    slot.uninstall()
}

static GLOBAL_TRANSPORTS: Lazy<TransportSlot> = Lazy::new(TransportSlot::with_defaults);

/// The process-wide transport slot
pub fn global_transports() -> &'static TransportSlot {
    &GLOBAL_TRANSPORTS
}

/// Start recording LLM calls made through [`global_transports`]
pub fn install_ai_interceptor() -> bool {
    let installed = GLOBAL_TRANSPORTS.install();
    if installed {
        info!("AI interceptor installed");
    }
    installed
}

/// Stop recording LLM calls made through [`global_transports`]
pub fn uninstall_ai_interceptor() -> bool {
    let removed = GLOBAL_TRANSPORTS.uninstall();
    if removed {
        info!("AI interceptor uninstalled");
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashResult;
    use crate::interceptor::transport::{HttpRequest, HttpResponse};
    use crate::trace::{Trace, with_trace};
    use async_trait::async_trait;
    use serde_json::json;

    struct StaticTransport;

    #[async_trait]
    impl HttpTransport for StaticTransport {
        async fn send(&self, _request: HttpRequest) -> DashResult<HttpResponse> {
            Ok(HttpResponse::new(
                200,
                json!({"choices": [{"message": {"content": "pong"}}]}).to_string(),
            ))
        }
    }

    impl BlockingHttpTransport for StaticTransport {
        fn send(&self, _request: HttpRequest) -> DashResult<HttpResponse> {
            Ok(HttpResponse::new(200, "{}"))
        }
    }

    fn slot() -> (TransportSlot, Arc<dyn HttpTransport>, Arc<dyn BlockingHttpTransport>) {
        let http: Arc<dyn HttpTransport> = Arc::new(StaticTransport);
        let blocking: Arc<dyn BlockingHttpTransport> = Arc::new(StaticTransport);
        (
            TransportSlot::new(Arc::clone(&http), Arc::clone(&blocking)),
            http,
            blocking,
        )
    }

    fn ping() -> HttpRequest {
        HttpRequest::post("https://api.openai.com/v1/chat/completions").with_json(&json!({
            "model": "gpt-4o-mini",
            "messages": [{"role": "user", "content": "ping"}]
        }))
    }

    #[test]
    fn test_install_is_idempotent() {
        let (slot, http, _) = slot();
        assert!(install(&slot));
        let wrapped = slot.http();
        assert!(!install(&slot));
        assert!(Arc::ptr_eq(&wrapped, &slot.http()));
        assert!(!Arc::ptr_eq(&wrapped, &http));
    }

    #[test]
    fn test_uninstall_restores_originals() {
        let (slot, http, blocking) = slot();
        assert!(!uninstall(&slot));
        install(&slot);
        assert!(uninstall(&slot));
        assert!(Arc::ptr_eq(&slot.http(), &http));
        assert!(Arc::ptr_eq(&slot.blocking(), &blocking));
        assert!(!slot.is_installed());
    }

    #[tokio::test]
    async fn test_recording_only_while_installed() {
        let (slot, _, _) = slot();
        let trace = Trace::new();

        with_trace(trace.clone(), async {
            slot.http().send(ping()).await.unwrap();
            install(&slot);
            let response = slot.http().send(ping()).await.unwrap();
            assert_eq!(response.status, 200);
            uninstall(&slot);
            slot.http().send(ping()).await.unwrap();
        })
        .await;

        assert_eq!(trace.llm_steps().len(), 1);
        assert_eq!(trace.llm_steps()[0].completion.as_deref(), Some("pong"));
    }

    #[tokio::test]
    async fn test_set_http_while_installed_stays_wrapped() {
        let (slot, _, _) = slot();
        install(&slot);
        let replacement: Arc<dyn HttpTransport> = Arc::new(StaticTransport);
        slot.set_http(Arc::clone(&replacement));

        let trace = Trace::new();
        with_trace(trace.clone(), async {
            slot.http().send(ping()).await.unwrap();
        })
        .await;
        assert_eq!(trace.len(), 1);

        uninstall(&slot);
        assert!(Arc::ptr_eq(&slot.http(), &replacement));
    }
}
