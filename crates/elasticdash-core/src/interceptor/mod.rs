//! Automatic recording of LLM traffic
//!
//! Application code sends HTTP requests through an [`HttpTransport`] or
//! [`BlockingHttpTransport`] resolved from a [`TransportSlot`]. Installing the
//! interceptor swaps those entry points for [`RecordingTransport`] wrappers that
//! append an LLM step to the trace bound to the calling task whenever the
//! request targets a known provider (OpenAI, Gemini, Grok).

pub mod providers;
pub mod recording;
pub mod slot;
pub mod transport;

pub use providers::{STREAMED_PLACEHOLDER, detect_provider, extract_llm_step};
pub use recording::RecordingTransport;
pub use slot::{
    TransportSlot, global_transports, install, install_ai_interceptor, uninstall,
    uninstall_ai_interceptor,
};
pub use transport::{
    BlockingHttpTransport, HttpRequest, HttpResponse, HttpTransport, ReqwestBlockingTransport,
    ReqwestTransport,
};
