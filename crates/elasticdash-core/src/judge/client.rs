//! Judge client used by the judged matchers

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::failure::{reply_failure, status_failure, transport_failure};
use super::providers::JudgeProvider;
use crate::error::{DashError, DashResult};
use crate::interceptor::{HttpTransport, ReqwestTransport};

/// Per-call judge settings. Unset fields fall back to [`JudgeDefaults`], then
/// to the provider table.
#[derive(Clone, Default)]
pub struct JudgeOptions {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Transport for judge requests; defaults to a reqwest transport that is
    /// never intercepted
    pub transport: Option<Arc<dyn HttpTransport>>,
    /// Where credential variables are read from; the process environment if unset
    pub credential_lookup: Option<CredentialLookup>,
}

/// Reads a credential variable by name
pub type CredentialLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

impl JudgeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_credential_lookup(
        mut self,
        lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.credential_lookup = Some(Arc::new(lookup));
        self
    }
}

impl fmt::Debug for JudgeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JudgeOptions")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("transport", &self.transport.as_ref().map(|_| "custom"))
            .field(
                "credential_lookup",
                &self.credential_lookup.as_ref().map(|_| "custom"),
            )
            .finish()
    }
}

/// Process-wide judge defaults, usually populated from configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JudgeDefaults {
    pub provider: Option<String>,
    pub model: Option<String>,
}

static JUDGE_DEFAULTS: Lazy<RwLock<JudgeDefaults>> =
    Lazy::new(|| RwLock::new(JudgeDefaults::default()));

static JUDGE_TRANSPORT: Lazy<Arc<dyn HttpTransport>> =
    Lazy::new(|| Arc::new(ReqwestTransport::default()));

pub fn set_judge_defaults(defaults: JudgeDefaults) {
    *JUDGE_DEFAULTS.write() = defaults;
}

pub fn judge_defaults() -> JudgeDefaults {
    JUDGE_DEFAULTS.read().clone()
}

/// A judge with provider, model and credentials resolved
pub struct Judge {
    provider: JudgeProvider,
    model: String,
    api_key: String,
    base_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl Judge {
    /// Resolve options against defaults and the credential lookup.
    ///
    /// Fails with `MissingCredential` before any request is made.
    pub fn resolve(options: &JudgeOptions) -> DashResult<Self> {
        match &options.credential_lookup {
            Some(lookup) => Self::resolve_with(options, |var| lookup(var)),
            None => Self::resolve_with(options, |var| std::env::var(var).ok()),
        }
    }

    /// [`resolve`](Self::resolve) with credential variables read through `lookup`
    pub fn resolve_with(
        options: &JudgeOptions,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> DashResult<Self> {
        let defaults = judge_defaults();
        let provider: JudgeProvider = options
            .provider
            .as_deref()
            .or(defaults.provider.as_deref())
            .unwrap_or("openai")
            .parse()?;

        let api_key = options
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| provider.api_key_from(&lookup))
            .ok_or_else(|| DashError::missing_credential(provider.name(), provider.env_vars()))?;

        let model = options
            .model
            .clone()
            .or(defaults.model)
            .unwrap_or_else(|| provider.default_model().to_string());
        let base_url = options
            .base_url
            .clone()
            .unwrap_or_else(|| provider.default_base_url().to_string());
        let transport = options
            .transport
            .clone()
            .unwrap_or_else(|| Arc::clone(&JUDGE_TRANSPORT));

        Ok(Self {
            provider,
            model,
            api_key,
            base_url,
            transport,
        })
    }

    pub fn provider(&self) -> JudgeProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one system + user exchange and return the reply text
    #[instrument(
        skip(self, system, user),
        fields(provider = %self.provider, model = %self.model),
        level = "debug"
    )]
    pub async fn ask(&self, system: &str, user: &str) -> DashResult<String> {
        let request =
            self.provider
                .build_request(&self.base_url, &self.model, &self.api_key, system, user);
        let provider = self.provider.name();

        let response = self.transport.send(request).await.map_err(|e| {
            warn!(provider, "Judge request failed: {}", e);
            transport_failure(self.provider, &e, &self.api_key)
        })?;

        if !response.is_success() {
            warn!(provider, status = response.status, "Judge returned an error status");
            return Err(status_failure(
                self.provider,
                response.status,
                &response.text(),
                &self.api_key,
            ));
        }

        let payload = response
            .json()
            .ok_or_else(|| reply_failure(self.provider, None, &self.api_key))?;
        let text = self
            .provider
            .extract_text(&payload)
            .ok_or_else(|| reply_failure(self.provider, Some(&payload), &self.api_key))?;
        debug!(provider, reply = %text, "Judge replied");
        Ok(text)
    }
}

impl fmt::Debug for Judge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Judge")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}
