//! Responder: one reply string per message, whatever happens upstream.

use crate::config::{non_empty, AiBackendKind, AiConfig};
use crate::llm::{AiBackend, AiError, GeminiBackend, UrlBackend};
use std::sync::Arc;
use std::time::Duration;

pub const URL_NOT_CONFIGURED: &str = "Error: Hugging Face API URL not set.";
pub const GEMINI_NOT_CONFIGURED: &str = "Error: Gemini API key not set.";
pub const CONNECTION_FALLBACK: &str = "Sorry, I'm having trouble connecting to my brain right now.";
pub const UNUSUAL_RESPONSE_FALLBACK: &str = "Sorry, I received an unusual response from my brain.";

/// Turns user text into reply text via the configured backend. Never fails: every error
/// becomes one of the fixed fallback strings.
pub struct AiResponder {
    backend: Option<Arc<dyn AiBackend>>,
    not_configured: &'static str,
}

impl AiResponder {
    pub fn new(backend: Arc<dyn AiBackend>) -> Self {
        Self {
            backend: Some(backend),
            not_configured: URL_NOT_CONFIGURED,
        }
    }

    /// A responder with no backend; every reply is `message`.
    pub fn unconfigured(message: &'static str) -> Self {
        Self {
            backend: None,
            not_configured: message,
        }
    }

    /// Build the backend selected by `ai.backend`, or an unconfigured responder when its
    /// URL / API key is missing.
    pub fn from_config(ai: &AiConfig) -> Self {
        let timeout = ai.timeout_secs.map(Duration::from_secs);
        let api_key = non_empty(&ai.api_key).map(str::to_string);
        match ai.backend {
            AiBackendKind::Url => match non_empty(&ai.url) {
                Some(url) => Self::new(Arc::new(UrlBackend::new(url, api_key, timeout))),
                None => Self::unconfigured(URL_NOT_CONFIGURED),
            },
            AiBackendKind::Gemini => match api_key {
                Some(key) => Self::new(Arc::new(GeminiBackend::new(
                    key,
                    non_empty(&ai.model).map(str::to_string),
                    non_empty(&ai.base_url).map(str::to_string),
                    timeout,
                ))),
                None => Self::unconfigured(GEMINI_NOT_CONFIGURED),
            },
        }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    /// Backend name for logs, or "none".
    pub fn backend_name(&self) -> &str {
        self.backend.as_deref().map(|b| b.name()).unwrap_or("none")
    }

    /// Ask the backend for a reply. Errors are logged and mapped to fallback text.
    pub async fn respond(&self, text: &str) -> String {
        let Some(ref backend) = self.backend else {
            log::warn!("ai backend not configured; replying with configuration error");
            return self.not_configured.to_string();
        };
        match backend.respond(text).await {
            Ok(reply) => reply,
            Err(e) => {
                log::error!("error calling {} ai backend: {}", backend.name(), e);
                fallback_for(&e).to_string()
            }
        }
    }
}

/// Fixed user-facing text for a backend failure.
fn fallback_for(err: &AiError) -> &'static str {
    match err {
        AiError::Network(_) | AiError::Status { .. } => CONNECTION_FALLBACK,
        AiError::MalformedResponse(_) => UNUSUAL_RESPONSE_FALLBACK,
    }
}
