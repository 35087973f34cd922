//! AI completion backends and the responder that turns their failures into reply text.
//!
//! A backend takes the user's text and returns the model's answer. Two are supported:
//! a plain URL endpoint (`{"user_input"}` → `{"response"}`) and the hosted Gemini API.

mod endpoint;
mod gemini;
mod responder;

pub use endpoint::UrlBackend;
pub use gemini::{GeminiBackend, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
pub use responder::{
    AiResponder, CONNECTION_FALLBACK, GEMINI_NOT_CONFIGURED, UNUSUAL_RESPONSE_FALLBACK,
    URL_NOT_CONFIGURED,
};

use async_trait::async_trait;

/// Failure of one completion request.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("ai request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("ai api error: {status} {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("unexpected ai response: {0}")]
    MalformedResponse(String),
}

/// A completion service that answers one message.
#[async_trait]
pub trait AiBackend: Send + Sync {
    /// Short name for logs (e.g. "url", "gemini").
    fn name(&self) -> &str;
    /// Send the user's text and return the reply text.
    async fn respond(&self, text: &str) -> Result<String, AiError>;
}
