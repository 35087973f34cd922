//! URL backend: POST `{"user_input": text}` to a hosted completion endpoint, read `{"response": reply}`.

use crate::llm::{AiBackend, AiError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Generative replies can take minutes on cold-started hosted endpoints.
pub const DEFAULT_URL_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    user_input: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    response: Option<serde_json::Value>,
}

/// Client for a single completion URL.
#[derive(Clone)]
pub struct UrlBackend {
    url: String,
    api_key: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl UrlBackend {
    pub fn new(url: impl Into<String>, api_key: Option<String>, timeout: Option<Duration>) -> Self {
        Self {
            url: url.into(),
            api_key,
            timeout: timeout.unwrap_or(DEFAULT_URL_TIMEOUT),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AiBackend for UrlBackend {
    fn name(&self) -> &str {
        "url"
    }

    async fn respond(&self, text: &str) -> Result<String, AiError> {
        let mut req = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&CompletionRequest { user_input: text });
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        let res = req.send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(AiError::Status { status, body });
        }
        let raw = res.text().await?;
        let data: CompletionResponse = serde_json::from_str(&raw)
            .map_err(|e| AiError::MalformedResponse(format!("body is not a JSON object: {}", e)))?;
        match data.response {
            Some(serde_json::Value::String(reply)) if !reply.trim().is_empty() => Ok(reply),
            Some(serde_json::Value::String(_)) => Err(AiError::MalformedResponse(
                "\"response\" is blank".to_string(),
            )),
            Some(other) => Err(AiError::MalformedResponse(format!(
                "\"response\" is not a string: {}",
                other
            ))),
            None => Err(AiError::MalformedResponse(
                "missing \"response\" key".to_string(),
            )),
        }
    }
}
