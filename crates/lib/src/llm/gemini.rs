//! Gemini backend: hosted `generateContent` REST API authenticated with an API key.
//! The reply is the text of the first candidate, like the SDKs' `response.text`.

use crate::llm::{AiBackend, AiError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate; None when there is no text.
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Client for one Gemini model.
#[derive(Clone)]
pub struct GeminiBackend {
    base_url: String,
    model: String,
    api_key: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl GeminiBackend {
    pub fn new(
        api_key: impl Into<String>,
        model: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());
        Self {
            base_url,
            model: model.unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            api_key: api_key.into(),
            timeout: timeout.unwrap_or(DEFAULT_GEMINI_TIMEOUT),
            client: reqwest::Client::new(),
        }
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl AiBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn respond(&self, text: &str) -> Result<String, AiError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text }],
            }],
        };
        let res = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(AiError::Status { status, body });
        }
        let raw = res.text().await?;
        let data: GenerateResponse = serde_json::from_str(&raw)
            .map_err(|e| AiError::MalformedResponse(format!("body is not a generate response: {}", e)))?;
        data.text()
            .ok_or_else(|| AiError::MalformedResponse("no candidate text".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_url_uses_model() {
        let b = GeminiBackend::new("k", None, Some("http://localhost:1/".to_string()), None);
        assert_eq!(
            b.generate_url(),
            "http://localhost:1/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn text_joins_parts_of_first_candidate() {
        let data: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[
                {"content":{"parts":[{"text":"Hel"},{"text":"lo"}],"role":"model"}},
                {"content":{"parts":[{"text":"ignored"}]}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(data.text().as_deref(), Some("Hello"));
    }

    #[test]
    fn blocked_prompt_has_no_text() {
        let data: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert!(data.text().is_none());
        let data: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(data.text().is_none());
    }
}
