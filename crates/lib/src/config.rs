//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.wa-relay/config.json`) and then
//! overridden from the environment. It is read once at startup and shared
//! read-only with every request.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP listener settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// WhatsApp Cloud API credentials and endpoints.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// AI completion backend.
    #[serde(default)]
    pub ai: AiConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 5000). Overridden by PORT env.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    5000
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// WhatsApp Cloud API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppConfig {
    /// Shared secret checked on the GET verification handshake. Overridden by VERIFY_TOKEN env.
    pub verify_token: Option<String>,
    /// Bearer token for the Graph API messages endpoint. Overridden by WHATSAPP_TOKEN env.
    pub access_token: Option<String>,
    /// Business phone number id that replies are sent from. Overridden by WHATSAPP_PHONE_NUMBER_ID env.
    pub phone_number_id: Option<String>,
    /// When set, POST deliveries must carry a valid X-Hub-Signature-256. Overridden by WHATSAPP_APP_SECRET env.
    pub app_secret: Option<String>,
    /// Graph API root (default "https://graph.facebook.com").
    #[serde(default = "default_graph_api_base")]
    pub graph_api_base: String,
    /// Graph API version segment (default "v19.0").
    #[serde(default = "default_graph_api_version")]
    pub graph_api_version: String,
    /// Timeout for one outbound send, in seconds (default 30).
    pub send_timeout_secs: Option<u64>,
}

fn default_graph_api_base() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_graph_api_version() -> String {
    "v19.0".to_string()
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            verify_token: None,
            access_token: None,
            phone_number_id: None,
            app_secret: None,
            graph_api_base: default_graph_api_base(),
            graph_api_version: default_graph_api_version(),
            send_timeout_secs: None,
        }
    }
}

/// Which AI backend answers messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiBackendKind {
    /// POST `{"user_input": ..}` to `ai.url`, read `"response"`.
    #[default]
    Url,
    /// Hosted Gemini generateContent API, authenticated with `ai.apiKey`.
    Gemini,
}

impl AiBackendKind {
    /// Parse a backend name (case-insensitive). Unknown names yield None.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "url" | "http" | "huggingface" | "hf" => Some(Self::Url),
            "gemini" | "google" => Some(Self::Gemini),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Gemini => "gemini",
        }
    }
}

/// AI backend settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiConfig {
    /// "url" (default) or "gemini". Overridden by AI_BACKEND env.
    #[serde(default)]
    pub backend: AiBackendKind,
    /// Completion endpoint for the url backend. Overridden by HF_API_URL env.
    pub url: Option<String>,
    /// API key: required for gemini, optional bearer token for url. Overridden by GEMINI_API_KEY env.
    pub api_key: Option<String>,
    /// Gemini model id (default "gemini-1.5-flash"). Overridden by GEMINI_MODEL env.
    pub model: Option<String>,
    /// Gemini API root (for tests or proxies).
    pub base_url: Option<String>,
    /// Request timeout in seconds. Defaults: 180 for url, 120 for gemini.
    pub timeout_secs: Option<u64>,
}

/// Read an env var, trimmed; empty counts as unset.
fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Trimmed, non-empty view of an optional config string.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Apply environment overrides on top of file config.
pub fn apply_env(config: &mut Config) {
    apply_overrides(config, env_non_empty);
}

/// Apply overrides from any variable source; `lookup` returns trimmed non-empty values.
fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("VERIFY_TOKEN") {
        config.whatsapp.verify_token = Some(v);
    }
    if let Some(v) = lookup("WHATSAPP_TOKEN") {
        config.whatsapp.access_token = Some(v);
    }
    if let Some(v) = lookup("WHATSAPP_PHONE_NUMBER_ID") {
        config.whatsapp.phone_number_id = Some(v);
    }
    if let Some(v) = lookup("WHATSAPP_APP_SECRET") {
        config.whatsapp.app_secret = Some(v);
    }
    if let Some(v) = lookup("HF_API_URL") {
        config.ai.url = Some(v);
    }
    if let Some(v) = lookup("AI_BACKEND") {
        match AiBackendKind::parse(&v) {
            Some(kind) => config.ai.backend = kind,
            None => log::warn!("ignoring unknown AI_BACKEND {:?}", v),
        }
    }
    if let Some(v) = lookup("GEMINI_API_KEY") {
        config.ai.api_key = Some(v);
    }
    if let Some(v) = lookup("GEMINI_MODEL") {
        config.ai.model = Some(v);
    }
    if let Some(v) = lookup("PORT") {
        match v.parse::<u16>() {
            Ok(port) => config.gateway.port = port,
            Err(_) => log::warn!("ignoring invalid PORT {:?}", v),
        }
    }
}

impl Config {
    /// Required settings that are absent, by their env var name. The AI settings
    /// depend on the selected backend.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if non_empty(&self.whatsapp.verify_token).is_none() {
            missing.push("VERIFY_TOKEN");
        }
        if non_empty(&self.whatsapp.access_token).is_none() {
            missing.push("WHATSAPP_TOKEN");
        }
        if non_empty(&self.whatsapp.phone_number_id).is_none() {
            missing.push("WHATSAPP_PHONE_NUMBER_ID");
        }
        match self.ai.backend {
            AiBackendKind::Url => {
                if non_empty(&self.ai.url).is_none() {
                    missing.push("HF_API_URL");
                }
            }
            AiBackendKind::Gemini => {
                if non_empty(&self.ai.api_key).is_none() {
                    missing.push("GEMINI_API_KEY");
                }
            }
        }
        missing
    }
}

/// True if the bind address is loopback (127.0.0.1, ::1, etc.).
pub fn is_loopback_bind(bind: &str) -> bool {
    let b = bind.trim();
    b == "127.0.0.1" || b == "::1" || b == "localhost"
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("RELAY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".wa-relay").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path (or the default path) and apply env overrides.
/// A missing file yields the default config. Returns the config and the path used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let mut config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    apply_env(&mut config);
    Ok((config, path))
}
