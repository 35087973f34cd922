//! WhatsApp channel: webhook payload parsing and sendMessage via the Cloud (Graph) API.

use crate::channels::handle::{ChannelError, ChannelHandle};
use crate::channels::inbound::{SkipReason, TextMessage};
use crate::config::{non_empty, WhatsAppConfig};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Top-level `object` of deliveries from a WhatsApp Business Account.
pub const WHATSAPP_OBJECT: &str = "whatsapp_business_account";

/// WhatsApp text message character limit.
pub const MAX_MESSAGE_LENGTH: usize = 4096;

/// Default bound on one outbound send.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

const TRUNCATED_SUFFIX: &str = "...(truncated)";

/// Webhook delivery body. Only the fields the relay reads are modelled; all are optional.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub value: Option<ChangeValue>,
}

/// `changes[].value`. Status callbacks carry `statuses` and no `messages`.
#[derive(Debug, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<WebhookMessage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookMessage {
    #[serde(rename = "type", default)]
    pub msg_type: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub text: Option<TextContent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TextContent {
    #[serde(default)]
    pub body: Option<String>,
}

/// Parse a raw delivery body and extract its message.
pub fn parse_delivery(body: &[u8]) -> Result<TextMessage, SkipReason> {
    let payload: WebhookPayload =
        serde_json::from_slice(body).map_err(|e| SkipReason::Malformed(e.to_string()))?;
    extract_text_message(&payload)
}

/// Extract the first text message of the first change of the first entry.
/// Later messages in the same delivery are not looked at.
pub fn extract_text_message(payload: &WebhookPayload) -> Result<TextMessage, SkipReason> {
    let object = payload.object.as_deref().unwrap_or("");
    if object != WHATSAPP_OBJECT {
        return Err(SkipReason::NotWhatsApp(object.to_string()));
    }
    let entry = payload.entry.first().ok_or(SkipReason::NoEntry)?;
    let change = entry.changes.first().ok_or(SkipReason::NoChange)?;
    let value = change.value.as_ref().ok_or(SkipReason::NoValue)?;
    let message = value.messages.first().ok_or(SkipReason::NoMessages)?;

    let msg_type = message.msg_type.as_deref().unwrap_or("");
    if msg_type != "text" {
        return Err(SkipReason::NotText(msg_type.to_string()));
    }
    let sender = message
        .from
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(SkipReason::MissingSender)?;
    let body = message
        .text
        .as_ref()
        .and_then(|t| t.body.as_deref())
        .filter(|b| !b.trim().is_empty())
        .ok_or(SkipReason::MissingBody)?;

    Ok(TextMessage {
        sender: sender.to_string(),
        body: body.to_string(),
    })
}

/// Cut text to the WhatsApp limit, marking the cut.
fn truncate_message(content: &str) -> String {
    if content.chars().count() <= MAX_MESSAGE_LENGTH {
        content.to_string()
    } else {
        let keep = MAX_MESSAGE_LENGTH - TRUNCATED_SUFFIX.len();
        let prefix: String = content.chars().take(keep).collect();
        format!("{}{}", prefix, TRUNCATED_SUFFIX)
    }
}

/// WhatsApp Cloud API sender: POSTs text messages from the configured business number.
pub struct WhatsAppChannel {
    id: String,
    api_base: String,
    api_version: String,
    phone_number_id: Option<String>,
    access_token: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl WhatsAppChannel {
    pub fn new(config: &WhatsAppConfig) -> Self {
        Self {
            id: "whatsapp".to_string(),
            api_base: config.graph_api_base.trim_end_matches('/').to_string(),
            api_version: config.graph_api_version.trim_matches('/').to_string(),
            phone_number_id: non_empty(&config.phone_number_id).map(str::to_string),
            access_token: non_empty(&config.access_token).map(str::to_string),
            timeout: config
                .send_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SEND_TIMEOUT),
            client: reqwest::Client::new(),
        }
    }

    /// `{base}/{version}/{phone_number_id}/messages`, when the phone number id is known.
    pub fn messages_url(&self) -> Option<String> {
        self.phone_number_id.as_ref().map(|id| {
            format!("{}/{}/{}/messages", self.api_base, self.api_version, id)
        })
    }

    /// Send a text message to a recipient via the messages endpoint.
    pub async fn send_message(&self, to: &str, text: &str) -> Result<(), ChannelError> {
        let token = self
            .access_token
            .as_ref()
            .ok_or(ChannelError::NotConfigured("whatsapp access token"))?;
        let url = self
            .messages_url()
            .ok_or(ChannelError::NotConfigured("whatsapp phone number id"))?;
        let body = serde_json::json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": truncate_message(text) }
        });
        let res = self
            .client
            .post(&url)
            .bearer_auth(token)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ChannelError::Api { status, body });
        }
        log::debug!("whatsapp: message sent to {}", to);
        Ok(())
    }
}

#[async_trait]
impl ChannelHandle for WhatsAppChannel {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send_message(&self, recipient: &str, text: &str) -> Result<(), ChannelError> {
        WhatsAppChannel::send_message(self, recipient, text).await
    }
}
