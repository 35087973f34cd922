//! Outbound side of a channel: the seam the webhook handler replies through.

use async_trait::async_trait;

/// Errors from sending a message out through a channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("{0} not configured")]
    NotConfigured(&'static str),
    #[error("send request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("send failed: {status} {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Handle to a channel that can deliver a text message to a recipient.
#[async_trait]
pub trait ChannelHandle: Send + Sync {
    /// Channel id (e.g. "whatsapp").
    fn id(&self) -> &str;
    /// Send a text message to a recipient (e.g. a WhatsApp phone number). Single attempt.
    async fn send_message(&self, recipient: &str, text: &str) -> Result<(), ChannelError>;
}
