//! Communication channels (WhatsApp Cloud API).
//!
//! Inbound webhook payloads are reduced to a single [`TextMessage`] (or a [`SkipReason`]);
//! replies go out through a [`ChannelHandle`].

mod handle;
mod inbound;
mod whatsapp;

pub use handle::{ChannelError, ChannelHandle};
pub use inbound::{SkipReason, TextMessage};
pub use whatsapp::{
    extract_text_message, parse_delivery, ChangeValue, TextContent, WebhookChange, WebhookEntry,
    WebhookMessage, WebhookPayload, WhatsAppChannel, DEFAULT_SEND_TIMEOUT, MAX_MESSAGE_LENGTH,
    WHATSAPP_OBJECT,
};
