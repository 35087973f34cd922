//! Inbound message from a channel and the reasons a delivery yields none.

/// A text message extracted from one webhook delivery. Lives for one request only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    /// Platform user id the reply goes back to (WhatsApp: the sender's phone number).
    pub sender: String,
    pub body: String,
}

/// Why a delivery produced no message to answer. Every variant is a silent no-op for the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("payload is not valid JSON for a webhook delivery: {0}")]
    Malformed(String),
    #[error("object type {0:?} is not a whatsapp business account")]
    NotWhatsApp(String),
    #[error("delivery has no entry")]
    NoEntry,
    #[error("entry has no changes")]
    NoChange,
    #[error("change has no value")]
    NoValue,
    #[error("change carries no messages")]
    NoMessages,
    #[error("message type {0:?} is not text")]
    NotText(String),
    #[error("message has no sender")]
    MissingSender,
    #[error("text message has no body")]
    MissingBody,
}

impl SkipReason {
    /// Skips that happen in normal operation (status callbacks, media messages) rather than
    /// from a payload that does not match the documented shape.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            SkipReason::NotWhatsApp(_) | SkipReason::NoMessages | SkipReason::NotText(_)
        )
    }
}
