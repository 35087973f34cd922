//! Relay core library: configuration, WhatsApp channel, AI backends, and the webhook
//! gateway used by the `wa-relay` CLI.

pub mod channels;
pub mod config;
pub mod gateway;
pub mod llm;
