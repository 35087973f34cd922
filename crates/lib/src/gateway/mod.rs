//! Gateway: HTTP server for the WhatsApp webhook.
//!
//! `GET /webhook` answers the verification handshake; `POST /webhook` relays the first
//! text message of a delivery to the AI backend and sends the reply back. `GET /` is a
//! health check.

mod protocol;
mod server;
mod signature;

pub use protocol::{VerifyParams, SUBSCRIBE_MODE};
pub use server::{
    handle_delivery, relay_message, router, run_gateway, GatewayState, VERIFY_MISMATCH,
    WEBHOOK_ACK,
};
pub use signature::{verify_signature, SIGNATURE_HEADER};
