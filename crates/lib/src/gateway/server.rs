//! Gateway HTTP server: webhook verification, delivery relay, health.

use crate::channels::{self, ChannelHandle, TextMessage, WhatsAppChannel};
use crate::config::{self, non_empty, Config};
use crate::gateway::protocol::VerifyParams;
use crate::gateway::signature::{verify_signature, SIGNATURE_HEADER};
use crate::llm::AiResponder;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Body of every acknowledged POST delivery.
pub const WEBHOOK_ACK: &str = "OK";

/// Body of a rejected verification handshake.
pub const VERIFY_MISMATCH: &str = "Verification token mismatch";

/// Shared, read-only state for all requests.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub responder: Arc<AiResponder>,
    /// Where replies are sent (the WhatsApp channel in production).
    pub notifier: Arc<dyn ChannelHandle>,
}

impl GatewayState {
    /// Build the responder and WhatsApp notifier from config.
    pub fn from_config(config: Config) -> Self {
        let responder = AiResponder::from_config(&config.ai);
        let notifier = WhatsAppChannel::new(&config.whatsapp);
        Self {
            config: Arc::new(config),
            responder: Arc::new(responder),
            notifier: Arc::new(notifier),
        }
    }
}

/// Routes: `GET /` health, `GET|POST /webhook`.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .with_state(state)
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// Missing settings are logged but do not stop startup: an unset AI backend answers with
/// its configuration error and unset WhatsApp credentials make sends fail (logged).
/// Blocks until shutdown (Ctrl+C or SIGTERM).
pub async fn run_gateway(config: Config) -> Result<()> {
    let missing = config.missing_settings();
    if !missing.is_empty() {
        log::warn!("missing settings: {}", missing.join(", "));
    }
    let bind = config.gateway.bind.trim().to_string();
    if !config::is_loopback_bind(&bind) && non_empty(&config.whatsapp.app_secret).is_none() {
        log::warn!(
            "listening on {} without an app secret; webhook deliveries are not signature-checked",
            bind
        );
    }

    let state = GatewayState::from_config(config.clone());
    log::info!(
        "ai backend: {}, whatsapp api: {}/{}",
        state.responder.backend_name(),
        config.whatsapp.graph_api_base,
        config.whatsapp.graph_api_version
    );
    let app = router(state);

    let bind_addr = format!("{}:{}", bind, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// GET / returns a simple health JSON.
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
        "backend": state.responder.backend_name(),
    }))
}

/// GET /webhook — verification handshake. Echoes hub.challenge as plain text on success.
async fn verify_webhook(
    State(state): State<GatewayState>,
    query: Result<Query<VerifyParams>, QueryRejection>,
) -> Response {
    let params = match query {
        Ok(Query(p)) => p,
        Err(e) => {
            log::warn!("webhook verification: bad query: {}", e);
            return (StatusCode::FORBIDDEN, VERIFY_MISMATCH).into_response();
        }
    };
    match params.accept(non_empty(&state.config.whatsapp.verify_token)) {
        Some(challenge) => {
            log::info!("webhook verified");
            (StatusCode::OK, challenge).into_response()
        }
        None => {
            log::warn!("webhook verification failed (mode {:?})", params.mode);
            (StatusCode::FORBIDDEN, VERIFY_MISMATCH).into_response()
        }
    }
}

/// POST /webhook — receives a delivery, relays its message, always acks 200 "OK".
/// When an app secret is configured, deliveries without a valid signature get 401.
async fn receive_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(secret) = non_empty(&state.config.whatsapp.app_secret) {
        let provided = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok());
        if !verify_signature(secret, &body, provided) {
            log::warn!("webhook: rejected delivery with missing or invalid signature");
            return (StatusCode::UNAUTHORIZED, "Invalid signature").into_response();
        }
    }
    handle_delivery(&state, &body).await;
    (StatusCode::OK, WEBHOOK_ACK).into_response()
}

/// Extract the delivery's message and relay it. Skips are logged, never returned.
pub async fn handle_delivery(state: &GatewayState, body: &[u8]) {
    match channels::parse_delivery(body) {
        Ok(msg) => relay_message(state, &msg).await,
        Err(skip) if skip.is_benign() => log::debug!("webhook: nothing to relay: {}", skip),
        Err(skip) => log::warn!("error parsing incoming webhook: {}", skip),
    }
}

/// Ask the AI for a reply, then send it to the sender. The send starts only after the
/// reply is known; a failed send is logged and dropped.
pub async fn relay_message(state: &GatewayState, msg: &TextMessage) {
    log::info!("webhook: message from {}", msg.sender);
    let reply = state.responder.respond(&msg.body).await;
    if let Err(e) = state.notifier.send_message(&msg.sender, &reply).await {
        log::error!(
            "error sending {} message to {}: {}",
            state.notifier.id(),
            msg.sender,
            e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::ChannelError;
    use crate::llm::{AiBackend, AiError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records AI and notify calls in order.
    #[derive(Default)]
    struct Calls(Mutex<Vec<String>>);

    struct StubBackend(Arc<Calls>);

    #[async_trait]
    impl AiBackend for StubBackend {
        fn name(&self) -> &str {
            "stub"
        }

        async fn respond(&self, text: &str) -> Result<String, AiError> {
            self.0 .0.lock().unwrap().push(format!("ai:{}", text));
            Ok("Hi there!".to_string())
        }
    }

    struct StubNotifier(Arc<Calls>);

    #[async_trait]
    impl ChannelHandle for StubNotifier {
        fn id(&self) -> &str {
            "stub"
        }

        async fn send_message(&self, recipient: &str, text: &str) -> Result<(), ChannelError> {
            self.0 .0.lock().unwrap().push(format!("send:{}:{}", recipient, text));
            Err(ChannelError::NotConfigured("stub"))
        }
    }

    fn state(calls: &Arc<Calls>) -> GatewayState {
        GatewayState {
            config: Arc::new(Config::default()),
            responder: Arc::new(AiResponder::new(Arc::new(StubBackend(calls.clone())))),
            notifier: Arc::new(StubNotifier(calls.clone())),
        }
    }

    fn text_delivery(from: &str, body: &str) -> Vec<u8> {
        json!({
            "object": "whatsapp_business_account",
            "entry": [{ "changes": [{ "value": { "messages": [
                { "type": "text", "from": from, "text": { "body": body } }
            ] } }] }]
        })
        .to_string()
        .into_bytes()
    }

    #[tokio::test]
    async fn relays_ai_then_notify_even_when_send_fails() {
        let calls = Arc::new(Calls::default());
        handle_delivery(&state(&calls), &text_delivery("15551234567", "Hello")).await;
        assert_eq!(
            *calls.0.lock().unwrap(),
            vec!["ai:Hello", "send:15551234567:Hi there!"]
        );
    }

    #[tokio::test]
    async fn skipped_delivery_calls_nothing() {
        let calls = Arc::new(Calls::default());
        let s = state(&calls);
        handle_delivery(&s, b"{\"object\":\"page\"}").await;
        handle_delivery(&s, b"garbage").await;
        handle_delivery(&s, b"{\"object\":\"whatsapp_business_account\",\"entry\":[]}").await;
        assert!(calls.0.lock().unwrap().is_empty());
    }
}
