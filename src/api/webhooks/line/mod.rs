//! LINE webhook handler

mod process;
pub mod types;

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::Instrument;

pub use self::process::{DEFAULT_FALLBACK_MESSAGE, DispatchReport, EventOutcome, WebhookDispatcher};
use self::types::WebhookBody;
use crate::api::ApiState;
use crate::channels::InboundEvent;
use crate::security::{SIGNATURE_HEADER, validate_signature};

/// LINE webhook state: what is needed to verify and answer deliveries
pub struct LineWebhookState {
    /// Channel secret used to verify `x-line-signature`
    pub channel_secret: SecretString,
    /// Event processor
    pub dispatcher: Arc<WebhookDispatcher>,
}

/// LINE webhook response
#[derive(Serialize)]
pub struct WebhookResponse {
    /// Whether the delivery was accepted
    pub ok: bool,
}

fn respond(status: StatusCode) -> (StatusCode, Json<WebhookResponse>) {
    (
        status,
        Json(WebhookResponse {
            ok: status.is_success(),
        }),
    )
}

/// Handle an incoming LINE webhook delivery
///
/// The signature is checked against the raw body before anything is parsed.
/// Returns 200 immediately and processes the events in a background task;
/// LINE treats slow webhook responses as failures.
#[allow(clippy::unused_async)]
pub async fn handle_webhook(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<WebhookResponse>) {
    let Some(line) = state.line.as_ref() else {
        tracing::error!("LINE webhook called but channel credentials are not configured");
        return respond(StatusCode::INTERNAL_SERVER_ERROR);
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !validate_signature(&body, line.channel_secret.expose_secret(), signature) {
        tracing::warn!("LINE webhook signature mismatch");
        return respond(StatusCode::UNAUTHORIZED);
    }

    let payload = match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(value) => WebhookBody::from(value),
        Err(e) => {
            tracing::warn!(error = %e, "invalid LINE webhook body");
            return respond(StatusCode::BAD_REQUEST);
        }
    };

    let delivery_id = uuid::Uuid::new_v4();
    tracing::debug!(
        delivery_id = %delivery_id,
        destination = payload.destination.as_deref().unwrap_or_default(),
        events = payload.events.len(),
        "received LINE webhook"
    );

    if payload.events.is_empty() {
        return respond(StatusCode::OK);
    }

    let events: Vec<InboundEvent> = payload.events.into_iter().map(Into::into).collect();
    let dispatcher = Arc::clone(&line.dispatcher);
    let span = tracing::info_span!("line_webhook", %delivery_id);

    tokio::spawn(
        async move {
            dispatcher.handle(events).await;
        }
        .instrument(span),
    );

    respond(StatusCode::OK)
}
