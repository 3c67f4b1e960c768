//! LINE webhook payload types

use serde::Deserialize;
use serde_json::Value;

use crate::channels::{EventKind, InboundEvent, MessageKind};

/// Webhook request body
///
/// Built from any JSON value: a missing, null, or non-array `events` is an
/// empty delivery, and an event that does not fit [`LineEvent`] becomes a
/// default (skipped) event instead of failing its neighbours.
#[derive(Debug, Default)]
pub struct WebhookBody {
    /// Bot user ID the events were sent to
    pub destination: Option<String>,
    /// Events in this delivery; LINE sends an empty list to verify the URL
    pub events: Vec<LineEvent>,
}

impl From<Value> for WebhookBody {
    fn from(value: Value) -> Self {
        let destination = value
            .get("destination")
            .and_then(Value::as_str)
            .map(str::to_string);

        let events = match value.get("events") {
            Some(Value::Array(events)) => events
                .iter()
                .map(|event| LineEvent::deserialize(event).unwrap_or_default())
                .collect(),
            _ => Vec::new(),
        };

        Self {
            destination,
            events,
        }
    }
}

/// One webhook event
///
/// Every field is optional so an unfamiliar but well-typed event shape still
/// deserializes; see [`WebhookBody`] for mistyped ones.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineEvent {
    /// Event type (`message`, `follow`, `postback`, ...)
    #[serde(rename = "type", default)]
    pub event_type: String,
    /// Reply token, present on replyable events
    #[serde(default)]
    pub reply_token: Option<String>,
    /// Webhook event ID
    #[serde(default)]
    pub webhook_event_id: Option<String>,
    /// Message payload for `message` events
    #[serde(default)]
    pub message: Option<LineMessage>,
}

/// Message payload
#[derive(Debug, Default, Deserialize)]
pub struct LineMessage {
    /// Message ID
    #[serde(default)]
    pub id: Option<String>,
    /// Message type (`text`, `image`, `sticker`, ...)
    #[serde(rename = "type", default)]
    pub message_type: String,
    /// Text for `text` messages
    #[serde(default)]
    pub text: Option<String>,
}

impl From<LineEvent> for InboundEvent {
    fn from(event: LineEvent) -> Self {
        let kind = if event.event_type == "message" {
            EventKind::Message
        } else {
            EventKind::Other
        };

        let (message_kind, text) = match event.message {
            Some(m) if m.message_type == "text" => (MessageKind::Text, m.text.unwrap_or_default()),
            _ => (MessageKind::Other, String::new()),
        };

        Self {
            kind,
            message_kind,
            text,
            reply_token: event.reply_token,
        }
    }
}
