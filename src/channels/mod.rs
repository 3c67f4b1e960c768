//! Messaging channel adapters
//!
//! Inbound chat activity is normalized into [`InboundEvent`]; replies go out
//! through a [`ReplySender`].

mod line;

use async_trait::async_trait;

pub use line::{LineChannel, MAX_TEXT_CHARS};

use crate::Result;

/// Kind of inbound chat event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A user message
    Message,
    /// Follow, join, postback, and anything else
    Other,
}

/// Kind of message payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Plain text
    Text,
    /// Image, sticker, audio, location, ...
    Other,
}

/// One unit of inbound chat activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Event kind
    pub kind: EventKind,
    /// Message payload kind; `Other` for non-message events
    pub message_kind: MessageKind,
    /// Message text, empty when absent
    pub text: String,
    /// Single-use token addressing the reply
    pub reply_token: Option<String>,
}

impl InboundEvent {
    /// Create a text message event
    #[must_use]
    pub fn text(text: impl Into<String>, reply_token: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Message,
            message_kind: MessageKind::Text,
            text: text.into(),
            reply_token: Some(reply_token.into()),
        }
    }

    /// Whether this event is a text message that can be answered
    #[must_use]
    pub fn is_text_message(&self) -> bool {
        self.kind == EventKind::Message
            && self.message_kind == MessageKind::Text
            && self.reply_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Chat transport: deliver one reply
#[async_trait]
pub trait ReplySender: Send + Sync {
    /// Get the channel name
    fn name(&self) -> &'static str;

    /// Send `text` as the reply addressed by `reply_token`
    ///
    /// # Errors
    ///
    /// Returns error if delivery fails
    async fn reply(&self, reply_token: &str, text: &str) -> Result<()>;
}
