//! Per-event processing for a webhook delivery (runs after the 200 ack)

use std::sync::Arc;

use futures::future::join_all;

use crate::agent::ConversationRunner;
use crate::channels::{InboundEvent, ReplySender};

/// Reply sent when no answer could be produced
pub const DEFAULT_FALLBACK_MESSAGE: &str = "すみません、エラーで応答できませんでした。";

/// What happened to one event of a delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Not a text message, gated by the trigger prefix, or not replyable
    Skipped,
    /// The model's answer was delivered
    Replied,
    /// Answering failed; the fallback message was delivered instead
    Fallback {
        /// Why the answer could not be delivered
        error: String,
    },
    /// Answering and the fallback both failed; nothing reached the user
    Dropped {
        /// Why the answer could not be delivered
        error: String,
        /// Why the fallback could not be delivered
        fallback_error: String,
    },
}

/// Outcomes for every event of one delivery, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// One entry per inbound event
    pub outcomes: Vec<EventOutcome>,
}

impl DispatchReport {
    /// Number of events that got the model's answer
    #[must_use]
    pub fn replied(&self) -> usize {
        self.count(|o| matches!(o, EventOutcome::Replied))
    }

    /// Number of events that were skipped
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, EventOutcome::Skipped))
    }

    /// Number of events with any failure
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, EventOutcome::Fallback { .. } | EventOutcome::Dropped { .. }))
    }

    fn count(&self, pred: impl Fn(&EventOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Fans a delivery out into independent conversations and replies
pub struct WebhookDispatcher {
    runner: Arc<ConversationRunner>,
    sender: Arc<dyn ReplySender>,
    trigger_prefix: Option<String>,
    fallback_message: String,
}

impl WebhookDispatcher {
    /// Create a dispatcher with the default fallback message and no prefix
    #[must_use]
    pub fn new(runner: Arc<ConversationRunner>, sender: Arc<dyn ReplySender>) -> Self {
        Self {
            runner,
            sender,
            trigger_prefix: None,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }

    /// Only answer messages starting with `prefix`; blank disables gating
    #[must_use]
    pub fn with_trigger_prefix(mut self, prefix: Option<String>) -> Self {
        self.trigger_prefix = prefix.filter(|p| !p.trim().is_empty());
        self
    }

    /// Override the fallback error reply
    #[must_use]
    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    /// Process every event of a delivery concurrently
    ///
    /// Each event is isolated: one event's failure never affects another.
    pub async fn handle(&self, events: Vec<InboundEvent>) -> DispatchReport {
        let outcomes = join_all(events.into_iter().map(|event| self.handle_event(event))).await;

        let report = DispatchReport { outcomes };
        tracing::info!(
            events = report.outcomes.len(),
            replied = report.replied(),
            skipped = report.skipped(),
            failed = report.failed(),
            "webhook delivery processed"
        );
        report
    }

    /// Prompt and reply token for an answerable event, or `None` when skipped
    fn prompt_for<'a>(&self, event: &'a InboundEvent) -> Option<(&'a str, &'a str)> {
        if !event.is_text_message() {
            return None;
        }
        let reply_token = event.reply_token.as_deref()?;

        let text = match &self.trigger_prefix {
            Some(prefix) => event.text.strip_prefix(prefix.as_str())?.trim_start(),
            None => event.text.as_str(),
        };

        (!text.trim().is_empty()).then_some((text, reply_token))
    }

    async fn handle_event(&self, event: InboundEvent) -> EventOutcome {
        let Some((prompt, reply_token)) = self.prompt_for(&event) else {
            return EventOutcome::Skipped;
        };

        let error = match self.runner.run(prompt).await {
            Ok(result) => {
                tracing::debug!(
                    rounds = result.rounds,
                    tool_calls = result.tool_calls,
                    exhausted = result.exhausted,
                    "conversation complete"
                );
                match self.sender.reply(reply_token, &result.reply_text).await {
                    Ok(()) => return EventOutcome::Replied,
                    Err(e) => {
                        tracing::error!(channel = self.sender.name(), error = %e, "failed to send reply");
                        e.to_string()
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "conversation failed");
                e.to_string()
            }
        };

        match self.sender.reply(reply_token, &self.fallback_message).await {
            Ok(()) => EventOutcome::Fallback { error },
            Err(e) => {
                tracing::error!(channel = self.sender.name(), error = %e, "failed to send fallback reply");
                EventOutcome::Dropped {
                    error,
                    fallback_error: e.to_string(),
                }
            }
        }
    }
}
