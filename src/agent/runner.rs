//! Round-bounded conversation loop

use std::sync::Arc;

use super::extract::extract;
use crate::llm::{ChatModel, Message};
use crate::tools::ToolRegistry;

/// Maximum model calls per conversation
pub const MAX_ROUNDS: usize = 5;

/// Reply used when the model produced no usable text
pub const EMPTY_RESPONSE: &str = "(empty response)";

/// Outcome of one conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopResult {
    /// Final reply, never empty
    pub reply_text: String,
    /// Model calls made
    pub rounds: usize,
    /// Tool invocations dispatched
    pub tool_calls: usize,
    /// Whether the round limit ended the loop
    pub exhausted: bool,
}

impl LoopResult {
    fn finish(reply_text: String, rounds: usize, tool_calls: usize, exhausted: bool) -> Self {
        let reply_text = if reply_text.trim().is_empty() {
            EMPTY_RESPONSE.to_string()
        } else {
            reply_text
        };

        Self {
            reply_text,
            rounds,
            tool_calls,
            exhausted,
        }
    }
}

/// Extract a short display label from tool arguments JSON
/// Tries common field names; falls back to truncated raw args
fn summarize_invocation(name: &str, args: &str) -> String {
    let Ok(v) = serde_json::from_str::<serde_json::Value>(args) else {
        return args.chars().take(60).collect();
    };
    for field in &["query", "url"] {
        if let Some(s) = v.get(field).and_then(|v| v.as_str()) {
            let truncated: String = s.chars().take(60).collect();
            return format!("{name}: {truncated}");
        }
    }
    args.chars().take(60).collect()
}

/// Drives the model through tool calls until it answers
pub struct ConversationRunner {
    model: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
}

impl ConversationRunner {
    /// Create a runner over a model transport and a tool registry
    #[must_use]
    pub fn new(model: Arc<dyn ChatModel>, tools: Arc<ToolRegistry>) -> Self {
        Self { model, tools }
    }

    /// Run one conversation seeded with `initial_user_text`
    ///
    /// Loops until the model answers without tool calls or [`MAX_ROUNDS`]
    /// model calls have been made. Tool calls in one turn run sequentially in
    /// the order the model emitted them. Reasoning fragments are logged and
    /// never returned.
    ///
    /// # Errors
    ///
    /// Returns an error only when the model transport call fails.
    pub async fn run(&self, initial_user_text: &str) -> crate::Result<LoopResult> {
        let definitions = self.tools.definitions();
        let mut messages = vec![Message::user(initial_user_text)];
        let mut last_reply = String::new();
        let mut tool_calls = 0;

        for round in 1..=MAX_ROUNDS {
            let Some(turn) = self.model.complete(&messages, &definitions).await? else {
                tracing::warn!(round, "model returned no turn");
                return Ok(LoopResult::finish(String::new(), round, tool_calls, false));
            };

            let extracted = extract(&turn);
            for thought in &extracted.thoughts {
                tracing::debug!(round, thought = %thought, "model reasoning");
            }

            if !turn.has_tool_calls() {
                tracing::debug!(round, tool_calls, "conversation finished");
                return Ok(LoopResult::finish(
                    extracted.reply_text,
                    round,
                    tool_calls,
                    false,
                ));
            }

            last_reply = extracted.reply_text;
            let calls = turn.tool_calls.clone();
            messages.push(Message::Assistant(turn));

            for call in &calls {
                tracing::debug!(
                    round,
                    tool_id = %call.id,
                    invocation = %summarize_invocation(&call.function.name, &call.function.arguments),
                    "dispatching tool call"
                );
                let output = self
                    .tools
                    .invoke(&call.function.name, &call.function.arguments)
                    .await;
                messages.push(Message::tool(&call.id, output));
                tool_calls += 1;
            }
        }

        tracing::warn!(
            rounds = MAX_ROUNDS,
            tool_calls,
            "round limit reached, returning best available reply"
        );
        Ok(LoopResult::finish(last_reply, MAX_ROUNDS, tool_calls, true))
    }
}
