//! Split an assistant turn into the user-visible reply and internal thoughts

use serde_json::Value;

use crate::llm::{AssistantTurn, MessageContent};

/// Reply text and reasoning fragments of one assistant turn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedResponse {
    /// User-facing text, trimmed; empty when the turn carried none
    pub reply_text: String,
    /// Reasoning and summary fragments, in order; never shown to the user
    pub thoughts: Vec<String>,
}

/// How a single content fragment is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FragmentKind {
    Thought,
    Summary,
    Reply,
}

/// Extract reply text and thoughts from an assistant turn
///
/// Total over every content shape: unrecognized or malformed fragments are
/// skipped rather than reported.
#[must_use]
pub fn extract(turn: &AssistantTurn) -> ExtractedResponse {
    match &turn.content {
        None => ExtractedResponse::default(),
        Some(MessageContent::Text(text)) => ExtractedResponse {
            reply_text: text.trim().to_string(),
            thoughts: Vec::new(),
        },
        Some(MessageContent::Parts(parts)) => extract_parts(parts),
    }
}

fn extract_parts(parts: &[Value]) -> ExtractedResponse {
    let mut reply: Vec<&str> = Vec::new();
    let mut thoughts = Vec::new();

    for part in parts {
        let Some(kind) = classify(part) else {
            continue;
        };

        match kind {
            FragmentKind::Thought | FragmentKind::Summary => {
                if let Some(text) = fragment_thought(part) {
                    thoughts.push(text);
                }
            }
            FragmentKind::Reply => {
                if let Some(text) = non_empty_str(part.get("text")) {
                    reply.push(text);
                }
            }
        }
    }

    ExtractedResponse {
        reply_text: reply.join("\n"),
        thoughts,
    }
}

/// Classify by `type`, then `role`, then by the presence of text
fn classify(part: &Value) -> Option<FragmentKind> {
    let obj = part.as_object()?;
    let declared = obj
        .get("type")
        .and_then(Value::as_str)
        .or_else(|| obj.get("role").and_then(Value::as_str));

    match declared {
        Some("reasoning" | "thinking" | "input_text") => Some(FragmentKind::Thought),
        Some("summary" | "summary_text") => Some(FragmentKind::Summary),
        Some(_) => obj
            .get("text")
            .is_some_and(Value::is_string)
            .then_some(FragmentKind::Reply),
        None => non_empty_str(obj.get("text")).map(|_| FragmentKind::Reply),
    }
}

/// Text of a reasoning or summary fragment
///
/// Providers put it under `text`, `reasoning`, `content`, or a nested
/// `summary` list of `{text}` entries.
fn fragment_thought(part: &Value) -> Option<String> {
    for key in ["text", "reasoning", "content"] {
        if let Some(text) = non_empty_str(part.get(key)) {
            return Some(text.to_string());
        }
    }

    match part.get("summary") {
        Some(Value::String(s)) => non_empty(s).map(str::to_string),
        Some(Value::Array(items)) => {
            let joined = items
                .iter()
                .filter_map(|item| {
                    non_empty_str(item.get("text")).or_else(|| item.as_str().and_then(non_empty))
                })
                .collect::<Vec<_>>()
                .join("\n");
            non_empty(&joined).map(str::to_string)
        }
        _ => None,
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).and_then(non_empty)
}

fn non_empty(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
