//! Beacon LINE - LINE bot relay to a tool-using chat model
//!
//! This library provides the core functionality for the relay:
//! - Signed LINE webhook intake and per-event dispatch
//! - A bounded tool-calling conversation loop over chat completions
//! - Web search as a model-callable tool
//! - Reply extraction that separates answers from reasoning content
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 LINE Messaging API                   │
//! │        webhook (signed)   │   reply endpoint         │
//! └────────────────────┬──────────────────▲─────────────┘
//!                      │                  │
//! ┌────────────────────▼──────────────────┴─────────────┐
//! │                   Beacon LINE                        │
//! │  Signature  │  Dispatcher  │  Runner  │  Extractor   │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │        Chat completions   │   Web search            │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod agent;
pub mod api;
pub mod channels;
pub mod config;
pub mod error;
pub mod llm;
pub mod security;
pub mod tools;

pub use agent::{ConversationRunner, ExtractedResponse, LoopResult, extract};
pub use api::{ApiServer, ApiState, LineWebhookState, WebhookDispatcher};
pub use channels::{InboundEvent, LineChannel, ReplySender};
pub use config::Config;
pub use error::{Error, Result};
pub use llm::{AssistantTurn, ChatModel, Message, MessageContent, OpenAiClient, ToolCall};
pub use security::{compute_signature, validate_signature};
pub use tools::{
    SearchProvider, SearchResult, Tool, ToolRegistry, WebSearch, WebSearchTool,
};
