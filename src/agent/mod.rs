//! Conversation orchestration: model calls, tool rounds, reply extraction

pub mod extract;
mod runner;

pub use extract::{ExtractedResponse, extract};
pub use runner::{ConversationRunner, EMPTY_RESPONSE, LoopResult, MAX_ROUNDS};
