//! Shared test utilities

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use beacon_line::api::{ApiState, LineWebhookState, WebhookDispatcher};
use beacon_line::llm::{AssistantTurn, ChatModel, Message, ToolDefinition};
use beacon_line::{
    ConversationRunner, Error, ReplySender, Result, SearchResult, ToolRegistry, WebSearch,
    compute_signature,
};
use secrecy::SecretString;

/// Channel secret used by every signed test request
pub const CHANNEL_SECRET: &str = "test-channel-secret";

/// What the fake model does on one call
#[derive(Clone)]
pub enum Step {
    /// Return this assistant turn
    Turn(AssistantTurn),
    /// Return no turn at all
    Nothing,
    /// Fail the transport call
    Fail(&'static str),
}

type Responder = Box<dyn Fn(usize, &[Message]) -> Step + Send + Sync>;

/// Chat model fake that records every request
pub struct FakeModel {
    respond: Responder,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl FakeModel {
    /// Answer call `n` with `steps[n]`, repeating the last step afterwards
    pub fn scripted(steps: Vec<Step>) -> Self {
        Self::from_fn(move |n, _| {
            steps
                .get(n)
                .or_else(|| steps.last())
                .cloned()
                .unwrap_or(Step::Nothing)
        })
    }

    /// Decide each answer from the call index and the history sent
    pub fn from_fn(f: impl Fn(usize, &[Message]) -> Step + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(f),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Histories sent to the model, one per call
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of model calls made
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for FakeModel {
    async fn complete(
        &self,
        messages: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<Option<AssistantTurn>> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(messages.to_vec());
            calls.len() - 1
        };

        match (self.respond)(index, messages) {
            Step::Turn(turn) => Ok(Some(turn)),
            Step::Nothing => Ok(None),
            Step::Fail(reason) => Err(Error::Llm(reason.to_string())),
        }
    }
}

/// Reply sender fake that records deliveries
#[derive(Default)]
pub struct RecordingSender {
    replies: Mutex<Vec<(String, String)>>,
    failing_tokens: HashSet<String>,
    fail_all: bool,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delivery fails
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    /// Deliveries addressed to `token` fail
    pub fn failing_for(token: &str) -> Self {
        Self {
            failing_tokens: std::iter::once(token.to_string()).collect(),
            ..Self::default()
        }
    }

    /// `(reply_token, text)` pairs delivered so far
    pub fn replies(&self) -> Vec<(String, String)> {
        self.replies.lock().unwrap().clone()
    }

    /// Text delivered for `token`, if any
    pub fn reply_for(&self, token: &str) -> Option<String> {
        self.replies()
            .into_iter()
            .find(|(t, _)| t == token)
            .map(|(_, text)| text)
    }
}

#[async_trait]
impl ReplySender for RecordingSender {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn reply(&self, reply_token: &str, text: &str) -> Result<()> {
        if self.fail_all || self.failing_tokens.contains(reply_token) {
            return Err(Error::Channel(format!("LINE API error: rejected {reply_token}")));
        }
        self.replies
            .lock()
            .unwrap()
            .push((reply_token.to_string(), text.to_string()));
        Ok(())
    }
}

/// Search fake returning fixed results and recording queries
pub struct FakeSearch {
    results: Vec<SearchResult>,
    queries: Mutex<Vec<String>>,
}

impl FakeSearch {
    pub fn returning(results: Vec<SearchResult>) -> Self {
        Self {
            results,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSearch for FakeSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.results.iter().take(limit).cloned().collect())
    }
}

/// One search hit
pub fn hit(title: &str, url: &str, content: &str) -> SearchResult {
    SearchResult {
        title: title.to_string(),
        url: url.to_string(),
        content: content.to_string(),
    }
}

/// Runner over the fakes
pub fn runner(model: &Arc<FakeModel>, search: Option<Arc<FakeSearch>>) -> ConversationRunner {
    let search = search.map(|s| s as Arc<dyn WebSearch>);
    ConversationRunner::new(
        Arc::clone(model) as Arc<dyn ChatModel>,
        Arc::new(ToolRegistry::with_search(search)),
    )
}

/// Dispatcher over the fakes
pub fn dispatcher(
    model: &Arc<FakeModel>,
    sender: &Arc<RecordingSender>,
    search: Option<Arc<FakeSearch>>,
) -> WebhookDispatcher {
    WebhookDispatcher::new(
        Arc::new(runner(model, search)),
        Arc::clone(sender) as Arc<dyn ReplySender>,
    )
}

/// API state whose webhook verifies against [`CHANNEL_SECRET`]
pub fn api_state(dispatcher: WebhookDispatcher) -> Arc<ApiState> {
    Arc::new(ApiState::new(LineWebhookState {
        channel_secret: SecretString::from(CHANNEL_SECRET.to_string()),
        dispatcher: Arc::new(dispatcher),
    }))
}

/// Webhook POST signed with [`CHANNEL_SECRET`]
pub fn signed_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-line-signature", compute_signature(body.as_bytes(), CHANNEL_SECRET))
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// LINE text message event JSON
pub fn text_event(text: &str, reply_token: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "message",
        "mode": "active",
        "timestamp": 1_700_000_000_000_i64,
        "replyToken": reply_token,
        "source": {"type": "user", "userId": "U0000"},
        "message": {"id": "1", "type": "text", "text": text}
    })
}

/// Webhook body wrapping `events`
pub fn webhook_body(events: Vec<serde_json::Value>) -> String {
    serde_json::json!({"destination": "Ubot", "events": events}).to_string()
}

/// Wait until `done` holds, polling the background dispatch
pub async fn wait_for(done: impl Fn() -> bool) {
    for _ in 0..200 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
