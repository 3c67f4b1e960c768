//! LINE Messaging API reply client

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use super::ReplySender;
use crate::{Error, Result};

/// Reply endpoint of the Messaging API
const REPLY_URL: &str = "https://api.line.me/v2/bot/message/reply";

/// LINE rejects text messages longer than this
pub const MAX_TEXT_CHARS: usize = 5000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: [TextMessage; 1],
}

#[derive(Debug, Serialize)]
struct TextMessage {
    #[serde(rename = "type")]
    message_type: &'static str,
    text: String,
}

/// LINE channel adapter (reply side)
#[derive(Clone)]
pub struct LineChannel {
    access_token: Arc<SecretString>,
    client: Client,
    reply_url: String,
}

impl LineChannel {
    /// Create a new LINE channel adapter
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(access_token: SecretString) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            access_token: Arc::new(access_token),
            client,
            reply_url: REPLY_URL.to_string(),
        })
    }

    /// Point replies at a different endpoint (API-compatible proxies)
    #[must_use]
    pub fn with_reply_url(mut self, url: impl Into<String>) -> Self {
        self.reply_url = url.into();
        self
    }
}

fn reply_body<'a>(reply_token: &'a str, text: &str) -> ReplyRequest<'a> {
    ReplyRequest {
        reply_token,
        messages: [TextMessage {
            message_type: "text",
            text: truncate_text(text),
        }],
    }
}

/// Clamp text to LINE's message length limit
fn truncate_text(text: &str) -> String {
    if text.chars().count() <= MAX_TEXT_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(MAX_TEXT_CHARS - 1).collect();
    out.push('\u{2026}');
    out
}

#[async_trait]
impl ReplySender for LineChannel {
    fn name(&self) -> &'static str {
        "line"
    }

    async fn reply(&self, reply_token: &str, text: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.reply_url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&reply_body(reply_token, text))
            .send()
            .await
            .map_err(|e| Error::Channel(format!("LINE API error: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Channel(format!("LINE API error: {status} - {body}")));
        }

        tracing::debug!(chars = text.chars().count(), "LINE reply sent");
        Ok(())
    }
}
