//! HTTP API server for the LINE relay

pub mod health;
pub mod webhooks;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub use webhooks::line::{LineWebhookState, WebhookDispatcher};

use crate::agent::ConversationRunner;
use crate::channels::{LineChannel, ReplySender};
use crate::config::Config;
use crate::llm::{ChatModel, OpenAiClient};
use crate::tools::{ToolRegistry, WebSearch, WebSearchTool};
use crate::{Error, Result};

/// Shared state for API handlers
pub struct ApiState {
    /// LINE webhook state; `None` when channel credentials are missing
    pub line: Option<LineWebhookState>,
    /// Model identifier reported by the readiness probe
    pub model: Option<String>,
    /// Whether the web search tool has credentials
    pub search_enabled: bool,
}

impl ApiState {
    /// State with a configured LINE webhook
    #[must_use]
    pub fn new(line: LineWebhookState) -> Self {
        Self {
            line: Some(line),
            model: None,
            search_enabled: false,
        }
    }

    /// State with no LINE credentials; webhooks answer 500
    #[must_use]
    pub const fn unconfigured() -> Self {
        Self {
            line: None,
            model: None,
            search_enabled: false,
        }
    }

    /// Build the production state: OpenAI model, LINE replies, web search
    ///
    /// # Errors
    ///
    /// Returns error if a required credential is missing or an HTTP client
    /// cannot be built
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;

        let Config {
            line, llm, search, ..
        } = config;
        let missing = |key: &str| Error::Config(format!("missing required configuration: {key}"));

        let model = OpenAiClient::new(
            llm.api_key.ok_or_else(|| missing("OPENAI_API_KEY"))?,
            llm.base_url,
            llm.model,
            llm.max_tokens,
        )?;
        let model_id = model.model().to_string();

        let search_client: Option<Arc<dyn WebSearch>> = match search.api_key {
            Some(key) => Some(Arc::new(WebSearchTool::new(search.provider, key)?)),
            None => {
                tracing::warn!("no search API key configured, web search will report errors");
                None
            }
        };
        let search_enabled = search_client.is_some();

        let mut channel =
            LineChannel::new(line.access_token.ok_or_else(|| missing("LINE_CHANNEL_ACCESS_TOKEN"))?)?;
        if let Some(url) = line.reply_url {
            channel = channel.with_reply_url(url);
        }

        let model: Arc<dyn ChatModel> = Arc::new(model);
        let sender: Arc<dyn ReplySender> = Arc::new(channel);
        let runner = ConversationRunner::new(model, Arc::new(ToolRegistry::with_search(search_client)));
        let dispatcher = WebhookDispatcher::new(Arc::new(runner), sender)
            .with_trigger_prefix(line.trigger_prefix)
            .with_fallback_message(line.fallback_message);

        tracing::info!(
            model = %model_id,
            provider = ?search.provider,
            search_enabled,
            "relay configured"
        );

        Ok(Self {
            line: Some(LineWebhookState {
                channel_secret: line
                    .channel_secret
                    .ok_or_else(|| missing("LINE_CHANNEL_SECRET"))?,
                dispatcher: Arc::new(dispatcher),
            }),
            model: Some(model_id),
            search_enabled,
        })
    }
}

/// Build the router with all routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .merge(webhooks::router(state.clone()))
        .merge(health::router())
        .merge(health::ready_router(state))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    host: String,
    port: u16,
}

impl ApiServer {
    /// Create a server for the given state
    #[must_use]
    pub fn new(state: ApiState, host: impl Into<String>, port: u16) -> Self {
        Self {
            state: Arc::new(state),
            host: host.into(),
            port,
        }
    }

    /// Run the API server until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(addr = %addr, "API server listening");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        tracing::info!("API server stopped");
        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
