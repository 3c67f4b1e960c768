//! Web search tool exposed to the model as `search_web`

mod search;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

pub use search::{SearchProvider, SearchResult, WebSearch, WebSearchTool};

use super::Tool;
use crate::llm::ToolDefinition;
use crate::{Error, Result};

/// Tool name advertised to the model
pub const SEARCH_WEB: &str = "search_web";

/// Maximum results returned to the model
pub const MAX_RESULTS: usize = 5;

/// Maximum characters of page content kept per result
pub const MAX_CONTENT_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
struct SearchWebArgs {
    #[serde(default)]
    query: String,
}

/// `search_web` capability
///
/// Holds no search client when the provider credential is missing; every
/// call then fails with a configuration error the model can read.
pub struct SearchWebTool {
    search: Option<Arc<dyn WebSearch>>,
}

impl SearchWebTool {
    /// Create the tool around an optional search client
    #[must_use]
    pub fn new(search: Option<Arc<dyn WebSearch>>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl Tool for SearchWebTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            SEARCH_WEB,
            "Search the web for up-to-date information. Use this for news, weather, prices, \
             or anything that may have changed recently.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query"
                    }
                },
                "required": ["query"]
            }),
        )
    }

    async fn call(&self, arguments: &str) -> Result<serde_json::Value> {
        let args: SearchWebArgs = serde_json::from_str(arguments)
            .map_err(|e| Error::Tool(format!("invalid arguments: {e}")))?;
        let query = args.query.trim();
        if query.is_empty() {
            return Err(Error::Tool("missing required argument: query".to_string()));
        }

        let Some(search) = &self.search else {
            return Err(Error::Config(
                "web search is not configured (missing search API key)".to_string(),
            ));
        };

        let results = search.search(query, MAX_RESULTS).await?;
        tracing::debug!(query, count = results.len(), "web search completed");

        let trimmed: Vec<SearchResult> = results
            .into_iter()
            .take(MAX_RESULTS)
            .map(|r| SearchResult {
                content: r.content.chars().take(MAX_CONTENT_CHARS).collect(),
                ..r
            })
            .collect();

        Ok(serde_json::to_value(trimmed)?)
    }
}
