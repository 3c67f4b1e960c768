//! Web search transport
//!
//! Provides web search via configurable providers (Tavily, Brave, Serper),
//! normalized into one result shape.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Request timeout for one search
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Search provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProvider {
    /// Tavily Search API
    #[default]
    Tavily,
    /// Brave Search API
    Brave,
    /// Serper (Google) Search API
    Serper,
}

impl SearchProvider {
    /// Parse a provider name (case-insensitive)
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "tavily" => Some(Self::Tavily),
            "brave" => Some(Self::Brave),
            "serper" => Some(Self::Serper),
            _ => None,
        }
    }
}

/// One ranked search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Result title
    pub title: String,
    /// Result URL
    pub url: String,
    /// Page content or snippet
    pub content: String,
}

/// Search transport seam
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Run a query and return at most `limit` ranked results
    ///
    /// # Errors
    ///
    /// Returns error if the request or response parsing fails
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>>;
}

/// HTTP web search client
pub struct WebSearchTool {
    provider: SearchProvider,
    api_key: SecretString,
    client: reqwest::Client,
}

/// Tavily API request body
#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: usize,
}

/// Tavily API response
#[derive(Debug, Deserialize)]
struct TavilySearchResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

/// Brave Search API response
#[derive(Debug, Deserialize)]
struct BraveSearchResponse {
    web: Option<BraveWebResults>,
}

#[derive(Debug, Deserialize)]
struct BraveWebResults {
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    title: String,
    url: String,
    #[serde(default)]
    description: String,
}

/// Serper API response
#[derive(Debug, Deserialize)]
struct SerperSearchResponse {
    organic: Option<Vec<SerperResult>>,
}

#[derive(Debug, Deserialize)]
struct SerperResult {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

/// Serper API request body
#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
}

impl WebSearchTool {
    /// Create a search client for `provider`
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(provider: SearchProvider, api_key: SecretString) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            provider,
            api_key,
            client,
        })
    }

    /// Provider this client talks to
    #[must_use]
    pub const fn provider(&self) -> SearchProvider {
        self.provider
    }

    async fn search_tavily(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .post("https://api.tavily.com/search")
            .bearer_auth(self.api_key.expose_secret())
            .json(&TavilyRequest {
                query,
                max_results: limit,
            })
            .send()
            .await?
            .error_for_status()
            .map_err(Error::Http)?;

        let body: TavilySearchResponse = response.json().await?;

        Ok(body
            .results
            .into_iter()
            .map(|r| SearchResult {
                title: r.title,
                url: r.url,
                content: r.content,
            })
            .collect())
    }

    async fn search_brave(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .get("https://api.search.brave.com/res/v1/web/search")
            .header("X-Subscription-Token", self.api_key.expose_secret())
            .query(&[("q", query), ("count", &limit.to_string())])
            .send()
            .await?
            .error_for_status()
            .map_err(Error::Http)?;

        let body: BraveSearchResponse = response.json().await?;

        Ok(body
            .web
            .map(|web| {
                web.results
                    .into_iter()
                    .map(|r| SearchResult {
                        title: r.title,
                        url: r.url,
                        content: r.description,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn search_serper(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .post("https://google.serper.dev/search")
            .header("X-API-KEY", self.api_key.expose_secret())
            .json(&SerperRequest { q: query, num: limit })
            .send()
            .await?
            .error_for_status()
            .map_err(Error::Http)?;

        let body: SerperSearchResponse = response.json().await?;

        Ok(body
            .organic
            .map(|organic| {
                organic
                    .into_iter()
                    .map(|r| SearchResult {
                        title: r.title,
                        url: r.link,
                        content: r.snippet,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl WebSearch for WebSearchTool {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let mut results = match self.provider {
            SearchProvider::Tavily => self.search_tavily(query, limit).await,
            SearchProvider::Brave => self.search_brave(query, limit).await,
            SearchProvider::Serper => self.search_serper(query, limit).await,
        }
        .map_err(|e| Error::Search(format!("{:?}: {e}", self.provider)))?;

        results.truncate(limit);
        Ok(results)
    }
}
