//! Tool registry: capabilities the model may invoke by name

pub mod web;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

pub use web::{SearchProvider, SearchResult, SearchWebTool, WebSearch, WebSearchTool};

use crate::Result;
use crate::llm::ToolDefinition;

/// A capability the model can call
#[async_trait]
pub trait Tool: Send + Sync {
    /// Schema advertised to the model; its function name is the registry key
    fn definition(&self) -> ToolDefinition;

    /// Run the tool against raw JSON arguments
    ///
    /// # Errors
    ///
    /// Returns error on bad arguments, missing configuration, or transport
    /// failure. The registry turns errors into tool output.
    async fn call(&self, arguments: &str) -> Result<serde_json::Value>;
}

/// Name-keyed set of tools
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the default capability set
    #[must_use]
    pub fn with_search(search: Option<Arc<dyn WebSearch>>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SearchWebTool::new(search)));
        registry
    }

    /// Add a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().function.name;
        self.tools.insert(name, tool);
    }

    /// Schemas of every registered tool
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Number of registered tools
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool call and serialize its outcome
    ///
    /// Never fails: unknown tools and tool errors come back as
    /// `{"error": "..."}` so the conversation can continue.
    pub async fn invoke(&self, name: &str, arguments: &str) -> String {
        let Some(tool) = self.tools.get(name) else {
            tracing::warn!(tool = name, "model requested unknown tool");
            return error_payload(&format!("unknown tool: {name}"));
        };

        match tool.call(arguments).await {
            Ok(value) => value.to_string(),
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool call failed");
                error_payload(&e.to_string())
            }
        }
    }
}

fn error_payload(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}
