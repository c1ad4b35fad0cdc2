//! Tool catalog fetched from the subtitle tool server
//!
//! Populated once at startup and shared read-only across runs. A refresh
//! replaces the whole catalog behind a new `Arc` rather than mutating it.

use serde_json::{json, Value};
use tracing::{debug, warn};

use cinechunks_mcp::protocol::McpTool;
use cinechunks_mcp::{McpClient, McpError};
use cinechunks_provider::Tool;

/// One remote tool in backend-neutral shape
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Immutable set of the tools the server advertises
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<ToolDefinition>,
}

impl ToolCatalog {
    pub fn empty() -> Self {
        Self { tools: Vec::new() }
    }

    /// Fetch the catalog with exactly one listing call
    pub async fn load(client: &McpClient) -> Result<Self, McpError> {
        let tools = client.list_tools().await?;
        Ok(Self::from_mcp(tools))
    }

    /// Fetch the catalog, degrading to an empty one when the server is
    /// unreachable so callers can proceed with zero tools
    pub async fn load_or_empty(client: &McpClient) -> Self {
        match Self::load(client).await {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("tool listing failed, continuing with no tools: {}", e);
                Self::empty()
            }
        }
    }

    /// Convert the server's tool shapes to the backend-neutral shape
    pub fn from_mcp(tools: Vec<McpTool>) -> Self {
        let tools: Vec<ToolDefinition> = tools
            .into_iter()
            .map(|t| ToolDefinition {
                name: t.name,
                description: t.description.unwrap_or_default(),
                parameters: t
                    .input_schema
                    .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
            })
            .collect();

        debug!("cached {} tool definitions", tools.len());
        Self { tools }
    }

    /// Render the catalog as the backend's function-calling schemas.
    /// Pure transform, no side effects.
    pub fn as_chat_tools(&self) -> Vec<Tool> {
        self.tools
            .iter()
            .map(|t| Tool::new(&t.name, &t.description, t.parameters.clone()))
            .collect()
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
