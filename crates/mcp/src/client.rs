//! Streamable-HTTP MCP client

use reqwest::Client;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::protocol::{JsonRpcRequest, JsonRpcResponse, McpTool, PROTOCOL_VERSION};
use crate::{McpError, Result};

const SESSION_HEADER: &str = "Mcp-Session-Id";

/// Client for one MCP server endpoint
pub struct McpClient {
    http: Client,
    url: String,
    request_id: AtomicI64,
    session_id: RwLock<Option<String>>,
}

impl McpClient {
    /// Create a client without touching the network
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
            request_id: AtomicI64::new(0),
            session_id: RwLock::new(None),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn next_id(&self) -> i64 {
        self.request_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Perform the MCP initialize handshake
    pub async fn connect(&self) -> Result<()> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": "cinechunks",
                "version": env!("CARGO_PKG_VERSION"),
            }
        });

        let result = self.send_request("initialize", Some(params)).await?;
        let version = result["protocolVersion"].as_str().unwrap_or("unknown");
        info!("connected to MCP server at {} (protocol {})", self.url, version);

        // Acknowledge before issuing any operation
        self.send_notification("notifications/initialized", None)
            .await?;

        Ok(())
    }

    /// List the tools the server exposes
    pub async fn list_tools(&self) -> Result<Vec<McpTool>> {
        let result = self.send_request("tools/list", None).await?;

        let tools = result["tools"]
            .as_array()
            .ok_or(McpError::InvalidResponse)?
            .iter()
            .map(|t| serde_json::from_value(t.clone()))
            .collect::<std::result::Result<Vec<McpTool>, _>>()?;

        debug!("tool server advertises {} tools", tools.len());
        Ok(tools)
    }

    /// Call a named tool and return its text output
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<String> {
        debug!("calling tool {}", name);

        let params = json!({
            "name": name,
            "arguments": arguments,
        });

        let result = self.send_request("tools/call", Some(params)).await?;
        let text = Self::extract_text(&result);

        if result["isError"].as_bool().unwrap_or(false) {
            let message = if text.is_empty() {
                format!("tool '{}' reported an error", name)
            } else {
                text
            };
            return Err(McpError::Tool(message));
        }

        Ok(text)
    }

    /// Join the text content blocks of a tools/call result
    fn extract_text(result: &Value) -> String {
        result["content"]
            .as_array()
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b["type"] == "text")
                    .filter_map(|b| b["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default()
    }

    async fn send_request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id();
        let request = JsonRpcRequest::new(id, method, params);

        debug!("-> {} (id={})", method, id);

        let response = self.post(&request).await?;

        if let Some(session) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
        {
            *self.session_id.write().await = Some(session);
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.text().await?;

        let rpc = parse_rpc_body(&content_type, &body)?;

        if let Some(error) = rpc.error {
            warn!("rpc error from {}: {}", method, error.message);
            return Err(McpError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        rpc.result.ok_or(McpError::InvalidResponse)
    }

    async fn send_notification(&self, method: &str, params: Option<Value>) -> Result<()> {
        let request = JsonRpcRequest::notification(method, params);
        self.post(&request).await?;
        Ok(())
    }

    async fn post(&self, request: &JsonRpcRequest) -> Result<reqwest::Response> {
        let mut builder = self
            .http
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json, text/event-stream")
            .json(request);

        if let Some(session) = self.session_id.read().await.as_deref() {
            builder = builder.header(SESSION_HEADER, session);
        }

        Ok(builder.send().await?)
    }
}

/// Parse a response body that is either plain JSON or a single SSE event
fn parse_rpc_body(content_type: &str, body: &str) -> Result<JsonRpcResponse> {
    if content_type.contains("text/event-stream") {
        for line in body.lines() {
            if let Some(data) = line.strip_prefix("data:") {
                let data = data.trim();
                if data.is_empty() {
                    continue;
                }
                return Ok(serde_json::from_str(data)?);
            }
        }
        return Err(McpError::InvalidResponse);
    }

    Ok(serde_json::from_str(body)?)
}
