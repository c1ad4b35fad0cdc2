//! Tool invocation with failure absorption

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use cinechunks_mcp::McpClient;

/// Executes one named tool call.
///
/// Infallible by contract: any failure is synthesized into an
/// `"Error: <cause>"` string and returned as if it were a normal tool
/// result, so a broken tool degrades into model-visible context instead of
/// killing the run.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn invoke(&self, name: &str, arguments: Value) -> String;
}

/// Invoker backed by the MCP tool server
pub struct McpToolInvoker {
    client: Arc<McpClient>,
}

impl McpToolInvoker {
    pub fn new(client: Arc<McpClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolInvoker for McpToolInvoker {
    async fn invoke(&self, name: &str, arguments: Value) -> String {
        // The backend occasionally emits unparsable argument strings;
        // reject them here rather than passing garbage to the server.
        let arguments = match arguments {
            Value::Object(map) => Value::Object(map),
            Value::Null => json!({}),
            other => {
                warn!("tool {} called with non-object arguments: {}", name, other);
                return "Error: tool arguments must be a JSON object".to_string();
            }
        };

        match self.client.call_tool(name, arguments).await {
            Ok(text) => text,
            Err(e) => {
                debug!("tool {} failed: {}", name, e);
                format!("Error: {}", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn invoker_for(url: String) -> McpToolInvoker {
        let client = McpClient::new(url, Duration::from_secs(2)).unwrap();
        McpToolInvoker::new(Arc::new(client))
    }

    #[tokio::test]
    async fn test_invoke_returns_tool_text_verbatim() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/mcp")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "result": {"content": [{"type": "text", "text": "subtitle payload"}]}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let invoker = invoker_for(format!("{}/mcp", server.url()));
        let result = invoker
            .invoke("download_subtitles", json!({"movie_name": "Inception"}))
            .await;

        assert_eq!(result, "subtitle payload");
    }

    #[tokio::test]
    async fn test_invoke_absorbs_server_failure() {
        // Nothing listens here; the invoker must not propagate the error
        let invoker = invoker_for("http://127.0.0.1:1/mcp".to_string());
        let result = invoker.invoke("download_subtitles", json!({})).await;

        assert!(result.starts_with("Error:"), "got: {}", result);
    }

    #[tokio::test]
    async fn test_invoke_rejects_non_object_arguments() {
        let invoker = invoker_for("http://127.0.0.1:1/mcp".to_string());
        let result = invoker
            .invoke("download_subtitles", json!("movie_name=Inception"))
            .await;

        assert_eq!(result, "Error: tool arguments must be a JSON object");
    }

    #[tokio::test]
    async fn test_invoke_null_arguments_become_empty_object() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/mcp")
            .match_body(mockito::Matcher::PartialJson(json!({
                "params": {"name": "list_languages", "arguments": {}}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "result": {"content": [{"type": "text", "text": "en, fr"}]}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let invoker = invoker_for(format!("{}/mcp", server.url()));
        let result = invoker.invoke("list_languages", Value::Null).await;

        assert_eq!(result, "en, fr");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invoke_absorbs_tool_error_result() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/mcp")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "result": {
                        "isError": true,
                        "content": [{"type": "text", "text": "No subtitles found for 'Xyzzy'"}]
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let invoker = invoker_for(format!("{}/mcp", server.url()));
        let result = invoker
            .invoke("download_subtitles", json!({"movie_name": "Xyzzy"}))
            .await;

        assert!(result.starts_with("Error:"));
        assert!(result.contains("No subtitles found"));
    }
}
