//! MCP client for the subtitle tool server
//!
//! Speaks Model Context Protocol JSON-RPC over streamable HTTP: one POST per
//! request, responses either as plain JSON or wrapped in a single SSE event.

use thiserror::Error;

pub mod client;
pub mod protocol;

pub use client::McpClient;
pub use protocol::{JsonRpcRequest, JsonRpcResponse, McpTool, RpcError};

/// MCP client errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("tool failed: {0}")]
    Tool(String),

    #[error("malformed response from tool server")]
    InvalidResponse,
}

pub type Result<T> = std::result::Result<T, McpError>;
