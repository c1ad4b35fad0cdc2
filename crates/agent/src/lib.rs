//! CineChunks orchestrator core
//!
//! Drives one multi-turn exchange between the model backend and the subtitle
//! tool server: send the transcript, execute any requested tool calls, and
//! collect one structured result per user request.

pub mod catalog;
pub mod classify;
pub mod invoker;
pub mod orchestrator;
pub mod output;
pub mod prompts;

pub use catalog::{ToolCatalog, ToolDefinition};
pub use classify::{classify, ErrorKind, RunError};
pub use invoker::{McpToolInvoker, ToolInvoker};
pub use orchestrator::Orchestrator;
pub use output::parse_final;

/// Outcome of one orchestration run
pub type RunResult = std::result::Result<serde_json::Value, RunError>;
