//! Conversation orchestrator
//!
//! One run per user request: send the transcript to the model backend,
//! execute any tool calls it requests (one round, strictly in order), then
//! ask for a final JSON-only completion and parse it.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use cinechunks_provider::{ChatParams, ChatResponse, Message, Provider, ToolCallDef, ToolChoice};

use crate::catalog::ToolCatalog;
use crate::classify::{ErrorKind, RunError};
use crate::invoker::ToolInvoker;
use crate::output::parse_final;
use crate::prompts;
use crate::RunResult;

/// Drives one conversation between the model backend and the tool server
pub struct Orchestrator<P: Provider> {
    provider: Arc<P>,
    invoker: Box<dyn ToolInvoker>,
    catalog: Arc<ToolCatalog>,
    model: String,
    max_tokens: u32,
    temperature: f32,
    cancel: Option<CancellationToken>,
}

impl<P: Provider> Orchestrator<P> {
    pub fn new(
        provider: P,
        invoker: Box<dyn ToolInvoker>,
        catalog: Arc<ToolCatalog>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider: Arc::new(provider),
            invoker,
            catalog,
            model: model.into(),
            max_tokens: 8192,
            temperature: 0.7,
            cancel: None,
        }
    }

    /// Abort the run at its next suspension point when the token fires
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn set_sampling(&mut self, max_tokens: u32, temperature: f32) {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
    }

    /// Run one orchestration for a user query.
    ///
    /// Always resolves: either a JSON payload (possibly a `{"raw": ...}`
    /// wrapper) or a classified failure. Tool-level failures never terminate
    /// the run; only model-backend failures do.
    pub async fn run(&self, user_query: &str) -> RunResult {
        if !self.provider.is_configured() {
            return Err(RunError::new(
                ErrorKind::AuthFailed,
                "model backend credential is not set",
            ));
        }

        info!("starting orchestration run");
        let mut messages = vec![
            Message::system(prompts::SYSTEM_PROMPT),
            Message::user(user_query),
        ];

        let response = self.complete(messages.clone(), false).await?;

        if !response.has_tool_calls() {
            return self.finalize(response);
        }

        // Record the assistant turn with its tool-call requests so each
        // tool result can be correlated back by id.
        let call_defs: Vec<ToolCallDef> = response
            .tool_calls
            .iter()
            .map(|tc| ToolCallDef::new(&tc.id, &tc.name, tc.arguments.clone()))
            .collect();
        let mut assistant = Message::assistant(response.content.as_deref().unwrap_or(""));
        assistant.tool_calls = Some(call_defs);
        messages.push(assistant);

        // Strictly sequential, in request order; append order in the
        // transcript is part of the contract.
        for call in &response.tool_calls {
            debug!("executing tool {} (id={})", call.name, call.id);
            let result = self
                .cancellable(self.invoker.invoke(&call.name, call.arguments.clone()))
                .await?;
            messages.push(Message::tool(&call.id, &call.name, result));
        }

        // Single round: the post-tool completion is always final and any
        // further tool calls in it are not honored.
        messages.push(Message::user(prompts::FINAL_INSTRUCTION));
        let final_response = self.complete(messages, true).await?;
        self.finalize(final_response)
    }

    async fn complete(
        &self,
        messages: Vec<Message>,
        json_only: bool,
    ) -> Result<ChatResponse, RunError> {
        let params = ChatParams {
            model: self.model.clone(),
            messages,
            tools: if json_only {
                Vec::new()
            } else {
                self.catalog.as_chat_tools()
            },
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            tool_choice: ToolChoice::Auto,
            json_only,
        };

        self.cancellable(self.provider.chat(params))
            .await?
            .map_err(|e| RunError::classified(e.to_string()))
    }

    fn finalize(&self, response: ChatResponse) -> RunResult {
        let text = response.content.unwrap_or_default();
        let text = text.trim();

        if text.is_empty() {
            return Err(RunError::new(
                ErrorKind::EmptyResponse,
                "model returned no text",
            ));
        }

        Ok(parse_final(text))
    }

    async fn cancellable<T>(
        &self,
        fut: impl std::future::Future<Output = T>,
    ) -> Result<T, RunError> {
        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        Err(RunError::new(ErrorKind::UpstreamError, "run cancelled"))
                    }
                    value = fut => Ok(value),
                }
            }
            None => Ok(fut.await),
        }
    }
}
