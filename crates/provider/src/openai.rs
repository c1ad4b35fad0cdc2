//! OpenAI-compatible chat completions client

use crate::*;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, trace};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Chat backend speaking the OpenAI completions protocol
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    api_base: String,
    default_model: String,
}

impl OpenAiProvider {
    pub fn new(
        api_key: impl Into<String>,
        api_base: Option<String>,
        default_model: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            default_model: default_model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    fn build_request(&self, params: &ChatParams) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = params
            .messages
            .iter()
            .map(|m| {
                let mut obj = json!({ "role": &m.role });
                if let Some(content) = &m.content {
                    obj["content"] = json!(content);
                }
                if let Some(tool_calls) = &m.tool_calls {
                    obj["tool_calls"] = json!(tool_calls);
                }
                if let Some(tool_call_id) = &m.tool_call_id {
                    obj["tool_call_id"] = json!(tool_call_id);
                }
                if let Some(name) = &m.name {
                    obj["name"] = json!(name);
                }
                obj
            })
            .collect();

        let mut body = json!({
            "model": params.model,
            "messages": messages,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        });

        if params.json_only {
            // Final completion: single JSON object, no tools offered
            body["response_format"] = json!({"type": "json_object"});
            return body;
        }

        if !params.tools.is_empty() {
            body["tools"] = json!(params.tools);
            body["tool_choice"] = match &params.tool_choice {
                ToolChoice::Auto => json!("auto"),
                ToolChoice::Required(name) => {
                    json!({"type": "function", "function": {"name": name}})
                }
                ToolChoice::None => json!("none"),
            };
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<ChatResponse> {
        let choice = json["choices"]
            .get(0)
            .ok_or(ProviderError::InvalidResponse)?;
        let message = &choice["message"];
        let content = message["content"].as_str().map(|s| s.to_string());
        let finish_reason = choice["finish_reason"]
            .as_str()
            .unwrap_or("stop")
            .to_string();

        let mut tool_calls = Vec::new();
        if let Some(calls) = message["tool_calls"].as_array() {
            for call in calls {
                let function = &call["function"];
                // Arguments usually arrive as a JSON string; a string that
                // does not parse is carried through raw so the invoker can
                // reject it without aborting the run.
                let args = function["arguments"]
                    .as_str()
                    .and_then(|s| serde_json::from_str(s).ok())
                    .unwrap_or_else(|| function["arguments"].clone());

                tool_calls.push(ToolCall {
                    id: call["id"].as_str().unwrap_or("").to_string(),
                    name: function["name"].as_str().unwrap_or("").to_string(),
                    arguments: args,
                });
            }
        }

        let usage = if let Some(usage) = json["usage"].as_object() {
            Usage {
                prompt_tokens: usage["prompt_tokens"].as_u64().unwrap_or(0) as u32,
                completion_tokens: usage["completion_tokens"].as_u64().unwrap_or(0) as u32,
                total_tokens: usage["total_tokens"].as_u64().unwrap_or(0) as u32,
            }
        } else {
            Usage::default()
        };

        Ok(ChatResponse {
            content,
            tool_calls,
            finish_reason,
            usage,
        })
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiProvider {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NoApiKey);
        }

        trace!("sending completion request to {}", self.api_base);

        let url = format!("{}/chat/completions", self.api_base);
        let body = self.build_request(&params);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let json: serde_json::Value = response.json().await?;

        if !status.is_success() {
            let error = json["error"]["message"]
                .as_str()
                .unwrap_or("unknown error")
                .to_string();
            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }
            return Err(ProviderError::Api(error));
        }

        debug!(
            "completion received, {} tool calls",
            json["choices"][0]["message"]["tool_calls"]
                .as_array()
                .map(|v| v.len())
                .unwrap_or(0)
        );

        self.parse_response(json)
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_defaults() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        assert_eq!(provider.api_base, DEFAULT_API_BASE);
        assert_eq!(provider.default_model(), DEFAULT_MODEL);
        assert!(provider.is_configured());
    }

    #[test]
    fn test_provider_custom_base_and_model() {
        let provider = OpenAiProvider::new(
            "sk-test",
            Some("https://proxy.internal/v1".to_string()),
            Some("gpt-4o".to_string()),
        );
        assert_eq!(provider.api_base, "https://proxy.internal/v1");
        assert_eq!(provider.default_model(), "gpt-4o");
    }

    #[test]
    fn test_provider_not_configured_without_key() {
        let provider = OpenAiProvider::new("", None, None);
        assert!(!provider.is_configured());
    }

    #[test]
    fn test_build_request_basic() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        let params = ChatParams {
            model: "gpt-4o-mini".to_string(),
            messages: vec![Message::user("Split \"Heat\" into episodes")],
            max_tokens: 1024,
            temperature: 0.5,
            ..ChatParams::default()
        };

        let request = provider.build_request(&params);

        assert_eq!(request["model"], "gpt-4o-mini");
        assert_eq!(request["max_tokens"], 1024);
        assert_eq!(request["temperature"], 0.5);
        assert!(request.get("tools").is_none());
        assert!(request.get("response_format").is_none());

        let messages = request["messages"].as_array().unwrap();
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "Split \"Heat\" into episodes");
    }

    #[test]
    fn test_build_request_with_tools() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        let params = ChatParams {
            model: "gpt-4o-mini".to_string(),
            messages: vec![Message::user("hi")],
            tools: vec![Tool::new(
                "download_subtitles",
                "Fetch subtitles for a movie",
                json!({"type": "object", "properties": {"movie_name": {"type": "string"}}}),
            )],
            ..ChatParams::default()
        };

        let request = provider.build_request(&params);

        let tools = request["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["type"], "function");
        assert_eq!(tools[0]["function"]["name"], "download_subtitles");
        assert_eq!(request["tool_choice"], "auto");
    }

    #[test]
    fn test_build_request_json_only_drops_tools() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        let params = ChatParams {
            model: "gpt-4o-mini".to_string(),
            messages: vec![Message::user("final")],
            tools: vec![Tool::new("download_subtitles", "desc", json!({}))],
            json_only: true,
            ..ChatParams::default()
        };

        let request = provider.build_request(&params);

        assert_eq!(request["response_format"]["type"], "json_object");
        assert!(request.get("tools").is_none());
        assert!(request.get("tool_choice").is_none());
    }

    #[test]
    fn test_build_request_tool_message_fields() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        let params = ChatParams {
            model: "gpt-4o-mini".to_string(),
            messages: vec![Message::tool("call_9", "download_subtitles", "srt text")],
            ..ChatParams::default()
        };

        let request = provider.build_request(&params);
        let messages = request["messages"].as_array().unwrap();
        assert_eq!(messages[0]["role"], "tool");
        assert_eq!(messages[0]["tool_call_id"], "call_9");
        assert_eq!(messages[0]["name"], "download_subtitles");
    }

    #[test]
    fn test_parse_response_text_only() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        let response_json = json!({
            "choices": [{
                "message": {"role": "assistant", "content": "{\"movie\":{}}"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        });

        let response = provider.parse_response(response_json).unwrap();

        assert_eq!(response.content, Some("{\"movie\":{}}".to_string()));
        assert!(response.tool_calls.is_empty());
        assert_eq!(response.usage.total_tokens, 15);
    }

    #[test]
    fn test_parse_response_with_tool_calls() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        let response_json = json!({
            "choices": [{
                "message": {
                    "content": serde_json::Value::Null,
                    "tool_calls": [{
                        "id": "call_123",
                        "type": "function",
                        "function": {
                            "name": "download_subtitles",
                            "arguments": "{\"movie_name\": \"Inception\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        });

        let response = provider.parse_response(response_json).unwrap();

        assert_eq!(response.content, None);
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].id, "call_123");
        assert_eq!(
            response.tool_calls[0].arguments,
            json!({"movie_name": "Inception"})
        );
    }

    #[test]
    fn test_parse_response_unparsable_arguments_kept_raw() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        let response_json = json!({
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "id": "call_1",
                        "function": {
                            "name": "download_subtitles",
                            "arguments": "{not json"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        });

        let response = provider.parse_response(response_json).unwrap();
        assert_eq!(response.tool_calls[0].arguments, json!("{not json"));
    }

    #[test]
    fn test_parse_response_empty_choices() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        let result = provider.parse_response(json!({"choices": []}));
        assert!(matches!(result, Err(ProviderError::InvalidResponse)));
    }

    #[tokio::test]
    async fn test_chat_without_key_fails_fast() {
        let provider = OpenAiProvider::new("", None, None);
        let result = provider.chat(ChatParams::default()).await;
        assert!(matches!(result, Err(ProviderError::NoApiKey)));
    }

    #[tokio::test]
    async fn test_chat_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [{
                        "message": {"role": "assistant", "content": "hello"},
                        "finish_reason": "stop"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let provider = OpenAiProvider::new("sk-test", Some(server.url()), None);
        let params = ChatParams {
            model: "gpt-4o-mini".to_string(),
            messages: vec![Message::user("hi")],
            ..ChatParams::default()
        };

        let response = provider.chat(params).await.unwrap();
        assert_eq!(response.content, Some("hello".to_string()));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_maps_429_to_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_header("content-type", "application/json")
            .with_body(json!({"error": {"message": "Rate limit exceeded"}}).to_string())
            .create_async()
            .await;

        let provider = OpenAiProvider::new("sk-test", Some(server.url()), None);
        let result = provider.chat(ChatParams::default()).await;
        assert!(matches!(result, Err(ProviderError::RateLimited)));
    }

    #[tokio::test]
    async fn test_chat_surfaces_api_error_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(json!({"error": {"message": "Invalid API key"}}).to_string())
            .create_async()
            .await;

        let provider = OpenAiProvider::new("sk-test", Some(server.url()), None);
        let result = provider.chat(ChatParams::default()).await;
        match result {
            Err(ProviderError::Api(msg)) => assert_eq!(msg, "Invalid API key"),
            other => panic!("expected Api error, got {:?}", other.map(|_| ())),
        }
    }
}
