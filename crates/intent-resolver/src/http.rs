//! HTTP client for an OpenAI-compatible chat completions endpoint.

use crate::resolver::{ChatMessage, Completion, CompletionClient, ToolCall, ToolSpec};
use crate::{ResolutionError, ResolverConfig, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

pub struct HttpCompletionClient {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    client: reqwest::Client,
}

impl HttpCompletionClient {
    /// Build a client from config. The API key is read from the environment
    /// variable the config names, if any.
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(ResolutionError::Config("endpoint is empty".into()));
        }
        let api_key = config
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            tracing::debug!("no API key configured for the intent service");
        }
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ResolutionError::Config(e.without_url().to_string()))?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
            client,
        })
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    fn request_body(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Value {
        let messages: Vec<Value> = messages.iter().map(encode_message).collect();
        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "response_format": {"type": "json_object"},
        });
        if !tools.is_empty() {
            let tools: Vec<Value> = tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = Value::Array(tools);
        }
        body
    }
}

fn encode_message(message: &ChatMessage) -> Value {
    match message {
        ChatMessage::System(text) => json!({"role": "system", "content": text}),
        ChatMessage::User(text) => json!({"role": "user", "content": text}),
        ChatMessage::ToolRequest(calls) => {
            let calls: Vec<Value> = calls
                .iter()
                .map(|c| {
                    json!({
                        "id": c.id,
                        "type": "function",
                        "function": {"name": c.name, "arguments": c.arguments.to_string()},
                    })
                })
                .collect();
            json!({"role": "assistant", "content": Value::Null, "tool_calls": calls})
        }
        ChatMessage::ToolResult { call_id, content } => {
            json!({"role": "tool", "tool_call_id": call_id, "content": content})
        }
    }
}

#[derive(Deserialize)]
struct RespBody {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: RespMessage,
}

#[derive(Deserialize)]
struct RespMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<RespToolCall>,
}

#[derive(Deserialize)]
struct RespToolCall {
    id: String,
    function: RespFunction,
}

#[derive(Deserialize)]
struct RespFunction {
    name: String,
    /// JSON-encoded arguments object.
    #[serde(default)]
    arguments: String,
}

fn decode_completion(body: RespBody) -> Result<Completion> {
    let message = body
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| ResolutionError::Malformed("no choices in response".into()))?;

    if !message.tool_calls.is_empty() {
        let calls = message
            .tool_calls
            .into_iter()
            .map(|c| {
                let arguments = if c.function.arguments.trim().is_empty() {
                    json!({})
                } else {
                    serde_json::from_str(&c.function.arguments).map_err(|e| {
                        ResolutionError::Malformed(format!("tool arguments: {}", e))
                    })?
                };
                Ok(ToolCall {
                    id: c.id,
                    name: c.function.name,
                    arguments,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        return Ok(Completion::ToolCalls(calls));
    }

    match message.content {
        Some(text) if !text.trim().is_empty() => Ok(Completion::Text(text)),
        _ => Err(ResolutionError::Malformed("empty message content".into())),
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<Completion> {
        let body = self.request_body(messages, tools);
        let start = std::time::Instant::now();

        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| ResolutionError::Network(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "intent service rejected the request");
            return Err(ResolutionError::Status(status.as_u16()));
        }

        let body: RespBody = resp
            .json()
            .await
            .map_err(|e| ResolutionError::Malformed(e.without_url().to_string()))?;
        tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "completion received");
        decode_completion(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HttpCompletionClient {
        let config = ResolverConfig {
            endpoint: format!("{}/v1/chat/completions", server.uri()),
            api_key_env: None,
            ..ResolverConfig::default()
        };
        HttpCompletionClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_text_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"kind\":\"chat\",\"verbalResponse\":\"Hello.\"}"}}]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).with_api_key("test-key");
        let out = client
            .complete(&[ChatMessage::User("hi".into())], &[])
            .await
            .unwrap();
        match out {
            Completion::Text(text) => assert!(text.contains("\"kind\":\"chat\"")),
            other => panic!("unexpected completion {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tool_call_arguments_are_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_9",
                        "type": "function",
                        "function": {"name": "getCurrentTime", "arguments": "{\"location\":\"Tokyo\"}"}
                    }]
                }}]
            })))
            .mount(&server)
            .await;

        let out = client_for(&server)
            .complete(&[ChatMessage::User("what time is it in Tokyo".into())], &crate::tools::tool_specs())
            .await
            .unwrap();
        match out {
            Completion::ToolCalls(calls) => {
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].id, "call_9");
                assert_eq!(calls[0].name, "getCurrentTime");
                assert_eq!(calls[0].arguments["location"], "Tokyo");
            }
            other => panic!("unexpected completion {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete(&[ChatMessage::User("hi".into())], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ResolutionError::Status(503)));
    }

    #[tokio::test]
    async fn test_garbage_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete(&[ChatMessage::User("hi".into())], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ResolutionError::Malformed(_)));
    }

    #[test]
    fn test_request_encodes_tool_round() {
        let config = ResolverConfig {
            api_key_env: None,
            ..ResolverConfig::default()
        };
        let client = HttpCompletionClient::new(&config).unwrap();
        let body = client.request_body(
            &[
                ChatMessage::System("rules".into()),
                ChatMessage::ToolRequest(vec![ToolCall {
                    id: "c1".into(),
                    name: "getCurrentTime".into(),
                    arguments: json!({"location": "Paris"}),
                }]),
                ChatMessage::ToolResult {
                    call_id: "c1".into(),
                    content: "It is noon.".into(),
                },
            ],
            &crate::tools::tool_specs(),
        );
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["messages"][1]["tool_calls"][0]["function"]["arguments"], "{\"location\":\"Paris\"}");
        assert_eq!(body["messages"][2]["role"], "tool");
        assert_eq!(body["messages"][2]["tool_call_id"], "c1");
    }
}
