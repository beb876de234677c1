//! HTTP client for OpenAI-compatible chat-completion endpoints.
//!
//! Targets local inference servers (llama.cpp, MLX, vLLM, Ollama) as well as
//! hosted OpenAI-compatible APIs.  Requests are non-streaming: the caller
//! waits for the whole completion, bounded by a generous timeout because
//! local inference can be slow.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Value, json};

use crate::error::{AgentError, Result};
use crate::llm::backend::ChatBackend;
use crate::llm::types::{ChatRequest, ReplyMessage, ToolCall};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default base URL: a local OpenAI-compatible server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/v1";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

// ---------------------------------------------------------------------------
// Client configuration
// ---------------------------------------------------------------------------

/// Configuration for connecting to a chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct LlmClientConfig {
    /// Base URL; requests go to `<base_url>/chat/completions`.
    pub base_url: String,
    /// Optional bearer token.  Local servers usually need none.
    pub api_key: Option<String>,
    /// Optional model identifier, sent as `model` when set.
    pub model: Option<String>,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl Default for LlmClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: None,
            model: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl LlmClientConfig {
    /// Create a configuration for an endpoint at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the bearer token.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// A chat-completion client.  Cheap to clone.
#[derive(Debug, Clone)]
pub struct LlmClient {
    config: Arc<LlmClientConfig>,
    http: reqwest::Client,
}

impl LlmClient {
    /// Create a new client with the given configuration.
    pub fn new(config: LlmClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::LlmRequestFailed {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    /// The full URL requests are posted to.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Send a request and parse the first choice's message.
    ///
    /// # Errors
    ///
    /// [`AgentError::LlmRequestFailed`] on transport failures and timeouts,
    /// [`AgentError::LlmStatus`] on a non-success status and
    /// [`AgentError::LlmParseFailed`] on a malformed body.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ReplyMessage> {
        let body = self.build_request_body(request)?;
        let url = self.endpoint();

        tracing::debug!(
            url = %url,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "sending LLM request"
        );

        let resp = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::LlmRequestFailed {
                reason: e.to_string(),
            })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| AgentError::LlmRequestFailed {
                reason: format!("failed to read response body: {e}"),
            })?;

        if !status.is_success() {
            return Err(AgentError::LlmStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        let v: Value = serde_json::from_str(&text).map_err(|e| AgentError::LlmParseFailed {
            reason: format!("invalid JSON response: {e}"),
        })?;

        parse_reply(&v)
    }

    /// Build the JSON body: the serialized request plus `model` when set.
    fn build_request_body(&self, request: &ChatRequest) -> Result<Value> {
        let mut body = serde_json::to_value(request)?;
        if let Some(model) = &self.config.model {
            body["model"] = json!(model);
        }
        Ok(body)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {key}")).map_err(|e| {
                AgentError::LlmRequestFailed {
                    reason: format!("invalid authorization header: {e}"),
                }
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }
}

#[async_trait]
impl ChatBackend for LlmClient {
    /// Never fails: every error becomes an `Error: ...` text reply.
    async fn complete(&self, request: &ChatRequest) -> ReplyMessage {
        match self.chat(request).await {
            Ok(reply) => reply,
            Err(AgentError::LlmStatus { status, body }) => {
                tracing::warn!(status, body = %body, "LLM endpoint returned an error status");
                ReplyMessage::error(status)
            }
            Err(e) => {
                tracing::warn!(error = %e, "LLM request failed");
                ReplyMessage::error(e)
            }
        }
    }
}

// ===========================================================================
// Response parsing
// ===========================================================================

/// Parse a chat-completion response body into the first choice's message.
///
/// `content`, `tool_calls` and `reasoning` are all optional; some servers
/// name the reasoning field `reasoning_content`.  Tool-call arguments are
/// kept as the raw JSON string; servers that send an object instead get it
/// re-encoded.
pub fn parse_reply(v: &Value) -> Result<ReplyMessage> {
    let message = &v["choices"][0]["message"];

    if !message.is_object() {
        return Err(AgentError::LlmParseFailed {
            reason: "missing `choices[0].message` in response".into(),
        });
    }

    let tool_calls = message["tool_calls"]
        .as_array()
        .map(|calls| calls.iter().map(parse_tool_call).collect())
        .unwrap_or_default();

    let reasoning = message["reasoning"]
        .as_str()
        .or_else(|| message["reasoning_content"].as_str())
        .map(str::to_owned);

    Ok(ReplyMessage {
        content: message["content"].as_str().map(str::to_owned),
        tool_calls,
        reasoning,
    })
}

fn parse_tool_call(tc: &Value) -> ToolCall {
    let func = &tc["function"];
    let arguments = match &func["arguments"] {
        Value::String(s) => s.clone(),
        Value::Null => "{}".to_owned(),
        other => other.to_string(),
    };

    ToolCall {
        id: tc["id"].as_str().map(str::to_owned),
        name: func["name"].as_str().unwrap_or_default().to_owned(),
        arguments,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::{Message, ToolDescriptor};

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn request() -> ChatRequest {
        ChatRequest {
            messages: vec![Message::system("You are helpful."), Message::user("Hello")],
            temperature: 0.7,
            max_tokens: 1000,
            tools: vec![],
        }
    }

    /// Serve exactly one canned HTTP response on a random local port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 64 * 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/v1")
    }

    // -- Request building ----------------------------------------------------

    #[test]
    fn endpoint_joins_base_url() {
        let client = LlmClient::new(LlmClientConfig::new("http://localhost:8000/v1/")).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8000/v1/chat/completions");
    }

    #[test]
    fn build_request_body_basic() {
        let client = LlmClient::new(LlmClientConfig::default()).unwrap();
        let body = client.build_request_body(&request()).unwrap();

        assert!(body.get("model").is_none());
        assert!(body.get("tools").is_none());
        assert_eq!(body["max_tokens"], 1000);
        let temp = body["temperature"].as_f64().unwrap();
        assert!((temp - 0.7).abs() < 1e-6, "temperature was {temp}");

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["content"], "Hello");
    }

    #[test]
    fn build_request_body_with_model_and_tools() {
        let client =
            LlmClient::new(LlmClientConfig::default().with_model("glm-4-flash")).unwrap();
        let mut req = request();
        req.tools = vec![ToolDescriptor::function(
            "get_time",
            "Get current time",
            serde_json::json!({"type": "object", "properties": {}}),
        )];

        let body = client.build_request_body(&req).unwrap();
        assert_eq!(body["model"], "glm-4-flash");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "get_time");
    }

    // -- Response parsing ----------------------------------------------------

    #[test]
    fn parse_text_response() {
        let v = serde_json::json!({
            "id": "chatcmpl-abc",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello there!"},
                "finish_reason": "stop"
            }]
        });

        let reply = parse_reply(&v).unwrap();
        assert_eq!(reply.content.as_deref(), Some("Hello there!"));
        assert!(reply.tool_calls.is_empty());
        assert!(reply.reasoning.is_none());
    }

    #[test]
    fn parse_tool_call_response_keeps_raw_arguments() {
        let v = serde_json::json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {
                            "id": "call_1",
                            "type": "function",
                            "function": {"name": "echo", "arguments": "{\"x\":\"hi\"}"}
                        },
                        {
                            "type": "function",
                            "function": {"name": "get_time", "arguments": {"tz": "UTC"}}
                        }
                    ]
                }
            }]
        });

        let reply = parse_reply(&v).unwrap();
        assert!(reply.content.is_none());
        assert_eq!(reply.tool_calls.len(), 2);
        assert_eq!(reply.tool_calls[0].id.as_deref(), Some("call_1"));
        assert_eq!(reply.tool_calls[0].name, "echo");
        assert_eq!(reply.tool_calls[0].arguments, "{\"x\":\"hi\"}");
        assert_eq!(reply.tool_calls[1].id, None);
        assert_eq!(reply.tool_calls[1].arguments, "{\"tz\":\"UTC\"}");
    }

    #[test]
    fn parse_reasoning_side_channel() {
        let v = serde_json::json!({
            "choices": [{"message": {"content": "", "reasoning": "thinking\nAnswer: 42"}}]
        });
        let reply = parse_reply(&v).unwrap();
        assert_eq!(reply.reasoning.as_deref(), Some("thinking\nAnswer: 42"));

        let v = serde_json::json!({
            "choices": [{"message": {"reasoning_content": "alt field"}}]
        });
        assert_eq!(parse_reply(&v).unwrap().reasoning.as_deref(), Some("alt field"));
    }

    #[test]
    fn parse_missing_message_fails() {
        let v = serde_json::json!({"error": {"message": "overloaded"}});
        assert!(matches!(
            parse_reply(&v),
            Err(AgentError::LlmParseFailed { .. })
        ));
    }

    // -- Transport -----------------------------------------------------------

    #[tokio::test]
    async fn complete_parses_success_body() {
        let base = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"pong"}}]}"#,
        )
        .await;
        let client = LlmClient::new(LlmClientConfig::new(base)).unwrap();

        let reply = client.complete(&request()).await;
        assert_eq!(reply.content_text(), "pong");
    }

    #[tokio::test]
    async fn complete_turns_bad_status_into_error_text() {
        let base = serve_once("503 Service Unavailable", r#"{"error":"busy"}"#).await;
        let client = LlmClient::new(LlmClientConfig::new(base)).unwrap();

        let err = client.chat(&request()).await.unwrap_err();
        assert!(matches!(err, AgentError::LlmStatus { status: 503, .. }));

        let base = serve_once("503 Service Unavailable", r#"{"error":"busy"}"#).await;
        let client = LlmClient::new(LlmClientConfig::new(base)).unwrap();
        let reply = client.complete(&request()).await;
        assert_eq!(reply.content_text(), "Error: 503");
    }

    #[tokio::test]
    async fn complete_turns_connection_failure_into_error_text() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = LlmClientConfig::new(format!("http://{addr}/v1"))
            .with_timeout(Duration::from_secs(5));
        let client = LlmClient::new(config).unwrap();

        let reply = client.complete(&request()).await;
        assert!(reply.content_text().starts_with("Error: "));
        assert!(reply.tool_calls.is_empty());
    }
}
