//! Model gateway client over an `OpenAI`-compatible chat-completions API.
//!
//! The organization identifier travels as a memory-scope header so the
//! gateway can attach org-scoped long-term memory to the invocation.

use std::future::Future;
use std::pin::Pin;

use serde_json::{json, Value};
use tracing::debug;

use crate::agent::model::{Message, ModelClient, ModelRequest, ModelResponse, ToolCall};
use crate::config::GatewayConfig;
use crate::stream::decode_text_stream;
use crate::{AppError, Result};

/// Header carrying the memory scope (organization id).
const MEMORY_SCOPE_HEADER: &str = "x-memory-scope";

/// HTTP client for the model gateway.
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GatewayClient {
    /// Build a client from configuration and the loaded API key.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Model` if the HTTP client cannot be constructed.
    pub fn new(config: &GatewayConfig, api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| AppError::Model(format!("failed to build http client: {err}")))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn request_builder(&self, request: &ModelRequest) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key);
        if let Some(scope) = &request.scope {
            builder = builder.header(MEMORY_SCOPE_HEADER, scope);
        }
        builder
    }

    fn payload(&self, request: &ModelRequest, stream: bool) -> Value {
        let mut messages = vec![json!({"role": "system", "content": request.system})];
        for message in &request.messages {
            messages.push(wire_message(message));
        }

        let mut payload = json!({
            "model": self.model,
            "messages": messages,
        });
        if !request.tools.is_empty() {
            payload["tools"] = Value::Array(
                request
                    .tools
                    .iter()
                    .map(|tool| {
                        json!({
                            "type": "function",
                            "function": {
                                "name": tool.name,
                                "description": tool.description,
                                "parameters": tool.parameters,
                            }
                        })
                    })
                    .collect(),
            );
        }
        if stream {
            payload["stream"] = Value::Bool(true);
        }
        payload
    }
}

/// Convert a conversation message into the wire representation.
fn wire_message(message: &Message) -> Value {
    match message {
        Message::User { content } => json!({"role": "user", "content": content}),
        Message::Assistant {
            content,
            tool_calls,
        } => {
            let mut value = json!({"role": "assistant", "content": content});
            if !tool_calls.is_empty() {
                value["tool_calls"] = Value::Array(
                    tool_calls
                        .iter()
                        .map(|call| {
                            json!({
                                "id": call.id,
                                "type": "function",
                                "function": {
                                    "name": call.name,
                                    "arguments": call.arguments.to_string(),
                                }
                            })
                        })
                        .collect(),
                );
            }
            value
        }
        Message::ToolResult { call_id, content } => {
            json!({"role": "tool", "tool_call_id": call_id, "content": content})
        }
    }
}

/// Extract the first choice's message from a chat-completions response.
fn parse_response(body: &Value) -> Result<ModelResponse> {
    let message = body
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| AppError::Model("response carried no choices".into()))?;

    let text = message
        .get("content")
        .and_then(Value::as_str)
        .filter(|content| !content.is_empty())
        .map(str::to_owned);

    let tool_calls = message
        .get("tool_calls")
        .and_then(Value::as_array)
        .map(|calls| calls.iter().filter_map(parse_tool_call).collect())
        .unwrap_or_default();

    Ok(ModelResponse { text, tool_calls })
}

fn parse_tool_call(value: &Value) -> Option<ToolCall> {
    let id = value.get("id")?.as_str()?.to_owned();
    let function = value.get("function")?;
    let name = function.get("name")?.as_str()?.to_owned();
    // Providers send arguments as a JSON-encoded string. A string that
    // fails to parse still reaches the tool (as null) so the model gets
    // a recoverable outcome instead of a dropped call.
    let arguments = function
        .get("arguments")
        .and_then(Value::as_str)
        .and_then(|args| serde_json::from_str(args).ok())
        .unwrap_or(Value::Null);
    Some(ToolCall {
        id,
        name,
        arguments,
    })
}

impl ModelClient for GatewayClient {
    fn complete(
        &self,
        request: ModelRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ModelResponse>> + Send + '_>> {
        Box::pin(async move {
            let payload = self.payload(&request, false);
            debug!(model = %self.model, messages = request.messages.len(), "model completion");

            let response = self
                .request_builder(&request)
                .json(&payload)
                .send()
                .await
                .map_err(|err| AppError::Model(format!("gateway request failed: {err}")))?
                .error_for_status()
                .map_err(|err| AppError::Model(format!("gateway returned failure: {err}")))?;

            let body: Value = response
                .json()
                .await
                .map_err(|err| AppError::Model(format!("invalid gateway response: {err}")))?;
            parse_response(&body)
        })
    }

    fn stream_text(
        &self,
        request: ModelRequest,
        on_update: Box<dyn Fn(&str) + Send>,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        Box::pin(async move {
            let payload = self.payload(&request, true);
            debug!(model = %self.model, "streaming model completion");

            let response = self
                .request_builder(&request)
                .json(&payload)
                .send()
                .await
                .map_err(|err| AppError::Model(format!("gateway request failed: {err}")))?
                .error_for_status()
                .map_err(|err| AppError::Model(format!("gateway returned failure: {err}")))?;

            let body = Box::pin(response.bytes_stream());
            decode_text_stream(body, move |snapshot| on_update(snapshot)).await
        })
    }
}
