//! Shared fakes for integration tests.
//!
//! Provides a scripted model client and fetchers so individual test
//! modules can focus on behaviour rather than boilerplate.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use copydesk::agent::model::{ModelClient, ModelRequest, ModelResponse, ToolCall};
use copydesk::workflow::fetch::ContentFetcher;
use copydesk::{AppError, Result};

/// Model fake that replays a script of responses and records every
/// request it receives.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<ModelResponse>>,
    /// Response replayed when the script runs dry (defaults to an empty
    /// text-less turn, which terminates the agent loop).
    fallback: ModelResponse,
    requests: Mutex<Vec<ModelRequest>>,
    stream_text: Option<String>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<ModelResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            fallback: ModelResponse::default(),
            requests: Mutex::new(Vec::new()),
            stream_text: None,
        }
    }

    /// Replay `fallback` forever once the script is exhausted.
    pub fn with_fallback(mut self, fallback: ModelResponse) -> Self {
        self.fallback = fallback;
        self
    }

    /// Canned text returned by `stream_text`.
    pub fn with_stream_text(mut self, text: impl Into<String>) -> Self {
        self.stream_text = Some(text.into());
        self
    }

    /// All requests seen so far, in order.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl ModelClient for ScriptedModel {
    fn complete(
        &self,
        request: ModelRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ModelResponse>> + Send + '_>> {
        self.requests.lock().expect("requests lock").push(request);
        let response = self
            .responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        Box::pin(async move { Ok(response) })
    }

    fn stream_text(
        &self,
        request: ModelRequest,
        on_update: Box<dyn Fn(&str) + Send>,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        self.requests.lock().expect("requests lock").push(request);
        let text = self.stream_text.clone();
        Box::pin(async move {
            let text = text.ok_or_else(|| AppError::Model("no stream scripted".into()))?;
            on_update(&text);
            Ok(text)
        })
    }
}

/// Model fake whose every call fails fatally.
pub struct FailingModel;

impl ModelClient for FailingModel {
    fn complete(
        &self,
        _request: ModelRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ModelResponse>> + Send + '_>> {
        Box::pin(async { Err(AppError::Model("gateway unreachable".into())) })
    }

    fn stream_text(
        &self,
        _request: ModelRequest,
        _on_update: Box<dyn Fn(&str) + Send>,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        Box::pin(async { Err(AppError::Model("gateway unreachable".into())) })
    }
}

/// Fetcher returning the same canned content for any URL.
pub struct CannedFetcher(pub String);

impl ContentFetcher for CannedFetcher {
    fn fetch(&self, _url: &str) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        let content = self.0.clone();
        Box::pin(async move { Ok(content) })
    }
}

/// Fetcher whose every call fails.
pub struct FailingFetcher;

impl ContentFetcher for FailingFetcher {
    fn fetch(&self, url: &str) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        let url = url.to_owned();
        Box::pin(async move { Err(AppError::Fetch(format!("{url} unreachable"))) })
    }
}

/// A text-only model turn.
pub fn text_response(text: &str) -> ModelResponse {
    ModelResponse {
        text: Some(text.to_owned()),
        tool_calls: Vec::new(),
    }
}

/// A turn consisting of edit-tool calls with the given raw arguments.
pub fn tool_call_response(calls: Vec<(&str, serde_json::Value)>) -> ModelResponse {
    ModelResponse {
        text: None,
        tool_calls: calls
            .into_iter()
            .enumerate()
            .map(|(index, (name, arguments))| ToolCall {
                id: format!("call_{index}"),
                name: name.to_owned(),
                arguments,
            })
            .collect(),
    }
}
