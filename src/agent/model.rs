//! Model invocation abstraction.
//!
//! The [`ModelClient`] trait decouples the agent loop and the workflow
//! steps from the concrete gateway transport, so the core stays testable
//! with scripted fakes. All transport failures are fatal
//! (`AppError::Model`) and propagate to the request boundary uncaught.

use std::future::Future;
use std::pin::Pin;

use serde_json::json;

use crate::document::DOCUMENT_PATH;
use crate::Result;

/// Wire name of the document edit tool.
pub const EDIT_TOOL_NAME: &str = "str_replace_based_edit_tool";

/// One message in the running conversation.
#[derive(Debug, Clone)]
pub enum Message {
    /// Instruction from the caller.
    User {
        /// Message text.
        content: String,
    },
    /// A model turn: optional text plus any tool calls it requested.
    Assistant {
        /// Plain text produced by the model, if any.
        content: Option<String>,
        /// Tool calls requested this turn, in request order.
        tool_calls: Vec<ToolCall>,
    },
    /// Result of one executed tool call, fed back to the model.
    ToolResult {
        /// Identifier of the tool call this answers.
        call_id: String,
        /// Outcome message (success or recoverable failure).
        content: String,
    },
}

impl Message {
    /// Shorthand for a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Shorthand for a tool result message.
    #[must_use]
    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::ToolResult {
            call_id: call_id.into(),
            content: content.into(),
        }
    }
}

/// A structured tool-call request from the model.
#[derive(Debug, Clone)]
pub struct ToolCall {
    /// Provider-assigned call identifier.
    pub id: String,
    /// Tool name the model addressed.
    pub name: String,
    /// Raw JSON arguments; validated by the tool, not here.
    pub arguments: serde_json::Value,
}

/// Declared shape of a tool offered to the model.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    /// Tool name.
    pub name: String,
    /// Natural-language description shown to the model.
    pub description: String,
    /// JSON schema of the accepted arguments.
    pub parameters: serde_json::Value,
}

/// A single model invocation.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// System instruction for this invocation.
    pub system: String,
    /// Conversation so far.
    pub messages: Vec<Message>,
    /// Tools the model may call; empty for plain-text requests.
    pub tools: Vec<ToolSchema>,
    /// Identifier scoping any long-term memory lookup (organization id).
    pub scope: Option<String>,
}

/// What the model produced for one turn.
#[derive(Debug, Clone, Default)]
pub struct ModelResponse {
    /// Plain text, if the model produced any.
    pub text: Option<String>,
    /// Tool calls, in the order the model requested them. Empty means
    /// the model is done and the loop terminates.
    pub tool_calls: Vec<ToolCall>,
}

/// Interface between the core and a language model provider.
pub trait ModelClient: Send + Sync {
    /// Run one non-streaming model turn.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Model`](crate::AppError::Model) on any
    /// transport or provider failure.
    fn complete(
        &self,
        request: ModelRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ModelResponse>> + Send + '_>>;

    /// Run a streaming text turn, emitting full-accumulator snapshots to
    /// `on_update` as deltas arrive, and return the final text.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Model`](crate::AppError::Model) on any
    /// transport or provider failure.
    fn stream_text(
        &self,
        request: ModelRequest,
        on_update: Box<dyn Fn(&str) + Send>,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>>;
}

/// Schema of the document edit tool (`view` / `str_replace` / `insert`).
#[must_use]
pub fn edit_tool_schema() -> ToolSchema {
    ToolSchema {
        name: EDIT_TOOL_NAME.to_owned(),
        description: format!(
            "A text editor tool for viewing and modifying the document content.\n\
             Use path \"{DOCUMENT_PATH}\" for all commands.\n\
             Commands:\n\
             - view: View the current document with line numbers\n\
             - str_replace: Replace exact text (old_str) with new text (new_str). \
             The old_str must be unique.\n\
             - insert: Insert new_str after a specific line number (insert_line)"
        ),
        parameters: json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "enum": ["view", "str_replace", "insert"],
                    "description": "The command to execute"
                },
                "path": {
                    "type": "string",
                    "description": format!("The file path (always use \"{DOCUMENT_PATH}\")")
                },
                "old_str": {
                    "type": "string",
                    "description": "For str_replace: the exact text to find and replace"
                },
                "new_str": {
                    "type": "string",
                    "description": "For str_replace/insert: the new text"
                },
                "insert_line": {
                    "type": "integer",
                    "description": "For insert: the line number after which to insert"
                }
            },
            "required": ["command", "path"]
        }),
    }
}
