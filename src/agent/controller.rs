//! Bounded request/response loop between the model and the edit tool.

use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};

use crate::agent::instructions;
use crate::agent::model::{
    edit_tool_schema, Message, ModelClient, ModelRequest, EDIT_TOOL_NAME,
};
use crate::document::editor::DocumentEditor;
use crate::document::DocumentSink;
use crate::Result;

/// One content-edit invocation.
#[derive(Debug, Clone)]
pub struct EditRequest {
    /// What the user asked for.
    pub instruction: String,
    /// Document content the agent starts from.
    pub current_markdown: String,
    /// Optional selection the edit should focus on (advisory).
    pub selected_text: Option<String>,
    /// Organization identifier, used to scope memory lookups.
    pub organization_id: String,
}

/// Drives a bounded conversation between a model and the edit tool.
///
/// The turn ceiling guarantees termination even if the model requests
/// tool calls indefinitely; hitting it is not an error — the loop
/// returns whatever document state exists at that point.
pub struct AgentLoop<'a> {
    model: &'a dyn ModelClient,
    turn_ceiling: u32,
}

impl<'a> AgentLoop<'a> {
    /// Create a loop bound to a model client and a turn ceiling.
    #[must_use]
    pub fn new(model: &'a dyn ModelClient, turn_ceiling: u32) -> Self {
        Self {
            model,
            turn_ceiling,
        }
    }

    /// Run the loop to completion and return the final document text.
    ///
    /// Tool-level failures are returned to the model as tool results;
    /// only model/transport failures surface here.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Model`](crate::AppError::Model) when a model
    /// invocation fails.
    pub async fn run(&self, request: EditRequest, sink: Arc<dyn DocumentSink>) -> Result<String> {
        let span = info_span!(
            "agent_loop",
            organization_id = %request.organization_id,
            turn_ceiling = self.turn_ceiling,
        );

        async move {
            let mut editor = DocumentEditor::new(request.current_markdown, sink);
            let system = instructions::system_instruction(request.selected_text.as_deref());
            let mut messages = vec![Message::user(request.instruction)];

            for turn in 0..self.turn_ceiling {
                let response = self
                    .model
                    .complete(ModelRequest {
                        system: system.clone(),
                        messages: messages.clone(),
                        tools: vec![edit_tool_schema()],
                        scope: Some(request.organization_id.clone()),
                    })
                    .await?;

                let tool_calls = response.tool_calls.clone();
                messages.push(Message::Assistant {
                    content: response.text,
                    tool_calls: tool_calls.clone(),
                });

                if tool_calls.is_empty() {
                    debug!(turn, "model finished without tool calls");
                    return Ok(editor.into_markdown());
                }

                for call in tool_calls {
                    let outcome = if call.name == EDIT_TOOL_NAME {
                        editor.execute_args(&call.arguments)
                    } else {
                        warn!(tool = %call.name, "model called an undeclared tool");
                        crate::document::editor::EditOutcome {
                            message: format!(
                                "Error: unknown tool \"{}\". Only {EDIT_TOOL_NAME} is available.",
                                call.name
                            ),
                            failure: Some(crate::document::editor::EditFailure::InvalidInput),
                        }
                    };
                    messages.push(Message::tool_result(call.id, outcome.message));
                }
            }

            info!(
                turn_ceiling = self.turn_ceiling,
                "turn ceiling reached; returning current document state"
            );
            Ok(editor.into_markdown())
        }
        .instrument(span)
        .await
    }
}
