//! Command dispatcher for the virtual document edit tool.
//!
//! Executes `view`, `str_replace`, and `insert` commands against a
//! [`VirtualDocument`]. Every failure here is recoverable: outcomes are
//! returned as data to the calling model so it can self-correct, never
//! raised as an [`AppError`](crate::AppError).

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use super::{DocumentSink, VirtualDocument, DOCUMENT_PATH};

/// Classification of a recoverable edit failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditFailure {
    /// The command addressed a path other than the canonical virtual file.
    InvalidPath,
    /// `old_str` did not occur in the document.
    NotFound,
    /// `old_str` occurred more than once.
    Ambiguous,
    /// `insert_line` fell outside `0..=line_count`.
    OutOfRange,
    /// A required argument was missing or empty.
    MissingArgument,
    /// The command name was not recognized, or the arguments were not
    /// well-formed JSON for the tool schema.
    InvalidInput,
}

/// Outcome of a single tool command, returned to the model as text.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    /// Human-readable result message fed back into the conversation.
    pub message: String,
    /// `None` on success, otherwise the failure classification.
    pub failure: Option<EditFailure>,
}

impl EditOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            failure: None,
        }
    }

    fn fail(failure: EditFailure, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            failure: Some(failure),
        }
    }

    /// Whether the command succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Raw tool-call arguments as produced by the model.
#[derive(Debug, Clone, Deserialize)]
pub struct EditToolInput {
    /// Command name: `view`, `str_replace`, or `insert`.
    pub command: String,
    /// Virtual file path; only [`DOCUMENT_PATH`] is accepted.
    pub path: String,
    /// For `str_replace`: the exact text to find.
    #[serde(default)]
    pub old_str: Option<String>,
    /// For `str_replace` / `insert`: the new text.
    #[serde(default)]
    pub new_str: Option<String>,
    /// For `insert`: the 1-based line after which to insert (0 = before
    /// the first line).
    #[serde(default)]
    pub insert_line: Option<i64>,
}

/// Stateful dispatcher binding a [`VirtualDocument`] to an update sink.
pub struct DocumentEditor {
    document: VirtualDocument,
    sink: Arc<dyn DocumentSink>,
}

impl DocumentEditor {
    /// Create an editor over the given initial markdown.
    #[must_use]
    pub fn new(initial_markdown: impl Into<String>, sink: Arc<dyn DocumentSink>) -> Self {
        Self {
            document: VirtualDocument::new(initial_markdown),
            sink,
        }
    }

    /// Current document state.
    #[must_use]
    pub fn document(&self) -> &VirtualDocument {
        &self.document
    }

    /// Consume the editor, returning the final markdown.
    #[must_use]
    pub fn into_markdown(self) -> String {
        self.document.into_text()
    }

    /// Parse raw JSON tool-call arguments and execute the command.
    ///
    /// Malformed arguments produce a recoverable outcome, not an error.
    pub fn execute_args(&mut self, args: &serde_json::Value) -> EditOutcome {
        match EditToolInput::deserialize(args) {
            Ok(input) => self.execute(&input),
            Err(err) => EditOutcome::fail(
                EditFailure::InvalidInput,
                format!("Error: invalid tool arguments: {err}"),
            ),
        }
    }

    /// Execute a validated tool input. Path is checked before dispatch.
    pub fn execute(&mut self, input: &EditToolInput) -> EditOutcome {
        if input.path != DOCUMENT_PATH {
            return EditOutcome::fail(
                EditFailure::InvalidPath,
                format!(
                    "Error: Only \"{DOCUMENT_PATH}\" is available. \
                     Use path \"{DOCUMENT_PATH}\" to access the editor content."
                ),
            );
        }

        let outcome = match input.command.as_str() {
            "view" => self.view(),
            "str_replace" => {
                let Some(old_str) = non_empty(input.old_str.as_deref()) else {
                    return EditOutcome::fail(
                        EditFailure::MissingArgument,
                        "Error: old_str is required for str_replace command.",
                    );
                };
                let Some(new_str) = input.new_str.as_deref() else {
                    return EditOutcome::fail(
                        EditFailure::MissingArgument,
                        "Error: new_str is required for str_replace command.",
                    );
                };
                self.replace(old_str, new_str)
            }
            "insert" => {
                let Some(insert_line) = input.insert_line else {
                    return EditOutcome::fail(
                        EditFailure::MissingArgument,
                        "Error: insert_line is required for insert command.",
                    );
                };
                let Some(new_str) = input.new_str.as_deref() else {
                    return EditOutcome::fail(
                        EditFailure::MissingArgument,
                        "Error: new_str is required for insert command.",
                    );
                };
                self.insert(insert_line, new_str)
            }
            other => EditOutcome::fail(
                EditFailure::InvalidInput,
                format!(
                    "Error: Unknown command \"{other}\". \
                     Supported commands: view, str_replace, insert."
                ),
            ),
        };

        debug!(
            command = %input.command,
            success = outcome.is_success(),
            "edit tool command executed"
        );
        outcome
    }

    /// `view` — return the full text with 1-based line numbers.
    fn view(&self) -> EditOutcome {
        EditOutcome::ok(self.document.numbered())
    }

    /// `str_replace` — replace a unique occurrence of `old_str`.
    ///
    /// The uniqueness rule is the core correctness invariant: a zero or
    /// multiple match leaves the document untouched, so the model can
    /// never silently corrupt unrelated text sharing a substring.
    fn replace(&mut self, old_str: &str, new_str: &str) -> EditOutcome {
        let occurrences = self.document.text().matches(old_str).count();

        if occurrences == 0 {
            return EditOutcome::fail(
                EditFailure::NotFound,
                "Error: old_str not found in document. Make sure the text matches \
                 exactly, including whitespace and line breaks. Use the view command \
                 to see the current content.",
            );
        }
        if occurrences > 1 {
            return EditOutcome::fail(
                EditFailure::Ambiguous,
                format!(
                    "Error: old_str found {occurrences} times. Please provide a more \
                     unique string that appears exactly once. Include more surrounding \
                     context to make it unique."
                ),
            );
        }

        let updated = self.document.text().replacen(old_str, new_str, 1);
        self.document.set_text(updated);
        self.sink.document_updated(self.document.text());

        EditOutcome::ok("Successfully replaced text. The document has been updated.")
    }

    /// `insert` — splice `new_str` as a new line after `insert_line`.
    fn insert(&mut self, insert_line: i64, new_str: &str) -> EditOutcome {
        let line_count = self.document.line_count();
        let Ok(index) = usize::try_from(insert_line) else {
            return EditOutcome::fail(
                EditFailure::OutOfRange,
                out_of_range_message(insert_line, line_count),
            );
        };
        if index > line_count {
            return EditOutcome::fail(
                EditFailure::OutOfRange,
                out_of_range_message(insert_line, line_count),
            );
        }

        let mut lines: Vec<&str> = self.document.text().split('\n').collect();
        lines.insert(index, new_str);
        let updated = lines.join("\n");
        self.document.set_text(updated);
        self.sink.document_updated(self.document.text());

        EditOutcome::ok(format!("Successfully inserted text after line {insert_line}."))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

fn out_of_range_message(insert_line: i64, line_count: usize) -> String {
    format!(
        "Error: insert_line {insert_line} is out of range. Document has \
         {line_count} lines. Use a value between 0 and {line_count}."
    )
}
