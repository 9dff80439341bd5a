//! In-memory virtual document edited by the agent.
//!
//! The document is addressed by a fixed symbolic path rather than a real
//! filesystem path, and is mutated only through the edit tool in
//! [`editor`]. Line numbering is 1-indexed and derived by splitting on
//! line breaks at read time — never cached.

pub mod editor;

/// The single canonical path the edit tool accepts.
pub const DOCUMENT_PATH: &str = "document.md";

/// Observer notified after every successful document mutation.
///
/// Receives the complete new text (not a diff), exactly once per
/// mutation. Implementations must not panic; callers use this for live
/// UI sync while the agent is still running.
pub trait DocumentSink: Send + Sync {
    /// Called with the full document text after a successful edit.
    fn document_updated(&self, markdown: &str);
}

impl<F> DocumentSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn document_updated(&self, markdown: &str) {
        self(markdown);
    }
}

/// Mutable text buffer representing the file an agent edits.
///
/// Owned by a single agent-loop invocation; there is exactly one writer
/// at a time by construction.
#[derive(Debug, Clone)]
pub struct VirtualDocument {
    text: String,
}

impl VirtualDocument {
    /// Create a document seeded with the caller-supplied content.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Current full text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of lines in the current text.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    /// Render the text with each line prefixed by its 1-based number.
    #[must_use]
    pub fn numbered(&self) -> String {
        self.text
            .split('\n')
            .enumerate()
            .map(|(i, line)| format!("{}: {line}", i + 1))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub(crate) fn set_text(&mut self, text: String) {
        self.text = text;
    }

    /// Consume the document, returning the final text.
    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }
}
