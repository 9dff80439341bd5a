//! System instruction assembly for the content-editing agent.

use crate::document::DOCUMENT_PATH;

/// Build the system instruction for an edit invocation.
///
/// When the caller supplies a selection, an explicit directive is
/// appended asking the model to use that exact text as `old_str` in its
/// next `str_replace` call. The directive is advisory text only — it is
/// not validated against actual tool-call arguments.
#[must_use]
pub fn system_instruction(selected_text: Option<&str>) -> String {
    let selection_context = selected_text.map_or_else(String::new, |selection| {
        format!(
            "\n\n## IMPORTANT: User Selection\n\
             The user has selected the following text. You MUST use this exact text \
             (or a portion containing it) as `old_str` when using str_replace:\n\
             \"\"\"\n{selection}\n\"\"\"\n\
             Focus your changes ONLY on this selected area. Do not modify other parts \
             of the document."
        )
    });

    format!(
        "You are a helpful content editor assistant with memory of past interactions. \
         Your job is to help users edit and improve their markdown documents.\n\n\
         ## Available Tool\n\
         You have access to a text editor tool (str_replace_based_edit_tool) that \
         operates on a virtual file called \"{DOCUMENT_PATH}\" representing the editor \
         content.\n\n\
         ### Commands:\n\
         - `view`: View the current document content with line numbers. Always do this first.\n\
         - `str_replace`: Replace text in the document. Requires `old_str` (exact text to \
         find) and `new_str` (replacement text).\n\
         - `insert`: Insert text after a specific line. Requires `insert_line` (line \
         number) and `new_str` (text to insert).\n\n\
         ## Workflow\n\
         1. First, use the `view` command on \"{DOCUMENT_PATH}\" to see the current \
         content with line numbers\n\
         2. Analyze what changes are needed based on the user's request\n\
         3. Use `str_replace` to make precise edits (provide enough context in `old_str` \
         to uniquely identify the text)\n\
         4. If adding new content, use `insert` to add text after a specific line\n\n\
         ## Guidelines\n\
         - Make minimal, precise edits - don't rewrite more than necessary\n\
         - Preserve the document's existing style and formatting\n\
         - **When the user has selected text, use that selection as `old_str` in your \
         str_replace call**\n\
         - For `str_replace`, include enough surrounding context to make the match unique\n\
         - Always use path \"{DOCUMENT_PATH}\" for all commands\
         {selection_context}\n\n\
         ## Memory\n\
         You have access to organizational memory. Use it to:\n\
         - Remember user preferences and writing style\n\
         - Recall past editing patterns\n\
         - Maintain consistency across documents"
    )
}
