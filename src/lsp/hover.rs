//! Hover content formatting for the LSP server.

use crate::format::block_quote;
use crate::model::Snippet;

/// Format a collected snippet as markdown for a hover tooltip.
pub fn build_hover_content(snippet: &Snippet) -> String {
    let mut parts = vec![format!("**Snippet:** {}", snippet.description)];

    if let Some(explanation) = snippet.explanation_text() {
        parts.push(block_quote(explanation));
    }

    parts.push(format!(
        "*{}* | `{}` lines {}-{}",
        snippet.language_tag,
        snippet.document_key,
        snippet.anchor.start.line + 1,
        snippet.anchor.end.line + 1
    ));

    parts.join("\n\n")
}
