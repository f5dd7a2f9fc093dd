//! LSP server exposing the snippet collector to editors.
//!
//! The LSP client plays the host: prompts, range marks and inline selection
//! actions travel over a small custom protocol (see [`protocol`]), while
//! code actions, commands, hover and code lens use standard LSP requests.

mod commands;
mod host;
mod hover;
pub mod protocol;
mod server;

pub use server::serve_stdio;

use tower_lsp::lsp_types::{Position as LspPosition, Range, Url};

use crate::model::{Anchor, DocumentRef, Position};

pub(crate) fn to_range(anchor: Anchor) -> Range {
    Range {
        start: LspPosition {
            line: anchor.start.line,
            character: anchor.start.character,
        },
        end: LspPosition {
            line: anchor.end.line,
            character: anchor.end.character,
        },
    }
}

pub(crate) fn to_anchor(range: Range) -> Anchor {
    Anchor {
        start: to_position(range.start),
        end: to_position(range.end),
    }
}

pub(crate) fn to_position(pos: LspPosition) -> Position {
    Position::new(pos.line, pos.character)
}

/// Documents are identified by file path when they have one, else by URI
pub(crate) fn document_ref(uri: &Url, language_id: Option<&str>) -> DocumentRef {
    let id = if uri.scheme() == "file" {
        uri.to_file_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| uri.to_string())
    } else {
        uri.to_string()
    };
    DocumentRef::new(id, language_id)
}

/// Inverse of [`document_ref`]'s identifier
pub(crate) fn uri_for_id(id: &str) -> Option<Url> {
    let path = std::path::Path::new(id);
    if path.is_absolute() {
        return Url::from_file_path(path).ok();
    }
    Url::parse(id).ok()
}
