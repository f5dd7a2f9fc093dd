//! Document identity helpers: keys, language tags, and range slicing.

use std::path::{Component, Path, PathBuf};

use crate::model::{Anchor, DocumentRef, Position};

/// Derive the key a snippet is grouped under.
///
/// Paths below `root` become root-relative with `/` separators; anything else
/// (no root, outside the root, non-file URIs) keeps its absolute identifier.
pub fn document_key(id: &str, root: Option<&Path>) -> String {
    if let Some(root) = root {
        if let Ok(rel) = Path::new(id).strip_prefix(root) {
            let parts: Vec<String> = rel
                .components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect();
            if !parts.is_empty() {
                return parts.join("/");
            }
        }
    }
    id.to_string()
}

/// Reverse of [`document_key`] for keys that name files.
pub fn resolve_document_key(key: &str, root: Option<&Path>) -> PathBuf {
    let path = Path::new(key);
    match root {
        Some(root) if path.is_relative() => root.join(path),
        _ => path.to_path_buf(),
    }
}

/// Language tag for fenced code: declared language, else file extension, else `text`
pub fn language_tag(doc: &DocumentRef) -> String {
    if let Some(lang) = doc.language_id.as_deref().filter(|l| !l.is_empty()) {
        return lang.to_string();
    }
    let ext = Path::new(&doc.id)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase());
    match ext.as_deref() {
        Some("rs") => "rust",
        Some("ts") | Some("mts") | Some("cts") => "typescript",
        Some("tsx") => "typescriptreact",
        Some("js") | Some("mjs") | Some("cjs") => "javascript",
        Some("jsx") => "javascriptreact",
        Some("py") => "python",
        Some("rb") => "ruby",
        Some("go") => "go",
        Some("md") => "markdown",
        Some("sh") | Some("bash") => "shell",
        Some("yml") => "yaml",
        Some("h") => "c",
        Some("hpp") | Some("cc") | Some("cxx") => "cpp",
        Some(other) if !other.is_empty() => return other.to_string(),
        _ => "text",
    }
    .to_string()
}

/// Byte offset of an LSP-style position (UTF-16 character offset).
///
/// Positions past the end of a line clamp to the line end; lines past the end
/// of the text clamp to the text end.
fn byte_offset(text: &str, pos: Position) -> usize {
    let mut line_start = 0;
    for _ in 0..pos.line {
        match text[line_start..].find('\n') {
            Some(i) => line_start += i + 1,
            None => return text.len(),
        }
    }
    let line = &text[line_start..];
    let line_end = line.find('\n').unwrap_or(line.len());
    let mut units = 0u32;
    for (i, ch) in line[..line_end].char_indices() {
        if units >= pos.character {
            return line_start + i;
        }
        units += ch.len_utf16() as u32;
    }
    line_start + line_end
}

/// Text covered by `anchor`, or an empty string for an inverted range
pub fn slice(text: &str, anchor: Anchor) -> &str {
    let start = byte_offset(text, anchor.start);
    let end = byte_offset(text, anchor.end);
    if start >= end {
        return "";
    }
    &text[start..end]
}
