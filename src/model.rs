use serde::{Deserialize, Serialize};

/// Identifier of a snippet, unique within one store's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnippetId(pub u64);

impl std::fmt::Display for SnippetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Zero-based line/character position in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Range of a document a snippet was captured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Anchor {
    pub start: Position,
    pub end: Position,
}

impl Anchor {
    pub fn new(start_line: u32, start_char: u32, end_line: u32, end_char: u32) -> Self {
        Self {
            start: Position::new(start_line, start_char),
            end: Position::new(end_line, end_char),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `pos` lies within the anchor (both ends inclusive)
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }
}

/// A collected piece of source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: SnippetId,
    pub document_key: String,
    pub code: String,
    pub language_tag: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub anchor: Anchor,
}

impl Snippet {
    /// Explanation text, if present and not blank
    pub fn explanation_text(&self) -> Option<&str> {
        self.explanation
            .as_deref()
            .filter(|e| !e.trim().is_empty())
    }
}

/// Everything needed to create a snippet; the store assigns the id
#[derive(Debug, Clone)]
pub struct NewSnippet {
    pub document_key: String,
    pub code: String,
    pub language_tag: String,
    pub anchor: Anchor,
    pub description: String,
    pub explanation: Option<String>,
}

/// A host document: absolute identifier (path or URI) plus declared language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_id: Option<String>,
}

impl DocumentRef {
    pub fn new(id: impl Into<String>, language_id: Option<&str>) -> Self {
        Self {
            id: id.into(),
            language_id: language_id.map(|s| s.to_string()),
        }
    }
}

/// A non-empty selection reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub document: DocumentRef,
    pub anchor: Anchor,
    pub text: String,
}

/// Result of a successful export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub destination: std::path::PathBuf,
    pub exported: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_contains_is_inclusive() {
        let anchor = Anchor::new(3, 4, 5, 2);
        assert!(anchor.contains(Position::new(3, 4)));
        assert!(anchor.contains(Position::new(4, 100)));
        assert!(anchor.contains(Position::new(5, 2)));
        assert!(!anchor.contains(Position::new(3, 3)));
        assert!(!anchor.contains(Position::new(5, 3)));
    }

    #[test]
    fn blank_explanation_is_none() {
        let snippet = Snippet {
            id: SnippetId(0),
            document_key: "a.rs".to_string(),
            code: "fn a() {}".to_string(),
            language_tag: "rust".to_string(),
            description: "A".to_string(),
            explanation: Some("  \n ".to_string()),
            anchor: Anchor::new(0, 0, 0, 9),
        };
        assert_eq!(snippet.explanation_text(), None);
    }

    #[test]
    fn snippet_json_uses_camel_case() {
        let snippet = Snippet {
            id: SnippetId(7),
            document_key: "src/lib.rs".to_string(),
            code: "x".to_string(),
            language_tag: "rust".to_string(),
            description: "d".to_string(),
            explanation: None,
            anchor: Anchor::new(1, 0, 1, 1),
        };
        let json = serde_json::to_value(&snippet).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["documentKey"], "src/lib.rs");
        assert_eq!(json["languageTag"], "rust");
        assert!(json.get("explanation").is_none());
        assert_eq!(json["anchor"]["end"]["character"], 1);
    }
}
