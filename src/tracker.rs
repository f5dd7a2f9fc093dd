//! Invalidation of snippets when their document is edited.
//!
//! Snippets never follow edits: a captured `code` is never re-read from the
//! live document. A policy only decides which snippets of an edited document
//! are dropped.

use serde::Deserialize;

use crate::model::{Anchor, Snippet};

/// A text mutation reported by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMutation {
    pub document_key: String,
    /// Edited range, when the host reports one
    pub edited: Option<Anchor>,
}

impl DocumentMutation {
    pub fn whole(document_key: impl Into<String>) -> Self {
        Self {
            document_key: document_key.into(),
            edited: None,
        }
    }

    pub fn at(document_key: impl Into<String>, edited: Anchor) -> Self {
        Self {
            document_key: document_key.into(),
            edited: Some(edited),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InvalidationPolicy {
    /// Any edit drops every snippet of the document
    #[default]
    Document,
    /// Drop only snippets ending on or after the first edited line
    BelowEdit,
}

impl InvalidationPolicy {
    pub fn invalidates(&self, snippet: &Snippet, mutation: &DocumentMutation) -> bool {
        if snippet.document_key != mutation.document_key {
            return false;
        }
        match (self, mutation.edited) {
            (InvalidationPolicy::Document, _) | (InvalidationPolicy::BelowEdit, None) => true,
            (InvalidationPolicy::BelowEdit, Some(edited)) => {
                snippet.anchor.end.line >= edited.start.line
            }
        }
    }
}
