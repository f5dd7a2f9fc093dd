//! In-memory snippet store with change subscriptions.
//!
//! The store keeps snippets in insertion order. Every successful mutation
//! notifies all subscribers exactly once with the full current list.

use tracing::debug;

use crate::model::{Anchor, NewSnippet, Position, Snippet, SnippetId};

/// Callback invoked with the full snippet list after each mutation
pub type Listener = Box<dyn Fn(&[Snippet]) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct SnippetStore {
    snippets: Vec<Snippet>,
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for SnippetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnippetStore")
            .field("snippets", &self.snippets)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl SnippetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(sub, _)| *sub != id);
    }

    fn notify(&self) {
        for (_, listener) in &self.listeners {
            listener(&self.snippets);
        }
    }

    /// Append a snippet. Returns `None` without touching the store when the
    /// description is blank.
    pub fn add(&mut self, new: NewSnippet) -> Option<SnippetId> {
        let description = new.description.trim();
        if description.is_empty() {
            debug!(document = %new.document_key, "rejected snippet without description");
            return None;
        }
        let id = SnippetId(self.next_id);
        self.next_id += 1;
        self.snippets.push(Snippet {
            id,
            document_key: new.document_key,
            code: new.code,
            language_tag: new.language_tag,
            description: description.to_string(),
            explanation: new.explanation,
            anchor: new.anchor,
        });
        debug!(%id, count = self.snippets.len(), "snippet added");
        self.notify();
        Some(id)
    }

    /// Overwrite description and explanation in place.
    ///
    /// Returns `false` when the id is unknown or the description is blank.
    pub fn update(&mut self, id: SnippetId, description: &str, explanation: Option<String>) -> bool {
        let description = description.trim();
        if description.is_empty() {
            return false;
        }
        let Some(snippet) = self.snippets.iter_mut().find(|s| s.id == id) else {
            debug!(%id, "update of unknown snippet ignored");
            return false;
        };
        snippet.description = description.to_string();
        snippet.explanation = explanation;
        debug!(%id, "snippet updated");
        self.notify();
        true
    }

    pub fn delete(&mut self, id: SnippetId) -> Option<Snippet> {
        let index = self.snippets.iter().position(|s| s.id == id)?;
        let removed = self.snippets.remove(index);
        debug!(%id, count = self.snippets.len(), "snippet deleted");
        self.notify();
        Some(removed)
    }

    /// Remove every snippet matching `predicate` in one batch.
    ///
    /// Notifies once, and only when something was removed.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&Snippet) -> bool) -> Vec<Snippet> {
        let (removed, kept): (Vec<Snippet>, Vec<Snippet>) =
            std::mem::take(&mut self.snippets)
                .into_iter()
                .partition(|s| predicate(s));
        self.snippets = kept;
        if !removed.is_empty() {
            debug!(removed = removed.len(), count = self.snippets.len(), "snippets removed");
            self.notify();
        }
        removed
    }

    pub fn clear_all(&mut self) -> Vec<Snippet> {
        let removed = std::mem::take(&mut self.snippets);
        debug!(removed = removed.len(), "store cleared");
        self.notify();
        removed
    }

    pub fn get(&self, id: SnippetId) -> Option<&Snippet> {
        self.snippets.iter().find(|s| s.id == id)
    }

    pub fn find_by_document_and_anchor(&self, document_key: &str, anchor: Anchor) -> Option<&Snippet> {
        self.snippets
            .iter()
            .find(|s| s.document_key == document_key && s.anchor == anchor)
    }

    /// Most recently added snippet of the document whose anchor contains `pos`
    pub fn find_at(&self, document_key: &str, pos: Position) -> Option<&Snippet> {
        self.snippets
            .iter()
            .rev()
            .find(|s| s.document_key == document_key && s.anchor.contains(pos))
    }

    pub fn snippets(&self) -> &[Snippet] {
        &self.snippets
    }

    pub fn count(&self) -> usize {
        self.snippets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }
}
