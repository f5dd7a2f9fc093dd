//! The collector session: owns the snippet store and runs every user
//! workflow against a [`Host`].
//!
//! Workflows that prompt the user collect all input before touching the
//! store, so a dismissed prompt at any step leaves the store unchanged. The
//! store lock is never held across a host call.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{Local, NaiveDateTime};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::debounce::Debouncer;
use crate::document;
use crate::error::{ExportError, HostError};
use crate::export::{self, ExportMode};
use crate::format;
use crate::host::{Host, MessageLevel};
use crate::model::{Anchor, DocumentRef, ExportReport, NewSnippet, Position, Selection, Snippet, SnippetId};
use crate::store::{Listener, SnippetStore, SubscriptionId};
use crate::tracker::DocumentMutation;

pub struct Session {
    host: Arc<dyn Host>,
    store: Mutex<SnippetStore>,
    pending: Arc<std::sync::Mutex<Option<Selection>>>,
    /// Document key of the selection waiting on the debouncer
    scheduled: std::sync::Mutex<Option<String>>,
    debouncer: Debouncer,
    settings: RwLock<Settings>,
}

impl Session {
    pub fn new(host: Arc<dyn Host>, settings: Settings) -> Self {
        Self {
            host,
            store: Mutex::new(SnippetStore::new()),
            pending: Arc::new(std::sync::Mutex::new(None)),
            scheduled: std::sync::Mutex::new(None),
            debouncer: Debouncer::new(settings.debounce()),
            settings: RwLock::new(settings),
        }
    }

    pub fn settings(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn configure(&self, settings: Settings) {
        self.debouncer.set_delay(settings.debounce());
        *self.settings.write().unwrap_or_else(|e| e.into_inner()) = settings;
    }

    pub async fn subscribe(&self, listener: Listener) -> SubscriptionId {
        self.store.lock().await.subscribe(listener)
    }

    pub fn document_key(&self, doc: &DocumentRef) -> String {
        let root = self.host.project_root();
        document::document_key(&doc.id, root.as_deref())
    }

    // ── Selection tracking ──

    /// Report the host's current selection.
    ///
    /// A settled non-empty selection becomes the pending selection and gets
    /// inline actions; an empty one cancels anything still waiting.
    pub async fn selection_changed(&self, selection: Option<Selection>) {
        self.set_pending(None);
        let selection = selection.filter(|s| !s.anchor.is_empty() && !s.text.is_empty());
        let Some(selection) = selection else {
            self.set_scheduled(None);
            self.debouncer.cancel();
            self.host.hide_selection_actions().await;
            return;
        };

        self.set_scheduled(Some(self.document_key(&selection.document)));
        let host = Arc::clone(&self.host);
        let pending = Arc::clone(&self.pending);
        self.debouncer.schedule(async move {
            *pending.lock().unwrap_or_else(|e| e.into_inner()) = Some(selection.clone());
            host.show_selection_actions(&selection).await;
        });
    }

    pub fn pending_selection(&self) -> Option<Selection> {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn set_pending(&self, selection: Option<Selection>) {
        *self.pending.lock().unwrap_or_else(|e| e.into_inner()) = selection;
    }

    fn set_scheduled(&self, document_key: Option<String>) {
        *self.scheduled.lock().unwrap_or_else(|e| e.into_inner()) = document_key;
    }

    /// Forget a pending or still-debouncing selection captured from
    /// `document_key`; its text and anchor predate the edit.
    async fn discard_selection_in(&self, document_key: &str) {
        let scheduled_here = self
            .scheduled
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_deref()
            == Some(document_key);
        let pending_here = self
            .pending_selection()
            .is_some_and(|s| self.document_key(&s.document) == document_key);
        if !scheduled_here && !pending_here {
            return;
        }
        debug!(document = %document_key, "selection dropped by edit");
        self.set_scheduled(None);
        self.debouncer.cancel();
        self.set_pending(None);
        self.host.hide_selection_actions().await;
    }

    // ── Adding ──

    /// Add a snippet for the pending selection; no selection is a no-op
    pub async fn add_snippet(&self, description: &str, explanation: Option<&str>) -> Option<SnippetId> {
        let Some(selection) = self.pending_selection() else {
            debug!("add without a pending selection ignored");
            return None;
        };
        self.add_snippet_at(&selection, description, explanation).await
    }

    pub async fn add_snippet_at(
        &self,
        selection: &Selection,
        description: &str,
        explanation: Option<&str>,
    ) -> Option<SnippetId> {
        if selection.text.is_empty() {
            return None;
        }
        let document_key = self.document_key(&selection.document);
        let new = NewSnippet {
            document_key: document_key.clone(),
            code: selection.text.clone(),
            language_tag: document::language_tag(&selection.document),
            anchor: selection.anchor,
            description: description.to_string(),
            explanation: normalize_explanation(explanation),
        };

        let id = self.store.lock().await.add(new)?;

        info!(%id, document = %document_key, "snippet collected");
        self.host
            .mark_range(&document_key, selection.anchor, description.trim())
            .await;
        if self.pending_selection().as_ref() == Some(selection) {
            self.set_pending(None);
        }
        self.host.hide_selection_actions().await;
        Some(id)
    }

    /// Prompt for a description only
    pub async fn quick_add(&self, selection: &Selection) -> Option<SnippetId> {
        let description = self.prompt_description("").await?;
        self.add_snippet_at(selection, &description, None).await
    }

    /// Prompt for a description, then an optional explanation
    pub async fn add_with_details(&self, selection: &Selection) -> Option<SnippetId> {
        let description = self.prompt_description("").await?;
        let explanation = self
            .host
            .prompt_for_text("Explanation (optional)", "Why is this code interesting?")
            .await?;
        self.add_snippet_at(selection, &description, Some(&explanation))
            .await
    }

    /// Prompt for a non-blank description. Blank input is reported and
    /// treated like a dismissed prompt.
    async fn prompt_description(&self, current: &str) -> Option<String> {
        let placeholder = if current.is_empty() {
            "What does this code do?"
        } else {
            current
        };
        let answer = self
            .host
            .prompt_for_text("Snippet description", placeholder)
            .await?;
        let answer = answer.trim();
        if answer.is_empty() {
            self.host
                .show_message(MessageLevel::Warning, "A description is required")
                .await;
            return None;
        }
        Some(answer.to_string())
    }

    // ── Editing ──

    pub async fn update_snippet(
        &self,
        id: SnippetId,
        description: &str,
        explanation: Option<&str>,
    ) -> bool {
        let updated = {
            let mut store = self.store.lock().await;
            if !store.update(id, description, normalize_explanation(explanation)) {
                return false;
            }
            store.get(id).cloned()
        };
        if let Some(snippet) = updated {
            // Refresh the tooltip
            self.host
                .unmark_range(&snippet.document_key, snippet.anchor)
                .await;
            self.host
                .mark_range(&snippet.document_key, snippet.anchor, &snippet.description)
                .await;
        }
        true
    }

    /// Interactive edit; dismissing either prompt leaves the snippet as it was
    pub async fn edit_snippet(&self, id: SnippetId) -> bool {
        let Some(current) = self.store.lock().await.get(id).cloned() else {
            return false;
        };
        let Some(description) = self.prompt_description(&current.description).await else {
            return false;
        };
        let Some(explanation) = self
            .host
            .prompt_for_text(
                "Explanation (optional)",
                current.explanation.as_deref().unwrap_or(""),
            )
            .await
        else {
            return false;
        };
        self.update_snippet(id, &description, Some(&explanation))
            .await
    }

    pub async fn delete_snippet(&self, id: SnippetId) -> bool {
        let Some(removed) = self.store.lock().await.delete(id) else {
            return false;
        };
        self.host
            .unmark_range(&removed.document_key, removed.anchor)
            .await;
        true
    }

    /// Clear everything, asking first when configured to
    pub async fn clear_all(&self) -> bool {
        let count = self.count().await;
        if count > 0 && self.settings().confirm_clear {
            let noun = if count == 1 { "snippet" } else { "snippets" };
            let message = format!("Clear all {count} collected {noun}?");
            if !self.host.prompt_for_confirmation(&message).await {
                return false;
            }
        }
        self.store.lock().await.clear_all();
        self.host.unmark_all().await;
        true
    }

    // ── Invalidation ──

    /// Drop the snippets a document edit invalidates. Returns how many went.
    ///
    /// A selection captured from the edited document is dropped as well,
    /// whether it is pending or still waiting on the debouncer.
    pub async fn document_mutated(&self, mutation: &DocumentMutation) -> usize {
        self.discard_selection_in(&mutation.document_key).await;
        let policy = self.settings().invalidation;
        let removed = self
            .store
            .lock()
            .await
            .remove_where(|s| policy.invalidates(s, mutation));
        if !removed.is_empty() {
            debug!(
                document = %mutation.document_key,
                removed = removed.len(),
                "snippets invalidated by edit"
            );
        }
        for snippet in &removed {
            self.host
                .unmark_range(&snippet.document_key, snippet.anchor)
                .await;
        }
        removed.len()
    }

    pub async fn document_changed(&self, doc: &DocumentRef, edited: Option<Anchor>) -> usize {
        let mutation = DocumentMutation {
            document_key: self.document_key(doc),
            edited,
        };
        self.document_mutated(&mutation).await
    }

    // ── Export ──

    /// Export into the project's export folder under a generated name
    pub async fn export_auto(&self) -> Result<ExportReport, ExportError> {
        let result = self.export(None, ExportMode::Overwrite).await;
        self.report(&result).await;
        result
    }

    pub async fn export_as(&self, destination: &Path) -> Result<ExportReport, ExportError> {
        let result = self
            .export(Some(destination.to_path_buf()), ExportMode::Overwrite)
            .await;
        self.report(&result).await;
        result
    }

    /// Append to an existing export; a missing file gets a fresh document
    pub async fn export_append(&self, destination: &Path) -> Result<ExportReport, ExportError> {
        let result = self
            .export(Some(destination.to_path_buf()), ExportMode::Append)
            .await;
        self.report(&result).await;
        result
    }

    async fn export(
        &self,
        destination: Option<PathBuf>,
        mode: ExportMode,
    ) -> Result<ExportReport, ExportError> {
        let now = Local::now().naive_local();
        let snapshot = self.snippets().await;
        if snapshot.is_empty() {
            return Err(ExportError::NothingToExport);
        }
        let destination = match destination {
            Some(d) => d,
            None => {
                let root = self.host.project_root().ok_or(ExportError::NoProjectRoot)?;
                export::auto_destination(&root, &self.settings().export_dir, now)
            }
        };

        let content = self.render_for(&destination, &snapshot, mode, now).await?;
        self.host
            .write_text(&destination, &content)
            .await
            .map_err(|source| ExportError::Write {
                destination: destination.clone(),
                source,
            })?;

        // Consume only what was written
        let exported: HashSet<SnippetId> = snapshot.iter().map(|s| s.id).collect();
        let (removed, now_empty) = {
            let mut store = self.store.lock().await;
            let removed = store.remove_where(|s| exported.contains(&s.id));
            (removed, store.is_empty())
        };
        if now_empty {
            self.host.unmark_all().await;
        } else {
            for snippet in &removed {
                self.host
                    .unmark_range(&snippet.document_key, snippet.anchor)
                    .await;
            }
        }

        Ok(ExportReport {
            destination,
            exported: snapshot.len(),
        })
    }

    async fn render_for(
        &self,
        destination: &Path,
        snippets: &[Snippet],
        mode: ExportMode,
        now: NaiveDateTime,
    ) -> Result<String, ExportError> {
        if mode == ExportMode::Overwrite {
            return Ok(format::document(snippets, now));
        }
        match self.host.read_text(destination).await {
            Ok(existing) if !existing.trim().is_empty() => {
                Ok(format::appended(&existing, snippets, now))
            }
            Ok(_) | Err(HostError::NotFound { .. }) => Ok(format::document(snippets, now)),
            Err(source) => Err(ExportError::Read {
                destination: destination.to_path_buf(),
                source,
            }),
        }
    }

    async fn report(&self, result: &Result<ExportReport, ExportError>) {
        match result {
            Ok(report) => {
                info!(
                    destination = %report.destination.display(),
                    exported = report.exported,
                    "snippets exported"
                );
                let noun = if report.exported == 1 { "snippet" } else { "snippets" };
                let message = format!(
                    "Exported {} {noun} to {}",
                    report.exported,
                    report.destination.display()
                );
                self.host.show_message(MessageLevel::Info, &message).await;
            }
            Err(e) if e.is_precondition() => {
                debug!("export skipped: {e}");
                self.host
                    .show_message(MessageLevel::Warning, &e.to_string())
                    .await;
            }
            Err(e) => {
                warn!("export failed: {e}");
                self.host.show_message(MessageLevel::Error, &e.to_string()).await;
            }
        }
    }

    // ── Queries ──

    pub async fn snippets(&self) -> Vec<Snippet> {
        self.store.lock().await.snippets().to_vec()
    }

    pub async fn count(&self) -> usize {
        self.store.lock().await.count()
    }

    /// Whether any collected snippet was captured from `document_key`
    pub async fn has_snippets_in(&self, document_key: &str) -> bool {
        self.store
            .lock()
            .await
            .snippets()
            .iter()
            .any(|s| s.document_key == document_key)
    }

    pub async fn get(&self, id: SnippetId) -> Option<Snippet> {
        self.store.lock().await.get(id).cloned()
    }

    pub async fn find_at(&self, document_key: &str, pos: Position) -> Option<Snippet> {
        self.store.lock().await.find_at(document_key, pos).cloned()
    }

    pub async fn find_by_document_and_anchor(&self, document_key: &str, anchor: Anchor) -> Option<Snippet> {
        self.store
            .lock()
            .await
            .find_by_document_and_anchor(document_key, anchor)
            .cloned()
    }
}

fn normalize_explanation(explanation: Option<&str>) -> Option<String> {
    explanation
        .map(|e| e.trim_end())
        .filter(|e| !e.trim().is_empty())
        .map(|e| e.to_string())
}
