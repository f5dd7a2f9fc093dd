//! Capabilities the editor provides to the collector.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::HostError;
use crate::model::{Anchor, Selection};

/// Severity of a user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

/// The editor side of the collector.
///
/// Prompts return `None`/`false` when the user dismisses them; callers treat
/// that as cancellation, never as an error.
#[async_trait]
pub trait Host: Send + Sync {
    /// Root of the open project, used for relative document keys and
    /// default export locations
    fn project_root(&self) -> Option<PathBuf>;

    async fn prompt_for_text(&self, label: &str, placeholder: &str) -> Option<String>;

    async fn prompt_for_confirmation(&self, message: &str) -> bool;

    async fn mark_range(&self, document_key: &str, anchor: Anchor, tooltip: &str);

    async fn unmark_range(&self, document_key: &str, anchor: Anchor);

    /// Remove every mark in every open document
    async fn unmark_all(&self);

    /// Offer inline actions for a settled selection
    async fn show_selection_actions(&self, selection: &Selection);

    async fn hide_selection_actions(&self);

    async fn show_message(&self, level: MessageLevel, message: &str);

    async fn write_text(&self, destination: &Path, content: &str) -> Result<(), HostError>;

    async fn read_text(&self, source: &Path) -> Result<String, HostError>;
}
