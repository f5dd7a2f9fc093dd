//! [`Host`] backed by an LSP client.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use dashmap::DashMap;
use tower_lsp::lsp_types::{MessageActionItem, MessageType, Url};
use tower_lsp::Client;
use tracing::debug;

use super::protocol::{
    MarkRange, MarkRangeParams, PromptText, PromptTextParams, SelectionActions,
    SelectionActionsParams, UnmarkAll, UnmarkRange, UnmarkRangeParams,
};
use super::{to_range, uri_for_id};
use crate::document::resolve_document_key;
use crate::error::HostError;
use crate::export;
use crate::host::{Host, MessageLevel};
use crate::model::{Anchor, Selection};

const CONFIRM: &str = "Yes";
const DECLINE: &str = "No";

pub struct LspHost {
    client: Client,
    root: RwLock<Option<PathBuf>>,
    /// document key -> URI for documents seen by the server
    uris: DashMap<String, Url>,
}

impl LspHost {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            root: RwLock::new(None),
            uris: DashMap::new(),
        }
    }

    pub fn set_project_root(&self, root: Option<PathBuf>) {
        *self.root.write().unwrap_or_else(|e| e.into_inner()) = root;
    }

    pub fn remember(&self, document_key: String, uri: Url) {
        self.uris.insert(document_key, uri);
    }

    pub fn forget(&self, document_key: &str) {
        self.uris.remove(document_key);
    }

    #[cfg(test)]
    pub(crate) fn remembers(&self, document_key: &str) -> bool {
        self.uris.contains_key(document_key)
    }

    fn uri_for(&self, document_key: &str) -> Option<Url> {
        if let Some(uri) = self.uris.get(document_key) {
            return Some(uri.clone());
        }
        let root = self.project_root();
        let path = resolve_document_key(document_key, root.as_deref());
        uri_for_id(&path.display().to_string()).or_else(|| uri_for_id(document_key))
    }
}

fn action(title: &str) -> MessageActionItem {
    MessageActionItem {
        title: title.to_string(),
        properties: HashMap::new(),
    }
}

#[async_trait]
impl Host for LspHost {
    fn project_root(&self) -> Option<PathBuf> {
        self.root.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    async fn prompt_for_text(&self, label: &str, placeholder: &str) -> Option<String> {
        let params = PromptTextParams {
            label: label.to_string(),
            placeholder: placeholder.to_string(),
        };
        match self.client.send_request::<PromptText>(params).await {
            Ok(answer) => answer,
            Err(e) => {
                debug!("prompt failed, treating as dismissed: {e}");
                None
            }
        }
    }

    async fn prompt_for_confirmation(&self, message: &str) -> bool {
        let chosen = self
            .client
            .show_message_request(
                MessageType::WARNING,
                message,
                Some(vec![action(CONFIRM), action(DECLINE)]),
            )
            .await;
        matches!(chosen, Ok(Some(item)) if item.title == CONFIRM)
    }

    async fn mark_range(&self, document_key: &str, anchor: Anchor, tooltip: &str) {
        let Some(uri) = self.uri_for(document_key) else {
            return;
        };
        self.client
            .send_notification::<MarkRange>(MarkRangeParams {
                uri,
                range: to_range(anchor),
                tooltip: tooltip.to_string(),
            })
            .await;
    }

    async fn unmark_range(&self, document_key: &str, anchor: Anchor) {
        let Some(uri) = self.uri_for(document_key) else {
            return;
        };
        self.client
            .send_notification::<UnmarkRange>(UnmarkRangeParams {
                uri,
                range: to_range(anchor),
            })
            .await;
    }

    async fn unmark_all(&self) {
        self.client.send_notification::<UnmarkAll>(()).await;
    }

    async fn show_selection_actions(&self, selection: &Selection) {
        self.client
            .send_notification::<SelectionActions>(SelectionActionsParams {
                uri: uri_for_id(&selection.document.id),
                line: Some(selection.anchor.start.line),
            })
            .await;
    }

    async fn hide_selection_actions(&self) {
        self.client
            .send_notification::<SelectionActions>(SelectionActionsParams {
                uri: None,
                line: None,
            })
            .await;
    }

    async fn show_message(&self, level: MessageLevel, message: &str) {
        let typ = match level {
            MessageLevel::Info => MessageType::INFO,
            MessageLevel::Warning => MessageType::WARNING,
            MessageLevel::Error => MessageType::ERROR,
        };
        self.client.show_message(typ, message).await;
    }

    async fn write_text(&self, destination: &Path, content: &str) -> Result<(), HostError> {
        export::write_file(destination, content).await
    }

    async fn read_text(&self, source: &Path) -> Result<String, HostError> {
        export::read_file(source).await
    }
}
