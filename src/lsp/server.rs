//! tower-lsp based Language Server implementation.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::mpsc;
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{debug, info};

use super::commands::{self, SnippetCommand};
use super::host::LspHost;
use super::hover::build_hover_content;
use super::protocol::{SnippetsChanged, SnippetsChangedParams};
use super::{document_ref, to_anchor, to_position, to_range};
use crate::config::Settings;
use crate::document;
use crate::format;
use crate::host::Host as _;
use crate::model::{DocumentRef, Selection, Snippet};
use crate::session::Session;

/// An open document as last synced by the client.
#[derive(Clone)]
struct OpenDocument {
    version: i32,
    text: String,
    language_id: String,
}

/// Shared state that can be cloned into spawned tasks via Arc.
struct State {
    client: Client,
    host: Arc<LspHost>,
    session: Session,
    documents: DashMap<String, OpenDocument>,
    code_lens_refresh: AtomicBool,
}

impl State {
    fn new(client: Client) -> Self {
        let host = Arc::new(LspHost::new(client.clone()));
        let session = Session::new(host.clone(), Settings::default());
        Self {
            client,
            host,
            session,
            documents: DashMap::new(),
            code_lens_refresh: AtomicBool::new(false),
        }
    }

    /// Document reference and key for `uri`. The URI of an open document is
    /// remembered under its key.
    fn resolve(&self, uri: &Url) -> (DocumentRef, String) {
        let language_id = self
            .documents
            .get(uri.as_str())
            .map(|d| d.language_id.clone());
        let doc = document_ref(uri, language_id.as_deref());
        let key = self.session.document_key(&doc);
        if language_id.is_some() {
            self.host.remember(key.clone(), uri.clone());
        }
        (doc, key)
    }

    fn selection(&self, uri: &Url, range: Range) -> Option<Selection> {
        let anchor = to_anchor(range);
        if anchor.is_empty() {
            return None;
        }
        let text = {
            let entry = self.documents.get(uri.as_str())?;
            document::slice(&entry.text, anchor).to_string()
        };
        if text.is_empty() {
            return None;
        }
        let (doc, _) = self.resolve(uri);
        Some(Selection {
            document: doc,
            anchor,
            text,
        })
    }

    async fn forward_changes(self: Arc<Self>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<Snippet>>();
        self.session
            .subscribe(Box::new(move |snippets: &[Snippet]| {
                let _ = tx.send(snippets.to_vec());
            }))
            .await;

        let state = Arc::clone(&self);
        tokio::spawn(async move {
            while let Some(snippets) = rx.recv().await {
                let summary = format::summary(snippets.len());
                state
                    .client
                    .send_notification::<SnippetsChanged>(SnippetsChangedParams { snippets, summary })
                    .await;
                if state.code_lens_refresh.load(Ordering::Relaxed) {
                    let _ = state.client.code_lens_refresh().await;
                }
            }
        });
    }

    async fn execute(&self, command: SnippetCommand) -> Result<Option<Value>> {
        let value = match command {
            SnippetCommand::Add {
                uri,
                range,
                description,
                explanation,
            } => {
                let selection = self.require_selection(&uri, range)?;
                let id = match description {
                    Some(d) => {
                        self.session
                            .add_snippet_at(&selection, &d, explanation.as_deref())
                            .await
                    }
                    None => self.session.quick_add(&selection).await,
                };
                serde_json::to_value(id)
            }
            SnippetCommand::AddWithDetails { uri, range } => {
                let selection = self.require_selection(&uri, range)?;
                serde_json::to_value(self.session.add_with_details(&selection).await)
            }
            SnippetCommand::AddPending {
                description,
                explanation,
            } => {
                let id = match (description, self.session.pending_selection()) {
                    (Some(d), _) => self.session.add_snippet(&d, explanation.as_deref()).await,
                    (None, Some(selection)) => self.session.add_with_details(&selection).await,
                    (None, None) => None,
                };
                serde_json::to_value(id)
            }
            SnippetCommand::Update {
                id,
                description,
                explanation,
            } => Ok(Value::Bool(
                self.session
                    .update_snippet(id, &description, explanation.as_deref())
                    .await,
            )),
            SnippetCommand::Edit { id } => Ok(Value::Bool(self.session.edit_snippet(id).await)),
            SnippetCommand::Delete { id } => {
                Ok(Value::Bool(self.session.delete_snippet(id).await))
            }
            SnippetCommand::Clear => Ok(Value::Bool(self.session.clear_all().await)),
            SnippetCommand::Export => serde_json::to_value(self.session.export_auto().await.ok()),
            SnippetCommand::ExportAs { path } => {
                let path = self.absolute(path);
                serde_json::to_value(self.session.export_as(&path).await.ok())
            }
            SnippetCommand::ExportAppend { path } => {
                let path = self.absolute(path);
                serde_json::to_value(self.session.export_append(&path).await.ok())
            }
            SnippetCommand::List => serde_json::to_value(self.session.snippets().await),
        };
        value
            .map(Some)
            .map_err(|e| Error::invalid_params(e.to_string()))
    }

    fn require_selection(&self, uri: &Url, range: Range) -> Result<Selection> {
        self.selection(uri, range)
            .ok_or_else(|| Error::invalid_params(format!("No selected text in {uri}")))
    }

    /// Relative destinations are taken relative to the project root
    fn absolute(&self, path: PathBuf) -> PathBuf {
        match self.host.project_root() {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        }
    }
}

fn project_root(params: &InitializeParams) -> Option<PathBuf> {
    let from_folders = params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .and_then(|f| f.uri.to_file_path().ok());
    #[allow(deprecated)]
    let from_root_uri = params.root_uri.as_ref().and_then(|u| u.to_file_path().ok());
    from_folders.or(from_root_uri)
}

fn command(title: String, name: &str, arguments: Vec<Value>) -> Command {
    Command {
        title,
        command: name.to_string(),
        arguments: if arguments.is_empty() {
            None
        } else {
            Some(arguments)
        },
    }
}

pub struct Backend {
    state: Arc<State>,
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let settings = Settings::from_init_options(params.initialization_options.as_ref());
        let root = project_root(&params);
        info!(root = ?root, "initializing snippet collector");
        self.state.host.set_project_root(root);
        self.state.session.configure(settings);

        let refresh = params
            .capabilities
            .workspace
            .as_ref()
            .and_then(|w| w.code_lens.as_ref())
            .and_then(|c| c.refresh_support)
            .unwrap_or(false);
        self.state.code_lens_refresh.store(refresh, Ordering::Relaxed);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                code_action_provider: Some(CodeActionProviderCapability::Simple(true)),
                code_lens_provider: Some(CodeLensOptions {
                    resolve_provider: Some(false),
                }),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: commands::ALL.iter().map(|c| c.to_string()).collect(),
                    work_done_progress_options: Default::default(),
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        Arc::clone(&self.state).forward_changes().await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        self.state.documents.insert(
            uri.to_string(),
            OpenDocument {
                version: params.text_document.version,
                text: params.text_document.text,
                language_id: params.text_document.language_id,
            },
        );
        self.state.resolve(&uri);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        if let Some(mut entry) = self.state.documents.get_mut(uri.as_str()) {
            if version < entry.version {
                return;
            }
            entry.version = version;
            entry.text = change.text;
        }

        let (doc, _) = self.state.resolve(&uri);
        let removed = self.state.session.document_changed(&doc, None).await;
        if removed > 0 {
            debug!(%uri, removed, "edit invalidated snippets");
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        let (_, key) = self.state.resolve(&uri);
        self.state.documents.remove(uri.as_str());
        // Highlights of collected snippets still need the URI
        if !self.state.session.has_snippets_in(&key).await {
            self.state.host.forget(&key);
        }
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let uri = params.text_document.uri;
        if !self.state.documents.contains_key(uri.as_str()) {
            return Ok(None);
        }
        let (_, key) = self.state.resolve(&uri);
        let selection = self.state.selection(&uri, params.range);
        self.state.session.selection_changed(selection.clone()).await;

        let mut actions = Vec::new();
        let uri_arg = Value::String(uri.to_string());
        let range_arg = serde_json::to_value(params.range).unwrap_or(Value::Null);

        if selection.is_some() {
            actions.push(command(
                "Add snippet".to_string(),
                commands::ADD,
                vec![uri_arg.clone(), range_arg.clone()],
            ));
            actions.push(command(
                "Add snippet with details".to_string(),
                commands::ADD_WITH_DETAILS,
                vec![uri_arg, range_arg],
            ));
        }

        let anchor = to_anchor(params.range);
        let existing = match self
            .state
            .session
            .find_by_document_and_anchor(&key, anchor)
            .await
        {
            Some(s) => Some(s),
            None => self.state.session.find_at(&key, anchor.start).await,
        };
        if let Some(snippet) = existing {
            let id = serde_json::to_value(snippet.id).unwrap_or(Value::Null);
            actions.push(command(
                format!("Edit snippet \"{}\"", snippet.description),
                commands::EDIT,
                vec![id.clone()],
            ));
            actions.push(command(
                format!("Delete snippet \"{}\"", snippet.description),
                commands::DELETE,
                vec![id],
            ));
        }

        Ok(if actions.is_empty() {
            None
        } else {
            Some(
                actions
                    .into_iter()
                    .map(CodeActionOrCommand::Command)
                    .collect(),
            )
        })
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        let command = SnippetCommand::parse(&params.command, &params.arguments)
            .map_err(|e| Error::invalid_params(format!("{e:#}")))?;
        debug!(command = %params.command, "executing");
        self.state.execute(command).await
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let pos = to_position(params.text_document_position_params.position);
        let (_, key) = self.state.resolve(&uri);

        let Some(snippet) = self.state.session.find_at(&key, pos).await else {
            return Ok(None);
        };
        Ok(Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: build_hover_content(&snippet),
            }),
            range: Some(to_range(snippet.anchor)),
        }))
    }

    async fn code_lens(&self, params: CodeLensParams) -> Result<Option<Vec<CodeLens>>> {
        let (_, key) = self.state.resolve(&params.text_document.uri);
        let snippets = self.state.session.snippets().await;
        if snippets.is_empty() {
            return Ok(None);
        }

        let line_lens = |line: u32, cmd: Command| CodeLens {
            range: Range {
                start: Position { line, character: 0 },
                end: Position { line, character: 0 },
            },
            command: Some(cmd),
            data: None,
        };

        let mut lenses = vec![line_lens(
            0,
            command(
                format!("{}: export", format::summary(snippets.len())),
                commands::EXPORT,
                vec![],
            ),
        )];
        for snippet in snippets.iter().filter(|s| s.document_key == key) {
            lenses.push(line_lens(
                snippet.anchor.start.line,
                command(
                    format!("Edit: {}", snippet.description),
                    commands::EDIT,
                    vec![serde_json::to_value(snippet.id).unwrap_or(Value::Null)],
                ),
            ));
        }

        Ok(Some(lenses))
    }
}

/// Start the LSP server on stdio.
pub async fn serve_stdio() {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| Backend {
        state: Arc::new(State::new(client)),
    });
    Server::new(stdin, stdout, socket).serve(service).await;
}
