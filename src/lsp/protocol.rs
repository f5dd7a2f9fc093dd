//! Custom LSP extensions understood by the editor-side client.

use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::notification::Notification;
use tower_lsp::lsp_types::request::Request;
use tower_lsp::lsp_types::{Range, Url};

use crate::model::Snippet;

/// Ask the user for a line of text; `null` means dismissed
pub enum PromptText {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptTextParams {
    pub label: String,
    pub placeholder: String,
}

impl Request for PromptText {
    type Params = PromptTextParams;
    type Result = Option<String>;
    const METHOD: &'static str = "snippets/promptText";
}

pub enum MarkRange {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkRangeParams {
    pub uri: Url,
    pub range: Range,
    pub tooltip: String,
}

impl Notification for MarkRange {
    type Params = MarkRangeParams;
    const METHOD: &'static str = "snippets/mark";
}

pub enum UnmarkRange {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmarkRangeParams {
    pub uri: Url,
    pub range: Range,
}

impl Notification for UnmarkRange {
    type Params = UnmarkRangeParams;
    const METHOD: &'static str = "snippets/unmark";
}

pub enum UnmarkAll {}

impl Notification for UnmarkAll {
    type Params = ();
    const METHOD: &'static str = "snippets/unmarkAll";
}

/// Show (`line` set) or hide (`line` null) the inline "add snippet" actions
pub enum SelectionActions {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionActionsParams {
    pub uri: Option<Url>,
    pub line: Option<u32>,
}

impl Notification for SelectionActions {
    type Params = SelectionActionsParams;
    const METHOD: &'static str = "snippets/selectionActions";
}

/// Full snippet list after every change
pub enum SnippetsChanged {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetsChangedParams {
    pub snippets: Vec<Snippet>,
    pub summary: String,
}

impl Notification for SnippetsChanged {
    type Params = SnippetsChangedParams;
    const METHOD: &'static str = "snippets/changed";
}
