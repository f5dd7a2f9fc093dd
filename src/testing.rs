//! In-memory host double for workflow tests

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::HostError;
use crate::host::{Host, MessageLevel};
use crate::model::{Anchor, Selection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Prompt(String),
    Confirm(String),
    Mark(String, Anchor),
    Unmark(String, Anchor),
    UnmarkAll,
    ShowActions(Anchor),
    HideActions,
    Message(MessageLevel, String),
    Write(PathBuf),
    Read(PathBuf),
}

pub struct RecordingHost {
    root: Option<PathBuf>,
    answers: Mutex<VecDeque<Option<String>>>,
    confirm: AtomicBool,
    fail_writes: AtomicBool,
    pub files: Mutex<HashMap<PathBuf, String>>,
    calls: Mutex<Vec<HostCall>>,
}

impl RecordingHost {
    pub fn new(root: Option<&str>) -> Self {
        Self {
            root: root.map(PathBuf::from),
            answers: Mutex::new(VecDeque::new()),
            confirm: AtomicBool::new(true),
            fail_writes: AtomicBool::new(false),
            files: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue prompt answers; `None` dismisses the prompt
    pub fn answer(&self, answers: &[Option<&str>]) {
        self.answers
            .lock()
            .unwrap()
            .extend(answers.iter().map(|a| a.map(|s| s.to_string())));
    }

    pub fn set_confirm(&self, value: bool) {
        self.confirm.store(value, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, value: bool) {
        self.fail_writes.store(value, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&HostCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub fn messages(&self, level: MessageLevel) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                HostCall::Message(l, m) if *l == level => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn file(&self, path: &Path) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Host for RecordingHost {
    fn project_root(&self) -> Option<PathBuf> {
        self.root.clone()
    }

    async fn prompt_for_text(&self, label: &str, _placeholder: &str) -> Option<String> {
        self.record(HostCall::Prompt(label.to_string()));
        self.answers.lock().unwrap().pop_front().flatten()
    }

    async fn prompt_for_confirmation(&self, message: &str) -> bool {
        self.record(HostCall::Confirm(message.to_string()));
        self.confirm.load(Ordering::SeqCst)
    }

    async fn mark_range(&self, document_key: &str, anchor: Anchor, _tooltip: &str) {
        self.record(HostCall::Mark(document_key.to_string(), anchor));
    }

    async fn unmark_range(&self, document_key: &str, anchor: Anchor) {
        self.record(HostCall::Unmark(document_key.to_string(), anchor));
    }

    async fn unmark_all(&self) {
        self.record(HostCall::UnmarkAll);
    }

    async fn show_selection_actions(&self, selection: &Selection) {
        self.record(HostCall::ShowActions(selection.anchor));
    }

    async fn hide_selection_actions(&self) {
        self.record(HostCall::HideActions);
    }

    async fn show_message(&self, level: MessageLevel, message: &str) {
        self.record(HostCall::Message(level, message.to_string()));
    }

    async fn write_text(&self, destination: &Path, content: &str) -> Result<(), HostError> {
        self.record(HostCall::Write(destination.to_path_buf()));
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(HostError::Io {
                path: destination.to_path_buf(),
                source: std::io::Error::other("disk full"),
            });
        }
        self.files
            .lock()
            .unwrap()
            .insert(destination.to_path_buf(), content.to_string());
        Ok(())
    }

    async fn read_text(&self, source: &Path) -> Result<String, HostError> {
        self.record(HostCall::Read(source.to_path_buf()));
        self.file(source).ok_or_else(|| HostError::NotFound {
            path: source.to_path_buf(),
        })
    }
}
