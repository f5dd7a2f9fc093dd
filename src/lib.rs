//! Snippet collector: gather annotated code selections in an editor and
//! export them as a markdown document.
//!
//! The [`session::Session`] owns the snippet store and drives every workflow
//! against a [`host::Host`] (the editor). The [`lsp`] module provides a host
//! implementation on top of the Language Server Protocol.

pub mod config;
pub mod debounce;
pub mod document;
pub mod error;
pub mod export;
pub mod format;
pub mod host;
pub mod lsp;
pub mod model;
pub mod session;
pub mod store;
pub mod tracker;

#[cfg(test)]
pub(crate) mod testing;

use std::path::Path;

use anyhow::{Context, Result};

/// Parse a snippet list as published in `snippets/changed` notifications.
///
/// Accepts either a bare array or an object with a `snippets` field.
pub fn parse_snippets(json: &str) -> Result<Vec<model::Snippet>> {
    let value: serde_json::Value = serde_json::from_str(json).context("Invalid JSON")?;
    let list = match value {
        serde_json::Value::Object(mut obj) => obj
            .remove("snippets")
            .context("Expected an array or an object with a `snippets` field")?,
        other => other,
    };
    serde_json::from_value(list).context("Invalid snippet list")
}

/// Render a saved snippet list to markdown
///
/// # Arguments
/// * `input` - JSON file with the snippet list
/// * `append_to` - Existing export to extend instead of starting a new document
///
/// # Returns
/// The markdown text and the number of snippets rendered
pub async fn render_file(input: &Path, append_to: Option<&Path>) -> Result<(String, usize)> {
    let json = export::read_file(input)
        .await
        .with_context(|| format!("Cannot read {}", input.display()))?;
    let snippets = parse_snippets(&json)?;
    let now = chrono::Local::now().naive_local();

    let markdown = match append_to {
        Some(path) => match export::read_file(path).await {
            Ok(existing) if !existing.trim().is_empty() => {
                format::appended(&existing, &snippets, now)
            }
            Ok(_) | Err(error::HostError::NotFound { .. }) => format::document(&snippets, now),
            Err(e) => return Err(e).with_context(|| format!("Cannot read {}", path.display())),
        },
        None => format::document(&snippets, now),
    };
    Ok((markdown, snippets.len()))
}
