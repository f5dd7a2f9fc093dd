//! `workspace/executeCommand` names and argument decoding.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower_lsp::lsp_types::{Range, Url};

use crate::model::SnippetId;

pub const ADD: &str = "snippets.add";
pub const ADD_WITH_DETAILS: &str = "snippets.addWithDetails";
pub const ADD_PENDING: &str = "snippets.addPending";
pub const UPDATE: &str = "snippets.update";
pub const EDIT: &str = "snippets.edit";
pub const DELETE: &str = "snippets.delete";
pub const CLEAR: &str = "snippets.clear";
pub const EXPORT: &str = "snippets.export";
pub const EXPORT_AS: &str = "snippets.exportAs";
pub const EXPORT_APPEND: &str = "snippets.exportAppend";
pub const LIST: &str = "snippets.list";

pub const ALL: &[&str] = &[
    ADD,
    ADD_WITH_DETAILS,
    ADD_PENDING,
    UPDATE,
    EDIT,
    DELETE,
    CLEAR,
    EXPORT,
    EXPORT_AS,
    EXPORT_APPEND,
    LIST,
];

#[derive(Debug, Clone, PartialEq)]
pub enum SnippetCommand {
    /// Without a description the user is prompted for one
    Add {
        uri: Url,
        range: Range,
        description: Option<String>,
        explanation: Option<String>,
    },
    AddWithDetails {
        uri: Url,
        range: Range,
    },
    AddPending {
        description: Option<String>,
        explanation: Option<String>,
    },
    Update {
        id: SnippetId,
        description: String,
        explanation: Option<String>,
    },
    Edit {
        id: SnippetId,
    },
    Delete {
        id: SnippetId,
    },
    Clear,
    Export,
    ExportAs {
        path: PathBuf,
    },
    ExportAppend {
        path: PathBuf,
    },
    List,
}

impl SnippetCommand {
    pub fn parse(command: &str, args: &[Value]) -> Result<Self> {
        let cmd = match command {
            ADD => SnippetCommand::Add {
                uri: arg(args, 0, "uri")?,
                range: arg(args, 1, "range")?,
                description: opt_arg(args, 2, "description")?,
                explanation: opt_arg(args, 3, "explanation")?,
            },
            ADD_WITH_DETAILS => SnippetCommand::AddWithDetails {
                uri: arg(args, 0, "uri")?,
                range: arg(args, 1, "range")?,
            },
            ADD_PENDING => SnippetCommand::AddPending {
                description: opt_arg(args, 0, "description")?,
                explanation: opt_arg(args, 1, "explanation")?,
            },
            UPDATE => SnippetCommand::Update {
                id: arg(args, 0, "id")?,
                description: arg(args, 1, "description")?,
                explanation: opt_arg(args, 2, "explanation")?,
            },
            EDIT => SnippetCommand::Edit {
                id: arg(args, 0, "id")?,
            },
            DELETE => SnippetCommand::Delete {
                id: arg(args, 0, "id")?,
            },
            CLEAR => SnippetCommand::Clear,
            EXPORT => SnippetCommand::Export,
            EXPORT_AS => SnippetCommand::ExportAs {
                path: path_arg(args, 0)?,
            },
            EXPORT_APPEND => SnippetCommand::ExportAppend {
                path: path_arg(args, 0)?,
            },
            LIST => SnippetCommand::List,
            other => anyhow::bail!("Unknown command: {other}"),
        };
        Ok(cmd)
    }
}

fn arg<T: DeserializeOwned>(args: &[Value], index: usize, name: &str) -> Result<T> {
    let value = args
        .get(index)
        .with_context(|| format!("Missing argument {index} ({name})"))?;
    serde_json::from_value(value.clone()).with_context(|| format!("Invalid argument {index} ({name})"))
}

fn opt_arg<T: DeserializeOwned>(args: &[Value], index: usize, name: &str) -> Result<Option<T>> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => arg(args, index, name).map(Some),
    }
}

/// Accepts a plain path or a `file://` URI
fn path_arg(args: &[Value], index: usize) -> Result<PathBuf> {
    let raw: String = arg(args, index, "destination")?;
    if raw.starts_with("file:") {
        let uri = Url::parse(&raw).with_context(|| format!("Invalid destination URI: {raw}"))?;
        return uri
            .to_file_path()
            .map_err(|_| anyhow::anyhow!("Destination is not a local file: {raw}"));
    }
    Ok(PathBuf::from(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn range_json() -> Value {
        json!({ "start": { "line": 3, "character": 0 }, "end": { "line": 3, "character": 12 } })
    }

    #[test]
    fn parse_add_with_optional_fields() {
        let cmd = SnippetCommand::parse(
            ADD,
            &[json!("file:///work/a.ts"), range_json(), json!("Init"), Value::Null],
        )
        .unwrap();
        match cmd {
            SnippetCommand::Add {
                uri,
                range,
                description,
                explanation,
            } => {
                assert_eq!(uri.as_str(), "file:///work/a.ts");
                assert_eq!(range.end.character, 12);
                assert_eq!(description.as_deref(), Some("Init"));
                assert_eq!(explanation, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parse_update() {
        let cmd = SnippetCommand::parse(UPDATE, &[json!(4), json!("New"), json!("Why")]).unwrap();
        assert_eq!(
            cmd,
            SnippetCommand::Update {
                id: SnippetId(4),
                description: "New".to_string(),
                explanation: Some("Why".to_string()),
            }
        );
    }

    #[test]
    fn missing_argument_is_error() {
        let err = SnippetCommand::parse(DELETE, &[]).unwrap_err();
        assert!(err.to_string().contains("Missing argument 0 (id)"));
    }

    #[test]
    fn wrong_type_is_error() {
        let err = SnippetCommand::parse(DELETE, &[json!("seven")]).unwrap_err();
        assert!(err.to_string().contains("Invalid argument 0 (id)"));
    }

    #[test]
    fn export_destination_accepts_uri_or_path() {
        let cmd = SnippetCommand::parse(EXPORT_AS, &[json!("file:///tmp/out.md")]).unwrap();
        assert_eq!(
            cmd,
            SnippetCommand::ExportAs {
                path: PathBuf::from("/tmp/out.md")
            }
        );
        let cmd = SnippetCommand::parse(EXPORT_APPEND, &[json!("notes/out.md")]).unwrap();
        assert_eq!(
            cmd,
            SnippetCommand::ExportAppend {
                path: PathBuf::from("notes/out.md")
            }
        );
    }

    #[test]
    fn unknown_command() {
        assert!(SnippetCommand::parse("snippets.frobnicate", &[]).is_err());
    }

    #[test]
    fn all_commands_parse_without_args_or_report_missing() {
        for name in ALL {
            let result = SnippetCommand::parse(name, &[]);
            if let Err(e) = result {
                assert!(e.to_string().starts_with("Missing argument"), "{name}: {e}");
            }
        }
    }
}
