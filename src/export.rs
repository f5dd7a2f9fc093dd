//! Export destinations and filesystem persistence

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::error::HostError;

/// How the rendered snippets are combined with the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    Overwrite,
    Append,
}

/// Name used for the project in automatic export file names
pub fn project_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "project".to_string())
}

/// `{root}/{export_dir}/{project}_snippets_{timestamp}.md`
pub fn auto_destination(root: &Path, export_dir: &str, at: NaiveDateTime) -> PathBuf {
    root.join(export_dir).join(format!(
        "{}_snippets_{}.md",
        project_name(root),
        at.format("%Y-%m-%d_%H-%M-%S")
    ))
}

/// Write `content` to `path`, creating missing parent directories
pub async fn write_file(path: &Path, content: &str) -> Result<(), HostError> {
    let io_err = |source| HostError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    tokio::fs::write(path, content).await.map_err(io_err)
}

pub async fn read_file(path: &Path) -> Result<String, HostError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(HostError::NotFound {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(HostError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
