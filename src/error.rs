use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by a host capability
#[derive(Debug, Error)]
pub enum HostError {
    #[error("{path} does not exist")]
    NotFound { path: PathBuf },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why an export did not happen
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No snippets to export")]
    NothingToExport,

    #[error("No workspace folder is open; use Export As to choose a destination")]
    NoProjectRoot,

    #[error("Failed to read {destination}: {source}")]
    Read {
        destination: PathBuf,
        #[source]
        source: HostError,
    },

    #[error("Failed to write {destination}: {source}")]
    Write {
        destination: PathBuf,
        #[source]
        source: HostError,
    },
}

impl ExportError {
    /// Precondition failures are warnings; I/O failures are errors
    pub fn is_precondition(&self) -> bool {
        matches!(self, ExportError::NothingToExport | ExportError::NoProjectRoot)
    }
}
