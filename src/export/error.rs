use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export path {0} does not exist")]
    MissingExport(PathBuf),

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("malformed json in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}
