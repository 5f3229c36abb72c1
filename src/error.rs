use std::path::PathBuf;
use thiserror::Error;

/// The main error type for hubtrail operations.
#[derive(Debug, Error)]
pub enum HubtrailError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid hub reference '{input}': {message}")]
    HubResolveError { input: String, message: String },

    #[error("Hub API request for '{repo_id}' failed: {message}")]
    HubApiError { repo_id: String, message: String },

    #[error("Failed to download '{repo_id}': {message}")]
    HubAcquireError { repo_id: String, message: String },

    #[error("Malformed catalog record: {0}")]
    RecordParse(#[source] serde_json::Error),

    #[error("Lineage store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[source] serde_json::Error),

    #[error("Unknown event direction '{0}' in lineage store")]
    UnknownDirection(String),

    #[error("Failed to write catalog export to {}: {source}", path.display())]
    CsvWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}
