use thiserror::Error;

/// Failure of a whole ingestion call. Row-level problems never surface here;
/// they are dropped by the pipeline.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("failed to fetch source '{path}': {reason}")]
    Fetch { path: String, reason: String },
    #[error("source '{path}' has an unreadable header row: {reason}")]
    Header { path: String, reason: String },
}

/// Error type for map construction and entity loading.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("map backend error: {0}")]
    Backend(String),
    #[error(transparent)]
    Ingest(#[from] IngestError),
}
