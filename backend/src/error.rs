//! Error taxonomy of the ingestion pipeline.
//!
//! File-level errors (`EmptyFile`, `Parse`) abort an upload before any
//! session exists. Row-level problems are never errors in the `Result`
//! sense: validation messages live in `RowRecord::validation_errors` and
//! submission failures in `RowOutcome::Failed`. Only storage faults are
//! fatal to a running session.

use thiserror::Error;

/// Failures of the persistence boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session {0} not found")]
    NotFound(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Errors surfaced by the upload path as a whole.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("uploaded file contains no data rows")]
    EmptyFile,
    #[error("could not parse uploaded file: {0}")]
    Parse(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl PipelineError {
    /// File-level errors are the caller's fault and map to 400; everything
    /// else is an infrastructure fault.
    pub fn is_file_error(&self) -> bool {
        matches!(self, PipelineError::EmptyFile | PipelineError::Parse(_))
    }
}

/// Failures of a single remote call to the advertising platform.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("request timed out")]
    Timeout,
    #[error("platform rejected the request: {0}")]
    Rejected(String),
    #[error("transport failure: {0}")]
    Transport(String),
}
