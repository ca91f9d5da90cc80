//! Request and response payloads of the bulk-upload HTTP surface.

use crate::model::progress::ProgressReport;
use crate::model::session::{RowRecord, SessionStatus};
use serde::{Deserialize, Serialize};

/// Optional `json` part accompanying the uploaded file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadRequest {
    /// Target ad-account identifier the rows should be submitted under.
    pub account_id: Option<String>,
}

/// Per-row verdict echoed back from the upload endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowValidationResult {
    pub row_index: usize,
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Synchronous result of parse + validate; no submission has happened yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub session_id: String,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub results: Vec<RowValidationResult>,
}

/// Body of `POST /process`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartProcessRequest {
    pub session_id: String,
}

/// Body of `POST /cancel`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelRequest {
    pub session_id: String,
}

/// Body of `POST /retry_failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryFailedRequest {
    pub session_id: String,
}

/// Immediate acknowledgment of a process or retry trigger. `started` is
/// false when the call was a no-op (e.g. the session is already terminal);
/// `status` then reports the current state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessAck {
    pub session_id: String,
    pub status: SessionStatus,
    pub started: bool,
    pub message: String,
}

/// Acknowledgment of a cancellation request. Cancellation is cooperative;
/// `accepted` only means the flag was set, not that the worker stopped yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAck {
    pub session_id: String,
    pub accepted: bool,
    pub message: String,
}

/// Progress poll payload: the aggregate report plus the rows a caller needs
/// detail for (validation-skipped rows and rows whose submission failed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub report: ProgressReport,
    pub failed_rows: Vec<RowRecord>,
}
