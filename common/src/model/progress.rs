//! Aggregate progress view served to pollers.

use crate::model::session::SessionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of a session's aggregate counters, derived from its rows.
///
/// `skipped` counts rows excluded from submission by validation; `pending`
/// counts rows not yet resolved (which includes the skipped ones), so that
/// "skipped", "attempted and failed" and "not yet attempted" remain three
/// distinct, simultaneously visible states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub total: usize,
    /// `successful + failed`.
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    pub pending: usize,
    pub status: SessionStatus,
    /// `round(processed / total * 100)`; 100 for an empty session.
    pub percentage: u32,
    pub error_log: Option<String>,
    pub updated_at: DateTime<Utc>,
}
