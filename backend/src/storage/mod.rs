//! Persistence boundary for upload sessions and their rows.

mod sqlite;

pub use sqlite::SqliteSessionStore;

use crate::error::StoreError;
use common::model::session::{RowOutcome, SessionStatus, SessionSummary, UploadSession};

/// Signed adjustment applied to a session's aggregate counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterDelta {
    pub successful: i64,
    pub failed: i64,
}

impl CounterDelta {
    pub fn resolved(success: bool) -> Self {
        if success {
            CounterDelta { successful: 1, failed: 0 }
        } else {
            CounterDelta { successful: 0, failed: 1 }
        }
    }
}

/// Logical persistence contract the pipeline requires.
///
/// Implementations must make `update_row_outcome` atomic per row (outcome,
/// remote ids and error text change together) and `update_counters` a
/// serialized read-modify-write, so pollers never observe a half-applied
/// row update or a lost counter increment.
pub trait SessionStore: Send + Sync {
    /// Persists a new session with all rows attached, atomically.
    fn create(&self, session: &UploadSession) -> Result<(), StoreError>;

    fn get(&self, id: &str) -> Result<UploadSession, StoreError>;

    /// Session summaries, newest first.
    fn list(&self) -> Result<Vec<SessionSummary>, StoreError>;

    fn update_row_outcome(
        &self,
        id: &str,
        row_index: usize,
        outcome: &RowOutcome,
    ) -> Result<(), StoreError>;

    fn update_counters(&self, id: &str, delta: CounterDelta) -> Result<(), StoreError>;

    /// Applies a status transition, refusing backward moves and any change
    /// out of a terminal state. Returns whether the status actually changed.
    /// `note` replaces the session's `error_log` when present.
    fn set_status(
        &self,
        id: &str,
        status: SessionStatus,
        note: Option<&str>,
    ) -> Result<bool, StoreError>;

    /// Resets every `Failed` row back to `Pending` for an explicit retry
    /// pass, returning how many rows were reset. Counters are not touched.
    fn reset_failed_rows(&self, id: &str) -> Result<usize, StoreError>;
}
