//! Core aggregate of one bulk-upload attempt: the session, its per-row
//! records, and the submission outcome state machine.
//!
//! A session is created once parsing and validation succeed, then mutated
//! row by row while the submission worker drives the remote creation of one
//! campaign / ad set / ad triple per valid row. Row order is load-bearing:
//! `row_index` is the only external handle to a row and is never reassigned.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One parsed data row, keyed by the file's header cells in file order.
pub type RawRow = IndexMap<String, String>;

/// Lifecycle status of an upload session. Transitions are forward-only and
/// `Completed` / `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Uploading,
    Validating,
    Processing,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }

    fn rank(self) -> u8 {
        match self {
            SessionStatus::Uploading => 0,
            SessionStatus::Validating => 1,
            SessionStatus::Processing => 2,
            SessionStatus::Completed | SessionStatus::Failed => 3,
        }
    }

    /// Whether moving to `next` respects the forward-only state machine.
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Uploading => "UPLOADING",
            SessionStatus::Validating => "VALIDATING",
            SessionStatus::Processing => "PROCESSING",
            SessionStatus::Completed => "COMPLETED",
            SessionStatus::Failed => "FAILED",
        }
    }

    pub fn parse(value: &str) -> Option<SessionStatus> {
        match value {
            "UPLOADING" => Some(SessionStatus::Uploading),
            "VALIDATING" => Some(SessionStatus::Validating),
            "PROCESSING" => Some(SessionStatus::Processing),
            "COMPLETED" => Some(SessionStatus::Completed),
            "FAILED" => Some(SessionStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three remote calls a row goes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStep {
    Campaign,
    AdSet,
    Ad,
}

impl fmt::Display for SubmissionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SubmissionStep::Campaign => "campaign",
            SubmissionStep::AdSet => "ad set",
            SubmissionStep::Ad => "ad",
        })
    }
}

/// Remote identifiers returned by the advertising platform for one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIds {
    pub campaign_id: String,
    pub ad_set_id: String,
    pub ad_id: String,
}

/// Submission outcome of a single row.
///
/// The step is carried in `Submitting` and `Failed` so partial progress
/// within a row (campaign created, ad set rejected) stays representable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowOutcome {
    Pending,
    Submitting { step: SubmissionStep },
    Success { ids: RemoteIds },
    Failed { step: SubmissionStep, message: String },
}

impl RowOutcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, RowOutcome::Pending)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RowOutcome::Success { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RowOutcome::Failed { .. })
    }

    /// A row is resolved once it reached `Success` or `Failed`.
    pub fn is_resolved(&self) -> bool {
        self.is_success() || self.is_failed()
    }
}

/// One row of the uploaded file plus everything the pipeline learned about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowRecord {
    /// 0-based position in the source file; unique within a session.
    pub row_index: usize,
    /// Original cell values as parsed, kept for audit and debugging.
    pub raw: RawRow,
    /// Typed/coerced values, best effort: populated even for invalid rows,
    /// with failed coercions left as the raw string.
    pub normalized: Map<String, Value>,
    pub validation_errors: Vec<String>,
    pub is_valid: bool,
    pub outcome: RowOutcome,
}

impl RowRecord {
    /// Rows the submission worker will pick up on the next pass.
    pub fn is_eligible(&self) -> bool {
        self.is_valid && self.outcome.is_pending()
    }
}

/// Persistent aggregate of one bulk-upload job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadSession {
    pub id: String,
    pub source_file_name: String,
    /// md5 of the uploaded bytes, recorded at parse time.
    pub checksum: String,
    /// Optional target ad-account identifier supplied with the upload.
    pub account_id: Option<String>,
    pub total_rows: usize,
    pub successful_count: usize,
    pub failed_count: usize,
    pub status: SessionStatus,
    /// Fatal cause or completion note (e.g. a cancellation notice).
    pub error_log: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Ordered by `row_index`; `rows.len() == total_rows` always holds.
    pub rows: Vec<RowRecord>,
}

impl UploadSession {
    /// Builds a freshly validated session. Sessions only become persistent
    /// after parse + validation succeed, so they start in `Validating`.
    pub fn new(
        id: String,
        source_file_name: String,
        checksum: String,
        account_id: Option<String>,
        rows: Vec<RowRecord>,
    ) -> Self {
        let now = Utc::now();
        UploadSession {
            id,
            source_file_name,
            checksum,
            account_id,
            total_rows: rows.len(),
            successful_count: 0,
            failed_count: 0,
            status: SessionStatus::Validating,
            error_log: None,
            created_at: now,
            updated_at: now,
            rows,
        }
    }

    /// Rows not yet resolved, including invalid rows that will never be
    /// attempted. Keeps `successful + failed + pending == total`.
    pub fn pending_count(&self) -> usize {
        self.total_rows - self.successful_count - self.failed_count
    }
}

/// Lightweight listing form of a session, without its rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub source_file_name: String,
    pub total_rows: usize,
    pub successful_count: usize,
    pub failed_count: usize,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_are_permitted() {
        assert!(SessionStatus::Uploading.can_transition_to(SessionStatus::Validating));
        assert!(SessionStatus::Validating.can_transition_to(SessionStatus::Processing));
        assert!(SessionStatus::Validating.can_transition_to(SessionStatus::Failed));
        assert!(SessionStatus::Processing.can_transition_to(SessionStatus::Completed));
        assert!(SessionStatus::Processing.can_transition_to(SessionStatus::Failed));
    }

    #[test]
    fn backward_and_terminal_transitions_are_rejected() {
        assert!(!SessionStatus::Processing.can_transition_to(SessionStatus::Validating));
        assert!(!SessionStatus::Completed.can_transition_to(SessionStatus::Failed));
        assert!(!SessionStatus::Completed.can_transition_to(SessionStatus::Processing));
        assert!(!SessionStatus::Failed.can_transition_to(SessionStatus::Completed));
        assert!(!SessionStatus::Validating.can_transition_to(SessionStatus::Validating));
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            SessionStatus::Uploading,
            SessionStatus::Validating,
            SessionStatus::Processing,
            SessionStatus::Completed,
            SessionStatus::Failed,
        ] {
            assert_eq!(SessionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SessionStatus::parse("BOGUS"), None);
    }

    #[test]
    fn invalid_rows_are_never_eligible() {
        let row = RowRecord {
            row_index: 0,
            raw: RawRow::new(),
            normalized: Map::new(),
            validation_errors: vec!["Budget is required".into()],
            is_valid: false,
            outcome: RowOutcome::Pending,
        };
        assert!(!row.is_eligible());
    }

    #[test]
    fn pending_count_closes_the_aggregate_invariant() {
        let rows = vec![
            RowRecord {
                row_index: 0,
                raw: RawRow::new(),
                normalized: Map::new(),
                validation_errors: vec![],
                is_valid: true,
                outcome: RowOutcome::Pending,
            },
            RowRecord {
                row_index: 1,
                raw: RawRow::new(),
                normalized: Map::new(),
                validation_errors: vec![],
                is_valid: true,
                outcome: RowOutcome::Pending,
            },
        ];
        let mut session = UploadSession::new(
            "s1".into(),
            "ads.csv".into(),
            "d41d8cd98f00b204e9800998ecf8427e".into(),
            None,
            rows,
        );
        assert_eq!(session.status, SessionStatus::Validating);
        assert_eq!(session.pending_count(), 2);

        session.successful_count = 1;
        session.failed_count = 1;
        assert_eq!(
            session.successful_count + session.failed_count + session.pending_count(),
            session.total_rows
        );
    }
}
