//! Derives the poller-facing progress view from a stored session.
//!
//! Counts are recomputed from the row outcomes on every call instead of
//! trusting the cached counters, so a snapshot taken mid-batch is always
//! internally consistent.

use common::model::progress::ProgressReport;
use common::model::session::UploadSession;

pub fn snapshot(session: &UploadSession) -> ProgressReport {
    let total = session.rows.len();
    let successful = session.rows.iter().filter(|r| r.outcome.is_success()).count();
    let failed = session.rows.iter().filter(|r| r.outcome.is_failed()).count();
    let skipped = session.rows.iter().filter(|r| !r.is_valid).count();
    let processed = successful + failed;
    let pending = total - processed;

    // An empty batch has nothing left to do.
    let percentage = if total == 0 {
        100
    } else {
        ((processed as f64 / total as f64) * 100.0).round() as u32
    };

    ProgressReport {
        total,
        processed,
        successful,
        failed,
        skipped,
        pending,
        status: session.status,
        percentage,
        error_log: session.error_log.clone(),
        updated_at: session.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::session::{
        RawRow, RemoteIds, RowOutcome, RowRecord, SessionStatus, SubmissionStep,
    };
    use serde_json::Map;

    fn row(index: usize, is_valid: bool, outcome: RowOutcome) -> RowRecord {
        RowRecord {
            row_index: index,
            raw: RawRow::new(),
            normalized: Map::new(),
            validation_errors: if is_valid { vec![] } else { vec!["bad".into()] },
            is_valid,
            outcome,
        }
    }

    fn ids() -> RemoteIds {
        RemoteIds {
            campaign_id: "cmp_1".into(),
            ad_set_id: "ads_1".into(),
            ad_id: "ad_1".into(),
        }
    }

    fn session(rows: Vec<RowRecord>) -> UploadSession {
        UploadSession::new("s1".into(), "ads.csv".into(), "deadbeef".into(), None, rows)
    }

    #[test]
    fn mid_batch_snapshot_counts_resolved_rows() {
        let mut s = session(vec![
            row(0, true, RowOutcome::Success { ids: ids() }),
            row(1, true, RowOutcome::Failed {
                step: SubmissionStep::AdSet,
                message: "rejected".into(),
            }),
            row(2, true, RowOutcome::Submitting { step: SubmissionStep::Campaign }),
            row(3, true, RowOutcome::Pending),
            row(4, true, RowOutcome::Pending),
        ]);
        s.status = SessionStatus::Processing;

        let report = snapshot(&s);
        assert_eq!(report.total, 5);
        assert_eq!(report.processed, 2);
        assert_eq!(report.successful, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.pending, 3);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.percentage, 40);
        assert_eq!(report.status, SessionStatus::Processing);
    }

    #[test]
    fn skipped_rows_stay_pending_but_visible() {
        let s = session(vec![
            row(0, false, RowOutcome::Pending),
            row(1, true, RowOutcome::Pending),
        ]);
        let report = snapshot(&s);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.pending, 2);
        assert_eq!(report.processed, 0);
        assert_eq!(report.percentage, 0);
    }

    #[test]
    fn empty_session_reports_one_hundred_percent() {
        let report = snapshot(&session(vec![]));
        assert_eq!(report.total, 0);
        assert_eq!(report.percentage, 100);
    }

    #[test]
    fn percentage_rounds_to_nearest() {
        let s = session(vec![
            row(0, true, RowOutcome::Success { ids: ids() }),
            row(1, true, RowOutcome::Pending),
            row(2, true, RowOutcome::Pending),
        ]);
        // 1 of 3 = 33.33… rounds down to 33.
        assert_eq!(snapshot(&s).percentage, 33);
    }

    #[test]
    fn aggregate_invariant_holds() {
        let s = session(vec![
            row(0, true, RowOutcome::Success { ids: ids() }),
            row(1, false, RowOutcome::Pending),
            row(2, true, RowOutcome::Failed {
                step: SubmissionStep::Ad,
                message: "nope".into(),
            }),
        ]);
        let report = snapshot(&s);
        assert_eq!(
            report.successful + report.failed + report.pending,
            report.total
        );
    }
}
