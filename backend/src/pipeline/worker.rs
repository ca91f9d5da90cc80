//! Asynchronous submission of a validated session.
//!
//! `start` flips the session to `Processing` and spawns a task that walks
//! the eligible rows in index order, creating the campaign / ad set / ad
//! triple for each. Rows fail independently: a remote rejection marks that
//! row `Failed` and the walk continues. The worker writes row outcomes
//! directly but routes counter changes and terminal status through the
//! update channel, where the central updater applies them serially.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ClientError, StoreError};
use crate::job_controller::state::{SessionUpdate, WorkerState};
use crate::storage::{CounterDelta, SessionStore};
use crate::submission::{AdFields, AdSetFields, CampaignFields, CampaignSubmissionClient};
use common::model::session::{
    RemoteIds, RowOutcome, RowRecord, SessionStatus, SubmissionStep, UploadSession,
};
use common::requests::ProcessAck;

#[derive(Clone)]
pub struct SubmissionWorker {
    store: Arc<dyn SessionStore>,
    client: Arc<dyn CampaignSubmissionClient>,
    state: WorkerState,
    call_timeout: Duration,
}

impl SubmissionWorker {
    pub fn new(
        store: Arc<dyn SessionStore>,
        client: Arc<dyn CampaignSubmissionClient>,
        state: WorkerState,
        call_timeout: Duration,
    ) -> Self {
        SubmissionWorker {
            store,
            client,
            state,
            call_timeout,
        }
    }

    /// Starts submission for a freshly validated session. Anything other
    /// than `VALIDATING` makes this a no-op acknowledgment: re-triggering a
    /// running or finished session must not resubmit rows.
    pub async fn start(&self, session_id: &str) -> Result<ProcessAck, StoreError> {
        let session = self.store.get(session_id)?;
        if session.status != SessionStatus::Validating {
            return Ok(ProcessAck {
                session_id: session_id.to_string(),
                status: session.status,
                started: false,
                message: format!(
                    "session is {} and cannot be started again",
                    session.status
                ),
            });
        }

        // The store transition is the compare-and-set: a second caller
        // racing past the status read above loses here and must not spawn.
        let transitioned = self
            .store
            .set_status(session_id, SessionStatus::Processing, None)?;
        if !transitioned {
            let current = self.store.get(session_id)?;
            return Ok(ProcessAck {
                session_id: session_id.to_string(),
                status: current.status,
                started: false,
                message: "submission already triggered by a concurrent request".into(),
            });
        }

        self.spawn_rows(session).await;

        Ok(ProcessAck {
            session_id: session_id.to_string(),
            status: SessionStatus::Processing,
            started: true,
            message: "submission started".into(),
        })
    }

    /// Re-queues the failed rows of a terminal session. Counters are rolled
    /// back by the number of rows reset; the session status stays terminal
    /// until the first retried row resolves and has already re-entered via
    /// the reset path.
    pub async fn retry_failed(&self, session_id: &str) -> Result<ProcessAck, StoreError> {
        let session = self.store.get(session_id)?;

        // A running worker holds its own eligibility snapshot; resetting
        // rows under it would submit overlapping rows twice. Retry only
        // applies once the first pass is over.
        if session.status == SessionStatus::Processing {
            return Ok(ProcessAck {
                session_id: session_id.to_string(),
                status: session.status,
                started: false,
                message: "session is still processing; retry once it finishes".into(),
            });
        }

        let reset = self.store.reset_failed_rows(session_id)?;
        if reset == 0 {
            return Ok(ProcessAck {
                session_id: session_id.to_string(),
                status: session.status,
                started: false,
                message: "no failed rows to retry".into(),
            });
        }

        self.store.update_counters(
            session_id,
            CounterDelta {
                successful: 0,
                failed: -(reset as i64),
            },
        )?;

        let session = self.store.get(session_id)?;
        let status = session.status;
        self.spawn_rows(session).await;

        Ok(ProcessAck {
            session_id: session_id.to_string(),
            status,
            started: true,
            message: format!("retrying {reset} failed rows"),
        })
    }

    async fn spawn_rows(&self, session: UploadSession) {
        let cancel = self.state.register(&session.id).await;
        let worker = self.clone();
        tokio::spawn(async move {
            let session_id = session.id.clone();
            if let Err(err) = worker.run_rows(session, cancel).await {
                let _ = worker
                    .state
                    .tx
                    .send(SessionUpdate::Fatal {
                        session_id,
                        error: err.to_string(),
                    })
                    .await;
            }
        });
    }

    async fn run_rows(
        &self,
        session: UploadSession,
        cancel: Arc<AtomicBool>,
    ) -> Result<(), StoreError> {
        let eligible: Vec<&RowRecord> =
            session.rows.iter().filter(|r| r.is_eligible()).collect();

        if eligible.is_empty() {
            self.state
                .tx
                .send(SessionUpdate::Finished {
                    session_id: session.id.clone(),
                    note: Some("no valid rows to submit".into()),
                })
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            return Ok(());
        }

        let total_eligible = eligible.len();
        let mut attempted = 0usize;
        let mut note = None;

        for row in eligible {
            // Cooperative cancellation: only between rows, never mid-triple.
            if cancel.load(Ordering::SeqCst) {
                note = Some(format!(
                    "cancelled before completion; {} of {} eligible rows were not attempted",
                    total_eligible - attempted,
                    total_eligible
                ));
                break;
            }

            let outcome = self.submit_row(&session, row).await?;
            let success = outcome.is_success();
            self.store
                .update_row_outcome(&session.id, row.row_index, &outcome)?;
            self.state
                .tx
                .send(SessionUpdate::RowResolved {
                    session_id: session.id.clone(),
                    row_index: row.row_index,
                    success,
                })
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            attempted += 1;
        }

        self.state
            .tx
            .send(SessionUpdate::Finished {
                session_id: session.id.clone(),
                note,
            })
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    /// Drives one row through its three remote calls. Remote failures are
    /// data, not errors: they resolve the row as `Failed` at the step that
    /// broke. Only storage faults propagate.
    async fn submit_row(
        &self,
        session: &UploadSession,
        row: &RowRecord,
    ) -> Result<RowOutcome, StoreError> {
        let campaign = CampaignFields::from_normalized(&row.normalized, session.account_id.as_deref());
        let ad_set = AdSetFields::from_normalized(&row.normalized);
        let ad = AdFields::from_normalized(&row.normalized);

        self.mark_submitting(session, row, SubmissionStep::Campaign)?;
        let campaign_id = match self
            .bounded(self.client.create_campaign(&campaign))
            .await
        {
            Ok(id) => id,
            Err(err) => return Ok(failed(SubmissionStep::Campaign, err)),
        };

        self.mark_submitting(session, row, SubmissionStep::AdSet)?;
        let ad_set_id = match self
            .bounded(self.client.create_ad_set(&campaign_id, &ad_set))
            .await
        {
            Ok(id) => id,
            Err(err) => return Ok(failed(SubmissionStep::AdSet, err)),
        };

        self.mark_submitting(session, row, SubmissionStep::Ad)?;
        let ad_id = match self.bounded(self.client.create_ad(&ad_set_id, &ad)).await {
            Ok(id) => id,
            Err(err) => return Ok(failed(SubmissionStep::Ad, err)),
        };

        Ok(RowOutcome::Success {
            ids: RemoteIds {
                campaign_id,
                ad_set_id,
                ad_id,
            },
        })
    }

    fn mark_submitting(
        &self,
        session: &UploadSession,
        row: &RowRecord,
        step: SubmissionStep,
    ) -> Result<(), StoreError> {
        self.store.update_row_outcome(
            &session.id,
            row.row_index,
            &RowOutcome::Submitting { step },
        )
    }

    /// Applies the per-call deadline; an elapsed timer reads as a timeout
    /// from the platform.
    async fn bounded<F>(&self, call: F) -> Result<String, ClientError>
    where
        F: std::future::Future<Output = Result<String, ClientError>>,
    {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout),
        }
    }
}

fn failed(step: SubmissionStep, err: ClientError) -> RowOutcome {
    RowOutcome::Failed {
        step,
        message: format!("{step} creation failed: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_messages_name_the_step() {
        let outcome = failed(SubmissionStep::AdSet, ClientError::Timeout);
        let RowOutcome::Failed { step, message } = outcome else {
            panic!("expected a failed outcome");
        };
        assert_eq!(step, SubmissionStep::AdSet);
        assert_eq!(message, "ad set creation failed: request timed out");
    }
}
