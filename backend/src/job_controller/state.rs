//! Shared state of running submission jobs.
//!
//! Background workers never write session counters or terminal status
//! themselves: they push [`SessionUpdate`] messages into an MPSC channel,
//! and the single [`start_session_updater`] task applies them to the store
//! in arrival order. That keeps counter updates serialized through one
//! writer no matter how many sessions are being processed at once.
//!
//! The components are:
//! - `WorkerState`: a clonable, thread-safe handle holding per-session
//!   cancellation flags and the update channel sender. It is injected into
//!   the Actix application state in `main.rs`.
//! - `SessionUpdate`: a message describing one state change produced by a
//!   background worker.
//! - `start_session_updater`: the long-running task consuming the channel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use crate::storage::{CounterDelta, SessionStore};
use common::model::session::SessionStatus;

/// Thread-safe, shareable coordination handle for all running jobs.
#[derive(Clone)]
pub struct WorkerState {
    /// One cancellation flag per actively processing session. A worker
    /// checks its flag between rows; the cancel endpoint only flips it.
    cancels: Arc<RwLock<HashMap<String, Arc<AtomicBool>>>>,

    /// Sender side of the update channel consumed by
    /// `start_session_updater`. Cloned into every spawned worker.
    pub tx: mpsc::Sender<SessionUpdate>,
}

impl WorkerState {
    pub fn new(tx: mpsc::Sender<SessionUpdate>) -> Self {
        WorkerState {
            cancels: Arc::new(RwLock::new(HashMap::new())),
            tx,
        }
    }

    /// Registers (or re-arms) the cancellation flag for a session about to
    /// be processed, returning the flag the worker should watch.
    pub async fn register(&self, session_id: &str) -> Arc<AtomicBool> {
        let flag = Arc::new(AtomicBool::new(false));
        self.cancels
            .write()
            .await
            .insert(session_id.to_string(), flag.clone());
        flag
    }

    /// Requests cancellation of a running session. Returns false when no
    /// worker is registered for it, which callers report as "nothing to
    /// cancel" rather than an error.
    pub async fn request_cancel(&self, session_id: &str) -> bool {
        match self.cancels.read().await.get(session_id) {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// Drops the flag once a session reached a terminal state.
    pub async fn clear(&self, session_id: &str) {
        self.cancels.write().await.remove(session_id);
    }
}

/// One state change reported by a background worker.
#[derive(Debug)]
pub enum SessionUpdate {
    /// A row reached `Success` or `Failed`; adjust the session counters.
    RowResolved {
        session_id: String,
        row_index: usize,
        success: bool,
    },
    /// The batch ran to the end (possibly after a cancellation request).
    Finished {
        session_id: String,
        note: Option<String>,
    },
    /// The worker hit a storage fault and cannot continue.
    Fatal { session_id: String, error: String },
}

/// Central updater task; spawn once at startup.
///
/// Applies every received update to the store. It is the only writer of
/// session counters and terminal statuses, so increments are never lost to
/// concurrent read-modify-write races.
pub async fn start_session_updater(
    store: Arc<dyn SessionStore>,
    state: WorkerState,
    mut rx: mpsc::Receiver<SessionUpdate>,
) {
    while let Some(update) = rx.recv().await {
        match update {
            SessionUpdate::RowResolved {
                session_id,
                row_index,
                success,
            } => {
                if let Err(err) =
                    store.update_counters(&session_id, CounterDelta::resolved(success))
                {
                    log::error!(
                        "session {session_id}: failed to record row {row_index} resolution: {err}"
                    );
                }
            }
            SessionUpdate::Finished { session_id, note } => {
                if let Err(err) =
                    store.set_status(&session_id, SessionStatus::Completed, note.as_deref())
                {
                    log::error!("session {session_id}: failed to mark completed: {err}");
                }
                state.clear(&session_id).await;
            }
            SessionUpdate::Fatal { session_id, error } => {
                log::error!("session {session_id}: submission aborted: {error}");
                if let Err(err) =
                    store.set_status(&session_id, SessionStatus::Failed, Some(&error))
                {
                    log::error!("session {session_id}: failed to mark failed: {err}");
                }
                state.clear(&session_id).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_only_reaches_registered_sessions() {
        let (tx, _rx) = mpsc::channel(4);
        let state = WorkerState::new(tx);

        assert!(!state.request_cancel("ghost").await);

        let flag = state.register("s1").await;
        assert!(!flag.load(Ordering::SeqCst));
        assert!(state.request_cancel("s1").await);
        assert!(flag.load(Ordering::SeqCst));

        state.clear("s1").await;
        assert!(!state.request_cancel("s1").await);
    }

    #[tokio::test]
    async fn re_registering_rearms_the_flag() {
        let (tx, _rx) = mpsc::channel(4);
        let state = WorkerState::new(tx);

        let first = state.register("s1").await;
        first.store(true, Ordering::SeqCst);

        let second = state.register("s1").await;
        assert!(!second.load(Ordering::SeqCst));
    }
}
