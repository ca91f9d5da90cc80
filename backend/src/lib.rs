//! Bulk campaign ingestion service.
//!
//! Takes an uploaded tabular file describing campaign / ad set / ad triples,
//! validates every row against the shared column schema, and drives an
//! asynchronous, per-row submission process against the advertising platform
//! while exposing aggregate progress to pollers.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod job_controller;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod submission;

use crate::job_controller::state::WorkerState;
use crate::pipeline::worker::SubmissionWorker;
use crate::storage::SessionStore;

/// Shared application state injected into every handler as `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SessionStore>,
    pub worker: SubmissionWorker,
    pub workers: WorkerState,
}
