//! HTTP surface of the bulk campaign ingestion pipeline.
//!
//! The provided routes are:
//! - `POST /api/bulk_uploads/upload`: Handles multipart/form-data uploads.
//!   It expects a `file` field with the tabular data and an optional `json`
//!   field carrying upload options such as the target ad account. The file
//!   is parsed and validated synchronously; the response lists every row's
//!   verdict and the id of the persisted session. Nothing is submitted yet.
//!
//! - `POST /api/bulk_uploads/process`: Starts the asynchronous submission
//!   of a validated session and returns immediately. Re-triggering a
//!   session that is already processing or finished is acknowledged as a
//!   no-op, never resubmitted.
//!
//! - `GET /api/bulk_uploads/progress/{session_id}`: Polling endpoint. It
//!   returns the aggregate progress report plus the detail of rows that
//!   were skipped by validation or failed during submission.
//!
//! - `POST /api/bulk_uploads/cancel`: Cooperatively cancels a running
//!   session. Rows already submitted keep their outcome; the worker stops
//!   at the next row boundary.
//!
//! - `POST /api/bulk_uploads/retry_failed`: Re-queues only the failed rows
//!   of a finished session for another submission pass.
//!
//! - `GET /api/bulk_uploads/template`: Serves a CSV template of the
//!   expected columns with one sample row.
//!
//! - `GET /api/bulk_uploads/sessions`: Lists all known sessions, newest
//!   first, without their per-row detail.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod cancel;
mod get_progress;
mod list;
mod retry;
mod start;
mod template;
mod upload;

const API_PATH: &str = "/api/bulk_uploads";

/// Configures and returns the Actix scope for bulk upload routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        // Route to upload and validate a tabular file.
        .route("/upload", post().to(upload::process))
        // Route to start submitting a validated session.
        .route("/process", post().to(start::process))
        // Route to poll aggregate progress.
        .route("/progress/{session_id}", get().to(get_progress::process))
        // Route to request cooperative cancellation.
        .route("/cancel", post().to(cancel::process))
        // Route to re-queue failed rows.
        .route("/retry_failed", post().to(retry::process))
        // Route to download the column template.
        .route("/template", get().to(template::process))
        // Route to list sessions.
        .route("/sessions", get().to(list::process))
}
