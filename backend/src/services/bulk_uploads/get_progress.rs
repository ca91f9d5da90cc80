use actix_web::{web, HttpResponse, Responder};

use crate::error::StoreError;
use crate::pipeline::progress;
use crate::AppState;
use common::requests::ProgressResponse;

pub(crate) async fn process(
    session_id: web::Path<String>,
    state: web::Data<AppState>,
) -> impl Responder {
    match state.store.get(&session_id.into_inner()) {
        Ok(session) => {
            let report = progress::snapshot(&session);
            // Pollers need detail only for rows that require attention.
            let failed_rows = session
                .rows
                .into_iter()
                .filter(|r| !r.is_valid || r.outcome.is_failed())
                .collect();
            HttpResponse::Ok().json(ProgressResponse {
                report,
                failed_rows,
            })
        }
        Err(StoreError::NotFound(id)) => {
            HttpResponse::NotFound().body(format!("session {id} not found"))
        }
        Err(e) => HttpResponse::InternalServerError().body(format!("Error: {e}")),
    }
}
