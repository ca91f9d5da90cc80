use actix_web::{web, HttpResponse, Responder};

use crate::error::StoreError;
use crate::AppState;
use common::requests::RetryFailedRequest;

pub(crate) async fn process(
    request: web::Json<RetryFailedRequest>,
    state: web::Data<AppState>,
) -> impl Responder {
    match state.worker.retry_failed(&request.session_id).await {
        Ok(ack) => HttpResponse::Ok().json(ack),
        Err(StoreError::NotFound(id)) => {
            HttpResponse::NotFound().body(format!("session {id} not found"))
        }
        Err(e) => {
            log::error!("failed to retry session {}: {e}", request.session_id);
            HttpResponse::InternalServerError().body(format!("Error: {e}"))
        }
    }
}
