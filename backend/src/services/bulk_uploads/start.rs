use actix_web::{web, HttpResponse, Responder};

use crate::error::StoreError;
use crate::AppState;
use common::requests::StartProcessRequest;

pub(crate) async fn process(
    request: web::Json<StartProcessRequest>,
    state: web::Data<AppState>,
) -> impl Responder {
    match state.worker.start(&request.session_id).await {
        Ok(ack) => HttpResponse::Ok().json(ack),
        Err(StoreError::NotFound(id)) => {
            HttpResponse::NotFound().body(format!("session {id} not found"))
        }
        Err(e) => {
            log::error!("failed to start session {}: {e}", request.session_id);
            HttpResponse::InternalServerError().body(format!("Error: {e}"))
        }
    }
}
