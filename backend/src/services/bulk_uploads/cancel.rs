use actix_web::{web, HttpResponse, Responder};

use crate::AppState;
use common::requests::{CancelAck, CancelRequest};

pub(crate) async fn process(
    request: web::Json<CancelRequest>,
    state: web::Data<AppState>,
) -> impl Responder {
    let session_id = request.session_id.clone();
    let accepted = state.workers.request_cancel(&session_id).await;
    let message = if accepted {
        "cancellation requested; the worker stops at the next row boundary".to_string()
    } else {
        "no running submission for this session".to_string()
    };
    HttpResponse::Ok().json(CancelAck {
        session_id,
        accepted,
        message,
    })
}
