use actix_web::{web, HttpResponse, Responder};

use crate::AppState;

pub(crate) async fn process(state: web::Data<AppState>) -> impl Responder {
    match state.store.list() {
        Ok(sessions) => HttpResponse::Ok().json(sessions),
        Err(e) => HttpResponse::InternalServerError().body(format!("Error: {e}")),
    }
}
