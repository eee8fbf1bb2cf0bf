use actix_web::{web, HttpResponse, Responder};

use crate::state::AppState;

pub async fn clear_thread(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let thread_id = path.into_inner();
    let status = if state.store.clear(&thread_id).await {
        "cleared"
    } else {
        "not_found"
    };
    HttpResponse::Ok().json(serde_json::json!({
        "status": status,
        "thread_id": thread_id,
    }))
}

pub async fn reset_metrics(state: web::Data<AppState>) -> impl Responder {
    log::warn!("metrics counters reset via admin endpoint");
    state.metrics.reset();
    HttpResponse::Ok().json(serde_json::json!({ "status": "reset" }))
}
