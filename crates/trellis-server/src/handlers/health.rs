use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;

use crate::state::AppState;

pub async fn check(state: web::Data<AppState>) -> impl Responder {
    let uptime_seconds = (Utc::now() - state.metrics.started_at()).num_seconds().max(0);
    let snapshot = state.metrics.snapshot();
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now(),
        "uptime_seconds": uptime_seconds,
        "requests": snapshot.total_requests,
        "users": snapshot.unique_users,
        "active_conversations": state.store.active_count().await,
        "backend_configured": state.router.has_credentials(),
        "platform_configured": state.platform_configured,
    }))
}
