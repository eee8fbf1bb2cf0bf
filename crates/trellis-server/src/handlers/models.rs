use actix_web::{web, HttpResponse, Responder};

use crate::state::AppState;

pub async fn list(state: web::Data<AppState>) -> impl Responder {
    let catalog = state.router.catalog();
    HttpResponse::Ok().json(serde_json::json!({
        "models": catalog.alias_table(),
        "default": catalog.default_alias(),
    }))
}
