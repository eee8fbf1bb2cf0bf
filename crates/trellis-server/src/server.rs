use std::io;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};

use crate::handlers;
use crate::state::AppState;

/// Route table, separated so tests can mount it on a bare test app.
pub fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::dashboard::page))
        .route("/health", web::get().to(handlers::health::check))
        .route("/metrics", web::get().to(handlers::metrics::snapshot))
        .route("/metrics/reset", web::post().to(handlers::admin::reset_metrics))
        .route("/models", web::get().to(handlers::models::list))
        .route("/chat", web::post().to(handlers::chat::send))
        .route("/clear/{thread_id}", web::post().to(handlers::admin::clear_thread));
}

pub async fn run_server(port: u16, state: AppState) -> io::Result<()> {
    let state = web::Data::new(state);
    log::info!("HTTP server listening on 0.0.0.0:{port}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Cors::permissive())
            .configure(app_config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
