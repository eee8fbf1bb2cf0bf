use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use serde::Serialize;
use trellis_metrics::MetricsSnapshot;

use crate::state::AppState;

/// The dashboard read contract: the aggregator snapshot plus the two
/// gauges only the store and clock know.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MetricsBody {
    #[serde(flatten)]
    snapshot: MetricsSnapshot,
    active_conversations: usize,
    uptime_seconds: i64,
}

pub async fn snapshot(state: web::Data<AppState>) -> impl Responder {
    let snapshot = state.metrics.snapshot();
    let uptime_seconds = (Utc::now() - snapshot.started_at).num_seconds().max(0);
    HttpResponse::Ok().json(MetricsBody {
        snapshot,
        active_conversations: state.store.active_count().await,
        uptime_seconds,
    })
}
