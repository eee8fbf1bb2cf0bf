use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use trellis_llm::ModelCatalog;
use trellis_metrics::MetricsSnapshot;

use crate::state::AppState;

const DASHBOARD_TEMPLATE: &str = include_str!("../dashboard.html");

pub async fn page(state: web::Data<AppState>) -> impl Responder {
    let snapshot = state.metrics.snapshot();
    let active = state.store.active_count().await;
    let html = render(&snapshot, active, state.router.catalog());
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html)
}

fn render(snapshot: &MetricsSnapshot, active_conversations: usize, catalog: &ModelCatalog) -> String {
    let uptime_seconds = (Utc::now() - snapshot.started_at).num_seconds().max(0);
    let last_request = snapshot
        .last_request_at
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    let total_tokens = snapshot.total_tokens_in + snapshot.total_tokens_out;

    DASHBOARD_TEMPLATE
        .replace("{{TOTAL_REQUESTS}}", &snapshot.total_requests.to_string())
        .replace("{{FAILED_REQUESTS}}", &snapshot.failed_requests.to_string())
        .replace("{{TOTAL_TOKENS}}", &total_tokens.to_string())
        .replace("{{UNIQUE_USERS}}", &snapshot.unique_users.to_string())
        .replace(
            "{{ACTIVE_CONVERSATIONS}}",
            &active_conversations.to_string(),
        )
        .replace("{{AVG_LATENCY_MS}}", &snapshot.avg_latency_ms.to_string())
        .replace("{{UPTIME}}", &format_uptime(uptime_seconds))
        .replace("{{LAST_REQUEST}}", &last_request)
        .replace("{{MODEL_ROWS}}", &model_rows(snapshot, catalog))
        .replace("{{HOURLY_ROWS}}", &hourly_rows(snapshot))
}

fn model_rows(snapshot: &MetricsSnapshot, catalog: &ModelCatalog) -> String {
    let mut rows = String::new();
    for (alias, model_id) in catalog.alias_table() {
        let counters = snapshot.per_model.get(&alias).copied().unwrap_or_default();
        rows.push_str(&format!(
            "<tr><td>{alias}</td><td>{model_id}</td>\
             <td class=\"num\">{}</td><td class=\"num\">{}</td></tr>\n",
            counters.requests, counters.tokens
        ));
    }
    // Failures count under the alias the caller asked for, which may not
    // exist in the catalog.
    for (alias, counters) in &snapshot.per_model {
        if catalog.get(alias).is_none() {
            rows.push_str(&format!(
                "<tr><td>{alias}</td><td>&mdash;</td>\
                 <td class=\"num\">{}</td><td class=\"num\">{}</td></tr>\n",
                counters.requests, counters.tokens
            ));
        }
    }
    rows
}

fn hourly_rows(snapshot: &MetricsSnapshot) -> String {
    if snapshot.hourly_buckets.is_empty() {
        return "<tr><td colspan=\"3\">No requests yet</td></tr>".to_string();
    }
    snapshot
        .hourly_buckets
        .iter()
        .rev()
        .map(|bucket| {
            format!(
                "<tr><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td></tr>\n",
                bucket.hour.format("%Y-%m-%d %H:00"),
                bucket.requests,
                bucket.tokens
            )
        })
        .collect()
}

fn format_uptime(seconds: i64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m {}s", seconds % 60)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::TimeZone;
    use trellis_metrics::{HourlyBucket, ModelCounters};

    use super::*;

    fn sample_snapshot() -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: 12,
            failed_requests: 2,
            total_tokens_in: 300,
            total_tokens_out: 900,
            unique_users: 4,
            per_model: BTreeMap::from([
                (
                    "maverick".to_string(),
                    ModelCounters {
                        requests: 10,
                        tokens: 1100,
                    },
                ),
                (
                    "retired-alias".to_string(),
                    ModelCounters {
                        requests: 2,
                        tokens: 100,
                    },
                ),
            ]),
            hourly_buckets: vec![HourlyBucket {
                hour: Utc.with_ymd_and_hms(2025, 6, 1, 14, 0, 0).unwrap(),
                requests: 12,
                tokens: 1200,
            }],
            avg_latency_ms: 450,
            started_at: Utc::now(),
            last_request_at: Some(Utc::now()),
        }
    }

    #[test]
    fn render_substitutes_every_placeholder() {
        let catalog = ModelCatalog::builtin("workspace.example.com");
        let html = render(&sample_snapshot(), 3, &catalog);

        assert!(!html.contains("{{"), "unfilled placeholder in: {html}");
        assert!(html.contains("maverick"));
        assert!(html.contains("2025-06-01 14:00"));
        assert!(html.contains("450ms"));
    }

    #[test]
    fn uncatalogued_aliases_still_get_a_row() {
        let catalog = ModelCatalog::builtin("workspace.example.com");
        let html = render(&sample_snapshot(), 0, &catalog);

        assert!(html.contains("retired-alias"));
    }

    #[test]
    fn empty_buckets_render_a_stub_row() {
        let catalog = ModelCatalog::builtin("workspace.example.com");
        let mut snapshot = sample_snapshot();
        snapshot.hourly_buckets.clear();
        let html = render(&snapshot, 0, &catalog);

        assert!(html.contains("No requests yet"));
    }

    #[test]
    fn uptime_formats_by_magnitude() {
        assert_eq!(format_uptime(42), "0m 42s");
        assert_eq!(format_uptime(3 * 3600 + 25 * 60), "3h 25m");
        assert_eq!(format_uptime(2 * 86_400 + 3600 + 60), "2d 1h 1m");
    }
}
