use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-model rollup. `tokens` is input plus output.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModelCounters {
    pub requests: u64,
    pub tokens: u64,
}

/// One hour-truncated bucket of request activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HourlyBucket {
    pub hour: DateTime<Utc>,
    pub requests: u64,
    pub tokens: u64,
}

/// A point-in-time, internally consistent copy of the counters. Field names
/// serialize in the camelCase shape the dashboard reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub failed_requests: u64,
    pub total_tokens_in: u64,
    pub total_tokens_out: u64,
    pub unique_users: u64,
    pub per_model: BTreeMap<String, ModelCounters>,
    /// Ascending by hour; at most the most recent 24 buckets.
    pub hourly_buckets: Vec<HourlyBucket>,
    pub avg_latency_ms: u64,
    pub started_at: DateTime<Utc>,
    pub last_request_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_serializes_camel_case() {
        let snapshot = MetricsSnapshot {
            total_requests: 3,
            failed_requests: 1,
            total_tokens_in: 30,
            total_tokens_out: 60,
            unique_users: 2,
            per_model: BTreeMap::from([(
                "maverick".to_string(),
                ModelCounters {
                    requests: 3,
                    tokens: 90,
                },
            )]),
            hourly_buckets: Vec::new(),
            avg_latency_ms: 120,
            started_at: Utc::now(),
            last_request_at: None,
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["totalRequests"], 3);
        assert_eq!(json["totalTokensIn"], 30);
        assert_eq!(json["uniqueUsers"], 2);
        assert_eq!(json["perModel"]["maverick"]["requests"], 3);
        assert_eq!(json["avgLatencyMs"], 120);
    }
}
