use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Timelike, Utc};
use trellis_core::TokenUsage;

use crate::snapshot::{HourlyBucket, MetricsSnapshot, ModelCounters};

/// Rolling window for the latency average.
const LATENCY_WINDOW: usize = 100;
/// A snapshot carries at most this many trailing hourly buckets.
const SNAPSHOT_BUCKETS: usize = 24;

#[derive(Debug, Default, Clone, Copy)]
struct BucketCounters {
    requests: u64,
    tokens: u64,
}

#[derive(Debug, Default)]
struct MetricsState {
    total_requests: u64,
    failed_requests: u64,
    total_tokens_in: u64,
    total_tokens_out: u64,
    per_model: BTreeMap<String, ModelCounters>,
    users: HashSet<String>,
    hourly: BTreeMap<DateTime<Utc>, BucketCounters>,
    latencies_ms: VecDeque<u64>,
    last_request_at: Option<DateTime<Utc>>,
}

/// Cumulative usage counters for the process lifetime.
///
/// Every field touched by one `record_request` moves under a single lock,
/// so a snapshot can never observe a request count without its paired token
/// counts. The lock is held only for plain field updates, never across I/O.
pub struct MetricsAggregator {
    started_at: DateTime<Utc>,
    state: Mutex<MetricsState>,
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            state: Mutex::new(MetricsState::default()),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Records one dispatch outcome as a single atomic unit.
    pub fn record_request(
        &self,
        alias: &str,
        usage: TokenUsage,
        latency: Duration,
        user_id: &str,
        success: bool,
    ) {
        self.record_at(Utc::now(), alias, usage, latency, user_id, success);
    }

    fn record_at(
        &self,
        now: DateTime<Utc>,
        alias: &str,
        usage: TokenUsage,
        latency: Duration,
        user_id: &str,
        success: bool,
    ) {
        let mut state = self.lock_state();

        state.total_requests += 1;
        if !success {
            state.failed_requests += 1;
        }
        state.total_tokens_in += usage.tokens_in;
        state.total_tokens_out += usage.tokens_out;

        let model = state.per_model.entry(alias.to_string()).or_default();
        model.requests += 1;
        model.tokens += usage.total();

        state.users.insert(user_id.to_string());

        let bucket = state.hourly.entry(hour_floor(now)).or_default();
        bucket.requests += 1;
        bucket.tokens += usage.total();

        let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        state.latencies_ms.push_back(latency_ms);
        while state.latencies_ms.len() > LATENCY_WINDOW {
            state.latencies_ms.pop_front();
        }

        state.last_request_at = Some(now);
    }

    /// Copies the current counters under the lock. The copy is internally
    /// consistent by construction.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.lock_state();

        let avg_latency_ms = if state.latencies_ms.is_empty() {
            0
        } else {
            state.latencies_ms.iter().sum::<u64>() / state.latencies_ms.len() as u64
        };

        let mut hourly_buckets: Vec<HourlyBucket> = state
            .hourly
            .iter()
            .map(|(hour, counters)| HourlyBucket {
                hour: *hour,
                requests: counters.requests,
                tokens: counters.tokens,
            })
            .collect();
        if hourly_buckets.len() > SNAPSHOT_BUCKETS {
            let excess = hourly_buckets.len() - SNAPSHOT_BUCKETS;
            hourly_buckets.drain(..excess);
        }

        MetricsSnapshot {
            total_requests: state.total_requests,
            failed_requests: state.failed_requests,
            total_tokens_in: state.total_tokens_in,
            total_tokens_out: state.total_tokens_out,
            unique_users: state.users.len() as u64,
            per_model: state.per_model.clone(),
            hourly_buckets,
            avg_latency_ms,
            started_at: self.started_at,
            last_request_at: state.last_request_at,
        }
    }

    /// Zeroes every counter. Administrative action only; nothing calls this
    /// automatically.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        *state = MetricsState::default();
        log::info!("metrics counters reset");
    }

    /// Drops hourly buckets older than `retention`. Returns how many were
    /// dropped.
    pub fn prune_buckets(&self, retention: Duration) -> usize {
        let retention =
            ChronoDuration::from_std(retention).unwrap_or_else(|_| ChronoDuration::hours(24));
        let cutoff = hour_floor(Utc::now() - retention);

        let mut state = self.lock_state();
        let before = state.hourly.len();
        state.hourly.retain(|hour, _| *hour >= cutoff);
        before - state.hourly.len()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, MetricsState> {
        // A panic elsewhere cannot leave these plain counters structurally
        // broken, so a poisoned lock is still usable.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn hour_floor(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}
