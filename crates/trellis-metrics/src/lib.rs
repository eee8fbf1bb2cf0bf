//! Aggregate usage metrics for the trellis gateway.
//!
//! Counters live for the process lifetime only; there is no persistence.
//! One [`MetricsAggregator`] serves every producer, and each recorded
//! request lands as a single atomic unit so dashboard snapshots are always
//! internally consistent.

pub mod aggregator;
pub mod snapshot;

pub use aggregator::MetricsAggregator;
pub use snapshot::{HourlyBucket, MetricsSnapshot, ModelCounters};
