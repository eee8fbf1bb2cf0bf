use std::time::Duration;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant powered by Databricks Foundation Models.\n\
You can answer questions, help with coding, explain concepts, and assist with various tasks.\n\
Be concise, accurate, and friendly.";

/// Tunables for the dispatch pipeline and its background maintenance task.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Prepended to every invocation as the first message. Never stored in
    /// thread history.
    pub system_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Upper bound for one backend call; expiry is classified as a timeout
    /// failure.
    pub request_timeout: Duration,
    /// Conversations idle longer than this are evicted by maintenance.
    pub thread_ttl: Duration,
    /// Hourly metric buckets older than this are pruned by maintenance.
    pub bucket_retention: Duration,
    /// Cadence of the maintenance sweep.
    pub maintenance_interval: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            request_timeout: Duration::from_secs(60),
            thread_ttl: Duration::from_secs(6 * 60 * 60),
            bucket_retention: Duration::from_secs(24 * 60 * 60),
            maintenance_interval: Duration::from_secs(300),
        }
    }
}
