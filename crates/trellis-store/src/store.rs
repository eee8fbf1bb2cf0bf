use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use trellis_core::{ConversationThread, Turn};

use crate::slot::ThreadSlot;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Alias assigned to a thread on first sight.
    pub default_alias: String,
    /// Capacity policy: keep at most this many turns, oldest dropped first.
    pub max_turns: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_alias: "maverick".to_string(),
            max_turns: 40,
        }
    }
}

/// Conversation threads keyed by their platform thread identifier.
///
/// Structural changes (create, evict) take the outer lock; everything about
/// one conversation's content happens under that conversation's slot lock.
/// Operations against different keys run fully in parallel; two against the
/// same key queue on its slot lock, which is what keeps turns in one
/// conversation totally ordered.
pub struct SessionStore {
    config: StoreConfig,
    threads: RwLock<HashMap<String, Arc<ThreadSlot>>>,
}

impl SessionStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            threads: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the slot for `thread_key`, creating an empty thread with the
    /// default alias on first sight. Idempotent.
    pub async fn get_or_create(&self, thread_key: &str) -> Arc<ThreadSlot> {
        {
            let threads = self.threads.read().await;
            if let Some(slot) = threads.get(thread_key) {
                return slot.clone();
            }
        }

        let mut threads = self.threads.write().await;
        // Another task may have created it between the two locks.
        if let Some(slot) = threads.get(thread_key) {
            return slot.clone();
        }

        log::debug!("[{thread_key}] creating thread");
        let thread = ConversationThread::new(thread_key, &self.config.default_alias);
        let slot = Arc::new(ThreadSlot::new(thread));
        threads.insert(thread_key.to_string(), slot.clone());
        slot
    }

    pub async fn get(&self, thread_key: &str) -> Option<Arc<ThreadSlot>> {
        self.threads.read().await.get(thread_key).cloned()
    }

    /// One-shot append that locks the slot internally and enforces the
    /// capacity policy. Callers that need the whole append-invoke-append
    /// window serialized hold the slot lock themselves instead.
    pub async fn append_turn(&self, thread_key: &str, turn: Turn) {
        let slot = self.get_or_create(thread_key).await;
        let mut thread = slot.lock().await;
        thread.push_turn(turn);
        let dropped = thread.trim_oldest(self.config.max_turns);
        if dropped > 0 {
            log::debug!("[{thread_key}] trimmed {dropped} old turns");
        }
        slot.touch();
    }

    /// Updates the thread's active alias. Takes effect on the next
    /// invocation only.
    pub async fn switch_model(&self, thread_key: &str, alias: &str) {
        let slot = self.get_or_create(thread_key).await;
        let mut thread = slot.lock().await;
        thread.set_alias(alias);
        slot.touch();
    }

    /// Resets a known thread to zero turns, key and alias preserved.
    /// Returns false for a key never seen.
    pub async fn clear(&self, thread_key: &str) -> bool {
        let slot = self.get(thread_key).await;
        match slot {
            Some(slot) => {
                let mut thread = slot.lock().await;
                thread.clear_turns();
                slot.touch();
                log::info!("[{thread_key}] conversation cleared");
                true
            }
            None => false,
        }
    }

    pub async fn history(&self, thread_key: &str) -> Option<Vec<Turn>> {
        let slot = self.get(thread_key).await?;
        let thread = slot.lock().await;
        Some(thread.turns.clone())
    }

    pub async fn model_alias(&self, thread_key: &str) -> Option<String> {
        let slot = self.get(thread_key).await?;
        let thread = slot.lock().await;
        Some(thread.model_alias.clone())
    }

    pub async fn active_count(&self) -> usize {
        self.threads.read().await.len()
    }

    /// Removes threads idle past `ttl`. A slot whose lock is held (a
    /// dispatch in flight) is skipped and picked up by a later sweep; the
    /// probe never waits, so the janitor cannot stall behind a backend
    /// call.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let cutoff_ms = Utc::now().timestamp_millis().saturating_sub(ttl_ms);

        let mut threads = self.threads.write().await;
        let before = threads.len();
        threads.retain(|key, slot| {
            let evict = slot.evictable(cutoff_ms);
            if evict {
                log::debug!("[{key}] evicting idle thread");
            }
            !evict
        });
        before - threads.len()
    }
}
