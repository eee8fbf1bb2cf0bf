use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use tokio::sync::{Mutex, MutexGuard};
use trellis_core::ConversationThread;

/// One conversation's slot in the store: the thread behind its own lock,
/// plus an activity stamp readable without taking that lock.
///
/// Lock ordering rules (to prevent deadlocks):
/// 1. The store's structural lock is never held while waiting on a slot
///    lock; eviction only probes with `try_lock`.
/// 2. A slot lock may be held across the backend call. The atomic stamp
///    exists so the janitor can judge idleness without waiting on it.
pub struct ThreadSlot {
    last_activity_ms: AtomicI64,
    thread: Mutex<ConversationThread>,
}

impl ThreadSlot {
    pub(crate) fn new(thread: ConversationThread) -> Self {
        Self {
            last_activity_ms: AtomicI64::new(Utc::now().timestamp_millis()),
            thread: Mutex::new(thread),
        }
    }

    /// Serializes all turn and alias access for this conversation. Held
    /// across the full append-invoke-append window by the dispatcher so
    /// turns within one thread stay totally ordered.
    pub async fn lock(&self) -> MutexGuard<'_, ConversationThread> {
        self.thread.lock().await
    }

    /// Stamps the slot as just used. Call after any mutation.
    pub fn touch(&self) {
        self.last_activity_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub fn last_activity_ms(&self) -> i64 {
        self.last_activity_ms.load(Ordering::Relaxed)
    }

    /// True when the slot is idle past `cutoff_ms` and nothing holds its
    /// lock right now. Never waits.
    pub(crate) fn evictable(&self, cutoff_ms: i64) -> bool {
        if self.last_activity_ms() >= cutoff_ms {
            return false;
        }
        self.thread.try_lock().is_ok()
    }
}
