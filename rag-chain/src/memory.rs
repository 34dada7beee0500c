//! Per-session conversation memory.
//!
//! Each session id owns its own history behind its own async mutex. A chat
//! request holds that mutex for its whole run, so turns of one session are
//! serialized while different sessions proceed in parallel and never see
//! each other's history. Sessions idle for longer than a threshold are
//! dropped by [`ConversationMemory::evict_idle`].

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// One question/answer exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

/// History of one session.
pub type SessionHistory = Arc<Mutex<Vec<Turn>>>;

#[derive(Debug, Default)]
struct SessionEntry {
    history: SessionHistory,
    /// Milliseconds since `ConversationMemory::epoch` of the last access.
    last_used_ms: AtomicU64,
}

#[derive(Debug)]
pub struct ConversationMemory {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    max_turns: usize,
    epoch: Instant,
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ConversationMemory {
    /// `max_turns == 0` keeps every turn.
    pub fn new(max_turns: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_turns,
            epoch: Instant::now(),
        }
    }

    fn millis_at(&self, at: Instant) -> u64 {
        u64::try_from(at.saturating_duration_since(self.epoch).as_millis()).unwrap_or(u64::MAX)
    }

    /// Returns the history handle of `session_id`, creating it on first use.
    pub async fn session(&self, session_id: &str) -> SessionHistory {
        let now = self.millis_at(Instant::now());
        if let Some(e) = self.sessions.read().await.get(session_id) {
            e.last_used_ms.store(now, Ordering::Relaxed);
            return Arc::clone(&e.history);
        }
        let mut w = self.sessions.write().await;
        let e = w.entry(session_id.to_string()).or_default();
        e.last_used_ms.store(now, Ordering::Relaxed);
        Arc::clone(&e.history)
    }

    /// Drops the history of `session_id`. Returns whether it existed.
    pub async fn forget(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    /// Number of sessions with in-process history.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions not used for longer than `max_idle`. Returns how many went.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        self.evict_idle_at(Instant::now(), max_idle).await
    }

    /// Same as [`ConversationMemory::evict_idle`] with an explicit clock.
    ///
    /// A session whose lock is held by a running request is kept.
    pub async fn evict_idle_at(&self, now: Instant, max_idle: Duration) -> usize {
        let now = self.millis_at(now);
        let max_idle = u64::try_from(max_idle.as_millis()).unwrap_or(u64::MAX);

        let mut w = self.sessions.write().await;
        let before = w.len();
        w.retain(|_, e| {
            let idle = now.saturating_sub(e.last_used_ms.load(Ordering::Relaxed));
            idle <= max_idle || e.history.try_lock().is_err()
        });
        let evicted = before - w.len();
        if evicted > 0 {
            debug!(evicted, remaining = w.len(), "idle sessions evicted");
        }
        evicted
    }

    /// Appends a turn, dropping the oldest ones beyond the configured cap.
    pub fn record(&self, history: &mut Vec<Turn>, turn: Turn) {
        history.push(turn);
        if self.max_turns > 0 && history.len() > self.max_turns {
            let excess = history.len() - self.max_turns;
            history.drain(..excess);
        }
    }
}
