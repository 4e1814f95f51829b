//! In-memory session store using DashMap
//!
//! Every browser session owns its last batch, pasted-code result and
//! analysis history. Nothing is persisted.

use csjava_core::{AnalysisHistory, ConversionBatch, ConversionResult};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

/// Idle sessions are purged after this long unless configured otherwise
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

/// How often the cleanup task scans for idle sessions
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Per-session state
#[derive(Debug)]
pub struct SessionState {
    pub batch: Option<ConversionBatch>,
    pub instant: Option<ConversionResult>,
    pub history: AnalysisHistory,
    touched_at: Instant,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            batch: None,
            instant: None,
            history: AnalysisHistory::default(),
            touched_at: Instant::now(),
        }
    }
}

impl SessionState {
    /// Drop every result while keeping the session alive
    pub fn clear(&mut self) {
        self.batch = None;
        self.instant = None;
        self.history.clear();
    }

    fn is_idle(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.touched_at) > ttl
    }
}

/// Session store keyed by session id
pub struct SessionStore {
    sessions: Arc<DashMap<String, SessionState>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Create an empty session and return its id
    pub fn create(&self) -> String {
        let id = Uuid::new_v4().to_string();
        self.sessions.insert(id.clone(), SessionState::default());
        debug!("Created session {}", id);
        id
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// Read a session, marking it as used
    pub fn read<R>(&self, id: &str, f: impl FnOnce(&SessionState) -> R) -> Option<R> {
        self.sessions.get_mut(id).map(|mut state| {
            state.touched_at = Instant::now();
            f(&state)
        })
    }

    /// Modify a session, marking it as used
    pub fn update<R>(&self, id: &str, f: impl FnOnce(&mut SessionState) -> R) -> Option<R> {
        self.sessions.get_mut(id).map(|mut state| {
            state.touched_at = Instant::now();
            f(&mut state)
        })
    }

    /// Clear a session's results; `false` if it does not exist
    pub fn clear(&self, id: &str) -> bool {
        self.update(id, SessionState::clear).is_some()
    }

    /// Drop a session entirely
    pub fn remove(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Remove sessions idle for longer than the TTL
    pub fn purge_expired(&self) -> usize {
        purge(&self.sessions, self.ttl)
    }

    pub fn start_cleanup_task(&self) {
        let sessions = self.sessions.clone();
        let ttl = self.ttl;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                let removed = purge(&sessions, ttl);
                if removed > 0 {
                    info!("Purged {} idle session(s)", removed);
                }
            }
        });
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

fn purge(sessions: &DashMap<String, SessionState>, ttl: Duration) -> usize {
    let now = Instant::now();
    let before = sessions.len();
    sessions.retain(|_, state| !state.is_idle(now, ttl));
    before.saturating_sub(sessions.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use csjava_core::types::{AnalysisRecord, AnalysisResult};

    fn record() -> AnalysisRecord {
        AnalysisRecord::new(
            AnalysisResult::from_payload(&AnalysisResult::fallback_payload()),
            "CodeAnalysis.cs",
            "class A {}",
        )
    }

    #[tokio::test]
    async fn test_create_update_read() {
        let store = SessionStore::default();
        let id = store.create();
        assert!(store.contains(&id));

        store.update(&id, |state| {
            state.history.push(record());
        });
        assert_eq!(store.read(&id, |state| state.history.len()), Some(1));
        assert_eq!(store.read("missing", |state| state.history.len()), None);
    }

    #[tokio::test]
    async fn test_clear_keeps_session() {
        let store = SessionStore::default();
        let id = store.create();
        store.update(&id, |state| {
            state.history.push(record());
        });

        assert!(store.clear(&id));
        assert!(store.contains(&id));
        assert_eq!(store.read(&id, |state| state.history.is_empty()), Some(true));
        assert!(!store.clear("missing"));

        assert!(store.remove(&id));
        assert!(!store.contains(&id));
    }

    #[tokio::test]
    async fn test_purge_idle_sessions() {
        let store = SessionStore::new(Duration::from_millis(10));
        let old = store.create();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let fresh = store.create();

        assert_eq!(store.purge_expired(), 1);
        assert!(!store.contains(&old));
        assert!(store.contains(&fresh));
        assert_eq!(store.len(), 1);
    }
}
