use crate::{config::SessionConfig, session::state::SessionState};
use moka::{notification::RemovalCause, policy::EvictionPolicy, sync::Cache};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};
use uuid::Uuid;

/// One session's state. The async mutex makes each interaction of a session
/// run to completion before the next one starts.
pub type SessionHandle = Arc<tokio::sync::Mutex<SessionState>>;

/// A session looked up (or created) for one request.
pub struct ResolvedSession {
    pub id: Uuid,
    pub state: SessionHandle,
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStoreStats {
    pub active_sessions: usize,
    pub max_sessions: usize,
}

/// Owns every live session, keyed by the id stored in the session cookie.
///
/// Sessions idle for longer than the TTL expire, and once `max_sessions` is
/// reached the least recently used one is evicted. Both happen inside the
/// cache as it is used; nothing runs in the background.
pub struct SessionStore {
    sessions: Cache<Uuid, SessionHandle>,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self::with_limits(config.idle_ttl(), config.max_sessions)
    }

    pub fn with_limits(idle_ttl: Duration, max_sessions: usize) -> Self {
        let sessions = Cache::builder()
            .max_capacity(max_sessions as u64)
            .time_to_idle(idle_ttl)
            .eviction_policy(EvictionPolicy::lru())
            .eviction_listener(|id: Arc<Uuid>, _, cause| match cause {
                RemovalCause::Expired => debug!("Session {} expired", id),
                RemovalCause::Size => {
                    info!("Session limit reached, evicted least recently used session {}", id)
                }
                _ => {}
            })
            .build();

        Self {
            sessions,
            max_sessions,
        }
    }

    /// Returns the session for `id`, or a fresh one when the id is missing,
    /// unknown or expired.
    pub fn resolve(&self, id: Option<Uuid>) -> ResolvedSession {
        if let Some(id) = id {
            if let Some(state) = self.sessions.get(&id) {
                return ResolvedSession {
                    id,
                    state,
                    created: false,
                };
            }
        }

        let id = Uuid::new_v4();
        let state: SessionHandle = Arc::new(tokio::sync::Mutex::new(SessionState::new()));
        self.sessions.insert(id, state.clone());
        debug!("Session {} started", id);

        ResolvedSession {
            id,
            state,
            created: true,
        }
    }

    /// Looks up a live session. Counts as activity for the idle timer.
    pub fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions.get(id)
    }

    /// Discards a session. Returns whether it existed.
    pub fn end(&self, id: &Uuid) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            debug!("Session {} ended", id);
        }
        removed
    }

    /// Number of live sessions, after pending expirations and evictions
    /// have been applied.
    pub fn len(&self) -> usize {
        self.sessions.run_pending_tasks();
        self.sessions.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> SessionStoreStats {
        SessionStoreStats {
            active_sessions: self.len(),
            max_sessions: self.max_sessions,
        }
    }
}
