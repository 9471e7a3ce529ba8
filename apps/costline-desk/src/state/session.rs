//! # Session Store
//!
//! Per-session cart and pricing settings, keyed by session id.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Session Lifecycle                                    │
//! │                                                                         │
//! │  first access ──► session(id) ──► new Session (cart Empty,             │
//! │                        │           settings from config defaults)      │
//! │                        ▼                                                │
//! │  every command ──► lock own Session ──► run cycle ──► mutate ──► unlock│
//! │                        │                                                │
//! │                        ▼                                                │
//! │  end_session(id) ──► Session dropped (cart gone)                       │
//! │                                                                         │
//! │  Sessions never share state. The map lock is held only long enough     │
//! │  to find or create an entry; each session has its own Mutex.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use costline_core::CartStore;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::settings::SessionSettings;

// =============================================================================
// Session Id
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// Session
// =============================================================================

/// Everything one user's session remembers between commands.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    pub cart: CartStore,
    pub settings: SessionSettings,

    /// Product names of the last search, in display order. Result numbers
    /// the user types (1-based) index into this list.
    last_results: Vec<String>,

    started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId, settings: SessionSettings) -> Self {
        Session {
            id,
            cart: CartStore::new(),
            settings,
            last_results: Vec::new(),
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn last_results(&self) -> &[String] {
        &self.last_results
    }

    pub fn remember_results(&mut self, names: Vec<String>) {
        self.last_results = names;
    }

    /// Name of the product shown as result `number` (1-based).
    pub fn result_name(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|idx| self.last_results.get(idx))
            .map(String::as_str)
    }
}

// =============================================================================
// Session Store
// =============================================================================

pub struct SessionStore {
    sessions: Mutex<HashMap<SessionId, Arc<Mutex<Session>>>>,
    defaults: SessionSettings,
}

impl SessionStore {
    /// `defaults` seeds the settings of every new session.
    pub fn new(defaults: SessionSettings) -> Self {
        SessionStore {
            sessions: Mutex::new(HashMap::new()),
            defaults,
        }
    }

    /// Returns the session, creating an empty one on first access.
    pub async fn session(&self, id: SessionId) -> Arc<Mutex<Session>> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(id)
            .or_insert_with(|| {
                debug!(session = %id, "Session started");
                Arc::new(Mutex::new(Session::new(id, self.defaults.clone())))
            })
            .clone()
    }

    /// Drops a session and its cart. Returns false if it did not exist.
    pub async fn end_session(&self, id: SessionId) -> bool {
        let removed = self.sessions.lock().await.remove(&id).is_some();
        if removed {
            debug!(session = %id, "Session ended");
        }
        removed
    }

    pub async fn contains(&self, id: SessionId) -> bool {
        self.sessions.lock().await.contains_key(&id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn defaults(&self) -> &SessionSettings {
        &self.defaults
    }
}
