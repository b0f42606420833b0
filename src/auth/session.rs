//! In-memory session tracking for form login.
//!
//! Sessions only exist in form mode. The store is the one piece of mutable
//! shared state in the admission path, guarded by a mutex: a reader can
//! never observe a session with only half its fields set. Expired entries
//! are evicted opportunistically whenever a session is looked up, so the
//! map cannot grow without bound and no background sweeper is needed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

/// Fixed session lifetime. The original surface never documents a TTL, so a
/// conservative one hour is used.
pub const SESSION_TTL: Duration = Duration::from_secs(3600);

/// Cookie carrying the session id in form mode.
pub const SESSION_COOKIE: &str = "servergo_session";

/// An authenticated browser session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque random identifier (128-bit, hex-encoded).
    pub id: String,
    /// Username the session was created for.
    pub username: String,
    /// When the session was created.
    pub created_at: SystemTime,
    /// When the session stops being honored.
    pub expires_at: SystemTime,
}

impl Session {
    fn is_expired_at(&self, now: SystemTime) -> bool {
        now >= self.expires_at
    }
}

/// Thread-safe in-memory session store.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_ttl(SESSION_TTL)
    }

    /// Store with a custom TTL; tests use short lifetimes.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Configured session lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create a session for `username` and return it. Multiple sessions may
    /// coexist, one per authenticated browser.
    pub fn create(&self, username: &str) -> Session {
        let now = SystemTime::now();
        let session = Session {
            id: generate_session_id(),
            username: username.to_string(),
            created_at: now,
            expires_at: now + self.ttl,
        };
        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(session.id.clone(), session.clone());
        session
    }

    /// Look up a session by id, returning it only while unexpired.
    ///
    /// Expired entries anywhere in the map are dropped under the same lock
    /// acquisition, so an expired session is indistinguishable from a
    /// missing one.
    pub fn validate(&self, id: &str) -> Option<Session> {
        let now = SystemTime::now();
        let mut sessions = self.sessions.lock().unwrap();
        sessions.retain(|_, session| !session.is_expired_at(now));
        sessions.get(id).cloned()
    }

    /// Remove a session (logout). Removing an unknown id is a no-op.
    pub fn invalidate(&self, id: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.remove(id);
    }

    /// Number of live entries, expired or not. Test hook.
    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Random 128-bit session id, hex-encoded.
fn generate_session_id() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

// =============================================================================
// Tests
// =============================================================================
