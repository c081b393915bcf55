//! Short-lived store of pending logins
//!
//! Every `GET /` creates a pending login holding a random `state` (and the
//! PKCE verifier, when one was sent) under a random session id. The session
//! id travels in a cookie; the callback takes the entry out of the store, so
//! each entry can be used once. Entries older than the configured TTL are
//! treated as absent and are purged whenever a new login begins.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::auth::pkce;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "osdu_quickstart_session";

/// Login started by `GET /` and awaiting its callback.
#[derive(Debug, Clone)]
pub struct PendingLogin {
    /// Anti-forgery value sent as the `state` parameter
    pub state: String,
    /// PKCE verifier, when a challenge was sent
    pub pkce_verifier: Option<String>,
    created_at: Instant,
}

impl PendingLogin {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() >= ttl
    }
}

/// In-memory map of session id to [`PendingLogin`].
#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    pending: Mutex<HashMap<String, PendingLogin>>,
}

impl SessionStore {
    /// Creates an empty store whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Starts a login and returns `(session_id, pending_login)`.
    ///
    /// Expired entries are dropped first.
    pub async fn begin(&self, pkce_verifier: Option<String>) -> (String, PendingLogin) {
        let session_id = pkce::random_token(24);
        let login = PendingLogin {
            state: pkce::random_token(16),
            pkce_verifier,
            created_at: Instant::now(),
        };

        let mut pending = self.pending.lock().await;
        let ttl = self.ttl;
        pending.retain(|_, entry| !entry.is_expired(ttl));
        pending.insert(session_id.clone(), login.clone());
        tracing::debug!(pending = pending.len(), "Pending login created");

        (session_id, login)
    }

    /// Removes and returns the pending login for `session_id`.
    ///
    /// Returns `None` when the id is unknown, was already used, or expired.
    pub async fn take(&self, session_id: &str) -> Option<PendingLogin> {
        let login = self.pending.lock().await.remove(session_id)?;
        if login.is_expired(self.ttl) {
            tracing::debug!("Pending login expired");
            return None;
        }
        Some(login)
    }

    /// Number of entries currently held, expired or not.
    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.pending.lock().await.is_empty()
    }
}
