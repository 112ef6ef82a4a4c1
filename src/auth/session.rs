//! Session store
//!
//! Maps opaque session tokens to the authenticated identity, with expiry.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A live login session
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub identity: String,
    pub expires_at: Instant,
}

/// Token -> identity map with a fixed time-to-live
#[derive(Debug)]
pub struct SessionStore {
    sessions: HashMap<String, SessionEntry>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl,
        }
    }

    /// Creates a session for `identity` and returns its token
    pub fn create(&mut self, identity: &str) -> String {
        self.prune_expired();

        let token = uuid::Uuid::new_v4().simple().to_string();
        self.sessions.insert(
            token.clone(),
            SessionEntry {
                identity: identity.to_string(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        token
    }

    /// Identity behind a live token. Expired tokens are dropped.
    pub fn identity(&mut self, token: &str) -> Option<String> {
        let now = Instant::now();
        match self.sessions.get(token) {
            Some(entry) if entry.expires_at > now => Some(entry.identity.clone()),
            Some(_) => {
                self.sessions.remove(token);
                None
            }
            None => None,
        }
    }

    /// Removes a session, reporting whether it existed
    pub fn remove(&mut self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn prune_expired(&mut self) {
        let now = Instant::now();
        self.sessions.retain(|_, entry| entry.expires_at > now);
    }
}
