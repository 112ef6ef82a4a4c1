//! Authentication validator
//!
//! Checks login attempts against the admin credentials and guards the
//! mutating routes with a session check.

use log::{info, warn};
use std::time::Duration;
use tokio::sync::Mutex;

use super::credentials::AdminCredentials;
use super::session::SessionStore;
use crate::error::AuthError;

const MAX_INPUT_LENGTH: usize = 256;

/// Performs basic input sanitation to check for malicious or malformed usernames/passwords.
fn is_valid_input(input: &str) -> bool {
    !input.is_empty() && input.len() <= MAX_INPUT_LENGTH && !input.contains(['\r', '\n', '\0'])
}

/// Single-admin authenticator owning the session store
#[derive(Debug)]
pub struct Authenticator {
    credentials: AdminCredentials,
    sessions: Mutex<SessionStore>,
}

impl Authenticator {
    pub fn new(credentials: AdminCredentials, session_ttl: Duration) -> Self {
        Self {
            credentials,
            sessions: Mutex::new(SessionStore::new(session_ttl)),
        }
    }

    /// Validates a login form and opens a session named after the user.
    ///
    /// Returns the new session token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        if !is_valid_input(username)
            || !is_valid_input(password)
            || !self.credentials.matches(username, password)
        {
            warn!("Failed login attempt for user {:?}", username);
            return Err(AuthError::AuthFailure(username.to_string()));
        }

        let mut sessions = self.sessions.lock().await;
        let token = sessions.create(username);
        info!("User {} logged in ({} active sessions)", username, sessions.len());
        Ok(token)
    }

    /// Invalidates the session behind `token`
    pub async fn logout(&self, token: &str) {
        let mut sessions = self.sessions.lock().await;
        if let Some(identity) = sessions.identity(token) {
            info!("User {} logged out", identity);
        }
        sessions.remove(token);
    }

    /// Returns the identity behind a valid session token
    pub async fn require_session(&self, token: Option<&str>) -> Result<String, AuthError> {
        let token = token.ok_or(AuthError::Unauthenticated)?;
        self.sessions
            .lock()
            .await
            .identity(token)
            .ok_or(AuthError::Unauthenticated)
    }

    pub fn admin_username(&self) -> &str {
        self.credentials.username()
    }
}
