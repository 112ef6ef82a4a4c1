//! Shared application state
//!
//! Everything a route handler needs, built once from the configuration.

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use log::{info, warn};
use sha2::{Digest, Sha512};
use std::sync::Arc;

use crate::auth::{AdminCredentials, Authenticator};
use crate::config::ServerConfig;
use crate::error::FileManagerError;
use crate::storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub storage: Arc<Storage>,
    pub auth: Arc<Authenticator>,
    cookie_key: Key,
}

impl AppState {
    /// Opens the storage root and sets up authentication
    pub fn new(config: ServerConfig) -> Result<Self, FileManagerError> {
        let storage = Storage::open(config.storage_root_path(), config.max_upload_bytes())?;
        info!("Storage root directory: {}", storage.root().display());

        if config.uses_default_secrets() {
            warn!(
                "Default secret key or admin password in use; \
                 set RAX_FM_SECRET_KEY and RAX_FM_ADMIN_PASSWORD"
            );
        }

        let auth = Authenticator::new(AdminCredentials::from_config(&config), config.session_ttl());
        info!("Admin user: {}", auth.admin_username());

        Ok(Self {
            cookie_key: derive_cookie_key(&config.secret_key),
            config: Arc::new(config),
            storage: Arc::new(storage),
            auth: Arc::new(auth),
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Derives the 64-byte cookie signing key from the configured secret
pub fn derive_cookie_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}
