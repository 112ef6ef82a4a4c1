//! Configuration management for RAX File Manager
//!
//! Configuration is loaded once at startup and shared read-only afterwards.
//! Sources are layered: built-in defaults, then an optional `config.toml`,
//! then `RAX_FM_*` environment variables (e.g. `RAX_FM_ADMIN_PASSWORD`).

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SECRET_KEY: &str = "your-secret-key-change-this";
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "password123";

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
const DEFAULT_PORT: i64 = 8080;
const DEFAULT_STORAGE_ROOT: &str = "uploads";
const DEFAULT_MAX_UPLOAD_MB: i64 = 100;
const DEFAULT_SESSION_TTL_SECS: i64 = 24 * 60 * 60;
const MIN_SECRET_KEY_LENGTH: usize = 16;

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    // ═══ NETWORK ═══
    /// IP address the HTTP listener binds to
    pub bind_address: String,

    /// HTTP listening port
    pub port: u16,

    // ═══ STORAGE ═══
    /// Directory every relative path is resolved against
    pub storage_root: String,

    /// Maximum accepted upload size in MB
    pub max_upload_mb: u64,

    // ═══ AUTHENTICATION ═══
    pub admin_username: String,
    pub admin_password: String,

    /// Secret the session cookie signing key is derived from
    pub secret_key: String,

    /// Lifetime of a login session in seconds
    pub session_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT as u16,
            storage_root: DEFAULT_STORAGE_ROOT.to_string(),
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB as u64,
            admin_username: DEFAULT_ADMIN_USERNAME.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            secret_key: DEFAULT_SECRET_KEY.to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS as u64,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `./config.toml` (optional) with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from the given file stem (optional) with environment overrides
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("port", DEFAULT_PORT)?
            .set_default("storage_root", DEFAULT_STORAGE_ROOT)?
            .set_default("max_upload_mb", DEFAULT_MAX_UPLOAD_MB)?
            .set_default("admin_username", DEFAULT_ADMIN_USERNAME)?
            .set_default("admin_password", DEFAULT_ADMIN_PASSWORD)?
            .set_default("secret_key", DEFAULT_SECRET_KEY)?
            .set_default("session_ttl_secs", DEFAULT_SESSION_TTL_SECS)?
            .add_source(File::with_name(config_path).required(false))
            // Values stay strings; typed fields are parsed on deserialization
            .add_source(Environment::with_prefix("RAX_FM"))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.port == 0 {
            return Err(config::ConfigError::Message("port cannot be 0".into()));
        }

        if self.storage_root.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "storage_root cannot be empty".into(),
            ));
        }

        if self.max_upload_mb == 0 {
            return Err(config::ConfigError::Message(
                "max_upload_mb must be greater than 0".into(),
            ));
        }

        if self.admin_username.is_empty() || self.admin_password.is_empty() {
            return Err(config::ConfigError::Message(
                "admin credentials cannot be empty".into(),
            ));
        }

        if self.secret_key.len() < MIN_SECRET_KEY_LENGTH {
            return Err(config::ConfigError::Message(format!(
                "secret_key must be at least {MIN_SECRET_KEY_LENGTH} bytes"
            )));
        }

        if self.session_ttl_secs == 0 {
            return Err(config::ConfigError::Message(
                "session_ttl_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Get bind address and port as a socket address string
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Get storage root as PathBuf
    pub fn storage_root_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }

    /// Get maximum upload size in bytes
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb * 1024 * 1024
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// True when the shipped secret key or admin password has not been changed
    pub fn uses_default_secrets(&self) -> bool {
        self.secret_key == DEFAULT_SECRET_KEY || self.admin_password == DEFAULT_ADMIN_PASSWORD
    }
}
