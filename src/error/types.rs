//! Error types
//!
//! Defines domain-specific error types for each module of the file manager.

use std::fmt;
use std::io;

/// Storage module errors
#[derive(Debug)]
pub enum StorageError {
    NotFound(String),
    AlreadyExists(String),
    NotEmpty(String),
    InvalidName(String),
    PathEscape(String),
    PayloadTooLarge(u64),
    IoError(io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotFound(p) => write!(f, "Not found: {}", p),
            StorageError::AlreadyExists(p) => write!(f, "Already exists: {}", p),
            StorageError::NotEmpty(p) => write!(f, "Folder not empty: {}", p),
            StorageError::InvalidName(n) => write!(f, "Invalid name: {:?}", n),
            StorageError::PathEscape(p) => write!(f, "Path escapes storage root: {}", p),
            StorageError::PayloadTooLarge(max) => {
                write!(f, "Upload exceeds maximum size of {} bytes", max)
            }
            StorageError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        StorageError::IoError(error)
    }
}

/// Authentication module errors
#[derive(Debug)]
pub enum AuthError {
    AuthFailure(String),
    Unauthenticated,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::AuthFailure(u) => write!(f, "Invalid credentials for user: {}", u),
            AuthError::Unauthenticated => write!(f, "No valid session"),
        }
    }
}

impl std::error::Error for AuthError {}

/// General file manager error that encompasses all error types
#[derive(Debug)]
pub enum FileManagerError {
    Auth(AuthError),
    Storage(StorageError),
    Config(config::ConfigError),
    IoError(io::Error),
}

impl fmt::Display for FileManagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileManagerError::Auth(e) => write!(f, "Authentication error: {}", e),
            FileManagerError::Storage(e) => write!(f, "Storage error: {}", e),
            FileManagerError::Config(e) => write!(f, "Configuration error: {}", e),
            FileManagerError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for FileManagerError {}

impl From<AuthError> for FileManagerError {
    fn from(error: AuthError) -> Self {
        FileManagerError::Auth(error)
    }
}

impl From<StorageError> for FileManagerError {
    fn from(error: StorageError) -> Self {
        FileManagerError::Storage(error)
    }
}

impl From<config::ConfigError> for FileManagerError {
    fn from(error: config::ConfigError) -> Self {
        FileManagerError::Config(error)
    }
}

impl From<io::Error> for FileManagerError {
    fn from(error: io::Error) -> Self {
        FileManagerError::IoError(error)
    }
}
