//! Error handlers
//!
//! Turns errors into the user-visible messages and status codes used at the
//! route boundary.

use axum::http::StatusCode;
use log::{error, warn};

use crate::error::types::{AuthError, FileManagerError, StorageError};
use crate::protocol::flash::Flash;

/// Log a file manager error at a severity matching its cause
pub fn handle_error(err: &FileManagerError) {
    match err {
        FileManagerError::Storage(StorageError::IoError(_))
        | FileManagerError::IoError(_)
        | FileManagerError::Config(_) => error!("File manager error: {}", err),
        _ => warn!("File manager error: {}", err),
    }
}

/// User-facing text for a storage failure
pub fn storage_error_message(err: &StorageError) -> String {
    match err {
        StorageError::NotFound(p) => format!("\"{}\" not found", p),
        StorageError::AlreadyExists(p) => format!("\"{}\" already exists", p),
        StorageError::NotEmpty(p) => format!("Folder \"{}\" is not empty", p),
        StorageError::InvalidName(_) => "Invalid name".to_string(),
        StorageError::PathEscape(_) => "Invalid path".to_string(),
        StorageError::PayloadTooLarge(max) => {
            format!("File too large (maximum is {} MB)", max / (1024 * 1024))
        }
        StorageError::IoError(_) => "The operation could not be completed".to_string(),
    }
}

/// Logs the failure and converts it to an error flash
pub fn storage_error_flash(err: StorageError) -> Flash {
    let message = storage_error_message(&err);
    handle_error(&FileManagerError::Storage(err));
    Flash::error(message)
}

/// Convert error to HTTP status code for non-HTML responses
pub fn error_to_status_code(err: &FileManagerError) -> StatusCode {
    match err {
        FileManagerError::Auth(AuthError::Unauthenticated) => StatusCode::UNAUTHORIZED,
        FileManagerError::Auth(AuthError::AuthFailure(_)) => StatusCode::UNAUTHORIZED,
        FileManagerError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
        FileManagerError::Storage(StorageError::AlreadyExists(_)) => StatusCode::CONFLICT,
        FileManagerError::Storage(StorageError::NotEmpty(_)) => StatusCode::CONFLICT,
        FileManagerError::Storage(StorageError::InvalidName(_)) => StatusCode::BAD_REQUEST,
        FileManagerError::Storage(StorageError::PathEscape(_)) => StatusCode::BAD_REQUEST,
        FileManagerError::Storage(StorageError::PayloadTooLarge(_)) => {
            StatusCode::PAYLOAD_TOO_LARGE
        }
        FileManagerError::Storage(StorageError::IoError(_))
        | FileManagerError::Config(_)
        | FileManagerError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
