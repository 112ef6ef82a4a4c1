//! Authentication system
//!
//! Handles admin credential validation and session management.

pub mod credentials;
pub mod session;
pub mod validator;

pub use credentials::AdminCredentials;
pub use validator::Authenticator;
