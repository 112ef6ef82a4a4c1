//! HTTP protocol layer
//!
//! Route handlers, request extractors, flash messages and views.

pub mod extractors;
pub mod flash;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod urls;
pub mod views;

pub use routes::build_router;
pub use state::AppState;
