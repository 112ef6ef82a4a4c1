//! Router construction
//!
//! Maps the HTTP surface onto the handlers.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};

use crate::middleware::logging::log_requests;
use crate::protocol::handlers;
use crate::protocol::state::AppState;

/// Headroom for multipart framing on top of the file size limit
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let upload_body_limit =
        usize::try_from(state.config.max_upload_bytes() + MULTIPART_OVERHEAD_BYTES)
            .unwrap_or(usize::MAX);

    Router::new()
        .route("/", get(handlers::browse_root))
        .route(
            "/login",
            get(handlers::login_page).post(handlers::login_submit),
        )
        .route("/logout", get(handlers::logout))
        .route("/create_folder", post(handlers::create_folder))
        .route(
            "/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .route("/download/{*file_path}", get(handlers::download))
        .route("/view/{*file_path}", get(handlers::view))
        .route("/delete/{*file_path}", post(handlers::delete))
        .route("/rename/{*item_path}", post(handlers::rename))
        .route("/api/files", get(handlers::api_files))
        .route("/{*folder_path}", get(handlers::browse_folder))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}
