//! Route handlers module for the RAX file manager.
//!
//! Each handler parses its inputs, delegates to the storage adapter or the
//! catalog builder, and answers with a page, a file stream, or a redirect
//! carrying flash messages. Mutating handlers take an `AdminSession`, which
//! is extracted before any request body is read.

use axum::body::Body;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use axum_extra::extract::SignedCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use log::{info, warn};
use serde::Deserialize;
use std::io;
use tokio_util::io::{ReaderStream, StreamReader};

use crate::catalog::load_catalog;
use crate::error::handlers::{error_to_status_code, handle_error, storage_error_flash};
use crate::error::{FileManagerError, StorageError};
use crate::protocol::extractors::{AdminSession, SESSION_COOKIE, is_logged_in};
use crate::protocol::flash::{Flash, push_flash, take_flashes};
use crate::protocol::state::AppState;
use crate::protocol::urls::{folder_url, parent_folder_url};
use crate::protocol::views;
use crate::storage::{ItemKind, normalize_relative_path, sanitize_filename};

/// Redirects to `to`, queueing `flash` for the page rendered there
fn flash_redirect(jar: SignedCookieJar, flash: Flash, to: &str) -> Response {
    (push_flash(jar, flash), Redirect::to(to)).into_response()
}

// --------------------
// Authentication
// --------------------

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// GET /login
pub async fn login_page(jar: SignedCookieJar) -> Response {
    let (jar, flashes) = take_flashes(jar);
    (jar, Html(views::render_login(&flashes))).into_response()
}

/// POST /login
pub async fn login_submit(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.auth.login(&form.username, &form.password).await {
        Ok(token) => {
            let cookie = Cookie::build((SESSION_COOKIE, token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .build();
            flash_redirect(
                jar.add(cookie),
                Flash::success("Successfully logged in!"),
                "/",
            )
        }
        Err(e) => {
            handle_error(&FileManagerError::from(e));
            flash_redirect(jar, Flash::error("Invalid username or password"), "/login")
        }
    }
}

/// GET /logout
pub async fn logout(
    State(state): State<AppState>,
    session: AdminSession,
    jar: SignedCookieJar,
) -> Response {
    state.auth.logout(&session.token).await;
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    flash_redirect(jar, Flash::info("You have been logged out"), "/")
}

// --------------------
// Browsing
// --------------------

/// GET /
pub async fn browse_root(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
    render_folder(&state, jar, "").await
}

/// GET /{*folder_path}
pub async fn browse_folder(
    State(state): State<AppState>,
    Path(folder_path): Path<String>,
    jar: SignedCookieJar,
) -> Response {
    render_folder(&state, jar, &folder_path).await
}

async fn render_folder(state: &AppState, jar: SignedCookieJar, folder_path: &str) -> Response {
    let is_root = matches!(normalize_relative_path(folder_path).as_deref(), Ok(""));

    match load_catalog(&state.storage, folder_path).await {
        Ok(catalog) => {
            let logged_in = is_logged_in(state, &jar).await;
            let (jar, flashes) = take_flashes(jar);
            (jar, Html(views::render_index(&catalog, &flashes, logged_in))).into_response()
        }
        // The root itself is unreadable; redirecting to it would loop
        Err(e) if is_root => {
            let err = FileManagerError::from(e);
            handle_error(&err);
            (error_to_status_code(&err), "Storage root is unavailable").into_response()
        }
        Err(StorageError::NotFound(path)) => {
            warn!("Browse of missing folder /{}", path);
            flash_redirect(jar, Flash::error("Folder not found"), "/")
        }
        Err(e) => flash_redirect(jar, storage_error_flash(e), "/"),
    }
}

/// GET /api/files
pub async fn api_files(State(state): State<AppState>) -> Response {
    match load_catalog(&state.storage, "").await {
        Ok(catalog) => Json(catalog.files).into_response(),
        Err(e) => {
            let err = FileManagerError::from(e);
            handle_error(&err);
            (error_to_status_code(&err), err.to_string()).into_response()
        }
    }
}

// --------------------
// Downloads
// --------------------

/// GET /download/{*file_path}
pub async fn download(
    State(state): State<AppState>,
    Path(file_path): Path<String>,
    jar: SignedCookieJar,
) -> Response {
    serve_file(&state, jar, &file_path, "attachment").await
}

/// GET /view/{*file_path}
pub async fn view(
    State(state): State<AppState>,
    Path(file_path): Path<String>,
    jar: SignedCookieJar,
) -> Response {
    serve_file(&state, jar, &file_path, "inline").await
}

async fn serve_file(
    state: &AppState,
    jar: SignedCookieJar,
    file_path: &str,
    disposition: &str,
) -> Response {
    let opened = match state.storage.read_file(file_path).await {
        Ok(opened) => opened,
        Err(StorageError::NotFound(path)) => {
            warn!("Requested missing file /{}", path);
            return flash_redirect(
                jar,
                Flash::error("File not found"),
                &parent_folder_url(file_path),
            );
        }
        Err(e) => return flash_redirect(jar, storage_error_flash(e), "/"),
    };

    let mime = mime_guess::from_path(&opened.name).first_or_octet_stream();
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(mime.essence_str()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(opened.size));
    let last_modified = DateTime::<Utc>::from(opened.modified)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string();
    if let Ok(value) = HeaderValue::from_str(&last_modified) {
        headers.insert(header::LAST_MODIFIED, value);
    }
    if let Ok(value) = HeaderValue::from_str(&content_disposition(disposition, &opened.name)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    info!("Serving /{} ({}, {} bytes)", opened.relative_path, disposition, opened.size);

    let body = Body::from_stream(ReaderStream::new(opened.file));
    (StatusCode::OK, headers, body).into_response()
}

/// `Content-Disposition` value with an ASCII fallback and an RFC 5987 name
fn content_disposition(disposition: &str, name: &str) -> String {
    let ascii_name = sanitize_filename(name);
    let encoded = urlencoding::encode(name);
    if ascii_name.is_empty() {
        format!("{disposition}; filename*=UTF-8''{encoded}")
    } else {
        format!("{disposition}; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
    }
}

// --------------------
// Mutations
// --------------------

#[derive(Debug, Deserialize)]
pub struct CreateFolderForm {
    #[serde(default)]
    pub current_path: String,
    #[serde(default)]
    pub folder_name: String,
}

/// POST /create_folder
pub async fn create_folder(
    State(state): State<AppState>,
    session: AdminSession,
    jar: SignedCookieJar,
    Form(form): Form<CreateFolderForm>,
) -> Response {
    let back = folder_url(&form.current_path);

    if form.folder_name.trim().is_empty() {
        return flash_redirect(jar, Flash::error("Folder name is required"), &back);
    }

    let flash = match state
        .storage
        .create_folder(&form.current_path, &form.folder_name)
        .await
    {
        Ok(created) => {
            info!("{} created folder /{}", session.username, created);
            let name = created.rsplit('/').next().unwrap_or(&created);
            Flash::success(format!("Folder \"{}\" created successfully!", name))
        }
        Err(e) => storage_error_flash(e),
    };

    flash_redirect(jar, flash, &back)
}

/// Maps multipart read failures to I/O errors the storage layer understands
fn multipart_to_io(err: MultipartError) -> io::Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        io::Error::new(io::ErrorKind::FileTooLarge, err.body_text())
    } else {
        io::Error::other(err.body_text())
    }
}

/// POST /upload
///
/// Expects `current_path` before the `file` part; only the first file part
/// is stored.
pub async fn upload(
    State(state): State<AppState>,
    session: AdminSession,
    jar: SignedCookieJar,
    mut multipart: Multipart,
) -> Response {
    let mut current_path = String::new();
    let mut outcome: Option<Result<String, StorageError>> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed upload from {}: {}", session.username, e.body_text());
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    outcome = Some(Err(StorageError::PayloadTooLarge(
                        state.storage.max_upload_bytes(),
                    )));
                } else if outcome.is_none() {
                    outcome = Some(Err(StorageError::IoError(io::Error::other(e.body_text()))));
                }
                break;
            }
        };

        match field.name() {
            Some("current_path") => match field.text().await {
                Ok(text) => current_path = text,
                Err(e) => {
                    outcome = Some(Err(StorageError::IoError(multipart_to_io(e))));
                    break;
                }
            },
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                if file_name.is_empty() {
                    continue;
                }
                let reader = StreamReader::new(field.map_err(multipart_to_io));
                outcome = Some(
                    state
                        .storage
                        .save_upload(&current_path, &file_name, reader)
                        .await,
                );
                break;
            }
            _ => {}
        }
    }

    let flash = match outcome {
        None => Flash::error("No file selected"),
        Some(Ok(stored_name)) => {
            info!("{} uploaded {}", session.username, stored_name);
            Flash::success(format!("File \"{}\" uploaded successfully!", stored_name))
        }
        Some(Err(e)) => storage_error_flash(e),
    };

    flash_redirect(jar, flash, &folder_url(&current_path))
}

/// POST /delete/{*file_path}
pub async fn delete(
    State(state): State<AppState>,
    session: AdminSession,
    jar: SignedCookieJar,
    Path(file_path): Path<String>,
) -> Response {
    let name = file_path.trim_end_matches('/').rsplit('/').next().unwrap_or_default();

    let flash = match state.storage.delete_item(&file_path).await {
        Ok(ItemKind::Folder) => {
            info!("{} deleted folder {}", session.username, file_path);
            Flash::success(format!("Folder \"{}\" deleted successfully!", name))
        }
        Ok(ItemKind::File { .. }) => {
            info!("{} deleted file {}", session.username, file_path);
            Flash::success(format!("File \"{}\" deleted successfully!", name))
        }
        Err(StorageError::NotFound(_)) => Flash::error("File not found"),
        Err(e) => storage_error_flash(e),
    };

    flash_redirect(jar, flash, &parent_folder_url(&file_path))
}

#[derive(Debug, Deserialize)]
pub struct RenameForm {
    #[serde(default)]
    pub new_name: String,
}

/// POST /rename/{*item_path}
pub async fn rename(
    State(state): State<AppState>,
    session: AdminSession,
    jar: SignedCookieJar,
    Path(item_path): Path<String>,
    Form(form): Form<RenameForm>,
) -> Response {
    let back = parent_folder_url(&item_path);

    if form.new_name.trim().is_empty() {
        return flash_redirect(jar, Flash::error("New name is required"), &back);
    }

    let flash = match state.storage.rename_item(&item_path, &form.new_name).await {
        Ok(renamed) => {
            info!("{} renamed {} to {}", session.username, item_path, renamed);
            let old_name = item_path.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
            let new_name = renamed.rsplit('/').next().unwrap_or(&renamed);
            Flash::success(format!("Renamed \"{}\" to \"{}\"", old_name, new_name))
        }
        Err(e) => storage_error_flash(e),
    };

    flash_redirect(jar, flash, &back)
}
