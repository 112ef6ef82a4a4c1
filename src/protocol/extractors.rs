//! Request extractors
//!
//! `AdminSession` guards the mutating routes: handlers taking it only run
//! for a logged-in admin, everyone else is sent to the login page.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::SignedCookieJar;
use axum_extra::extract::cookie::Key;
use log::warn;

use crate::protocol::flash::{Flash, push_flash};
use crate::protocol::state::AppState;

pub const SESSION_COOKIE: &str = "rax_session";
pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to access this page.";

/// The authenticated admin behind the current request
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub username: String,
    pub token: String,
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = SignedCookieJar::<Key>::from_request_parts(parts, state)
            .await
            .map_err(|never| -> Response { match never {} })?;
        let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());

        match state.auth.require_session(token.as_deref()).await {
            Ok(username) => Ok(AdminSession {
                username,
                token: token.unwrap_or_default(),
            }),
            Err(e) => {
                warn!("Rejected {} {}: {}", parts.method, parts.uri.path(), e);
                let jar = push_flash(jar, Flash::info(LOGIN_REQUIRED_MESSAGE));
                Err((jar, Redirect::to("/login")).into_response())
            }
        }
    }
}

/// Whether the jar carries a live admin session
pub async fn is_logged_in(state: &AppState, jar: &SignedCookieJar) -> bool {
    let token = jar.get(SESSION_COOKIE);
    state
        .auth
        .require_session(token.as_ref().map(|c| c.value()))
        .await
        .is_ok()
}
