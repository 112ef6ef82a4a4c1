//! Flash messages
//!
//! Status messages produced by one request and shown by the next rendered
//! page. They ride across the redirect in a signed cookie.

use axum_extra::extract::SignedCookieJar;
use axum_extra::extract::cookie::Cookie;
use log::warn;
use serde::{Deserialize, Serialize};

pub const FLASH_COOKIE: &str = "rax_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Info,
    Success,
    Error,
}

impl FlashLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashLevel::Info => "info",
            FlashLevel::Success => "success",
            FlashLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }
}

/// Pending messages stored in the jar
fn pending_flashes(jar: &SignedCookieJar) -> Vec<Flash> {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return Vec::new();
    };

    urlencoding::decode(cookie.value())
        .ok()
        .and_then(|json| serde_json::from_str(&json).ok())
        .unwrap_or_default()
}

/// Queues a message for the next rendered page
pub fn push_flash(jar: SignedCookieJar, flash: Flash) -> SignedCookieJar {
    let mut flashes = pending_flashes(&jar);
    flashes.push(flash);

    match serde_json::to_string(&flashes) {
        Ok(json) => {
            let cookie = Cookie::build((FLASH_COOKIE, urlencoding::encode(&json).into_owned()))
                .path("/")
                .http_only(true)
                .build();
            jar.add(cookie)
        }
        Err(e) => {
            warn!("Failed to encode flash messages: {}", e);
            jar
        }
    }
}

/// Drains the queued messages, clearing the cookie
pub fn take_flashes(jar: SignedCookieJar) -> (SignedCookieJar, Vec<Flash>) {
    let flashes = pending_flashes(&jar);
    if jar.get(FLASH_COOKIE).is_none() {
        return (jar, flashes);
    }
    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/").build());
    (jar, flashes)
}
