//! One-shot flash messages carried in a signed cookie.
//!
//! A handler sets a flash before redirecting; the next rendered page takes it
//! out of the jar and shows it in the layout.

use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use serde::{Deserialize, Serialize};

/// Name of the flash cookie.
pub const FLASH_COOKIE: &str = "flash";

/// Flash severity, used as a CSS class suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

/// A message shown once on the next page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
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

/// Store a flash in the jar, replacing any pending one.
pub fn set_flash(jar: SignedCookieJar, flash: Flash) -> SignedCookieJar {
    let value = match serde_json::to_string(&flash) {
        Ok(json) => urlencoding::encode(&json).into_owned(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode flash message");
            return jar;
        }
    };

    jar.add(
        Cookie::build((FLASH_COOKIE, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

/// Remove the pending flash from the jar and return it.
///
/// A cookie that fails to decode is dropped silently.
pub fn take_flash(jar: SignedCookieJar) -> (SignedCookieJar, Option<Flash>) {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return (jar, None);
    };

    let flash = urlencoding::decode(cookie.value())
        .ok()
        .and_then(|json| serde_json::from_str(&json).ok());

    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
    (jar, flash)
}
