//! Route handlers for CareData.

pub mod auth;
pub mod details;
pub mod file;
pub mod pages;
pub mod user;

pub use auth::*;
pub use details::*;
pub use file::*;
pub use pages::*;
pub use user::*;

use std::path::Path;
use std::sync::Arc;

use axum::extract::FromRef;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use sha2::{Digest, Sha512};

use crate::auth::{CredentialStore, SessionManager};
use crate::config::Config;
use crate::file::FileStorage;
use crate::profile::ProfileStore;
use crate::template::TemplateEngine;
use crate::web::error::WebError;
use crate::web::flash::{set_flash, Flash};
use crate::web::middleware::SessionUser;
use crate::Database;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database pool.
    pub db: Database,
    /// Cookie signing key.
    pub key: Key,
    /// Loaded views.
    pub templates: Arc<TemplateEngine>,
    /// Uploaded file storage.
    pub storage: Arc<FileStorage>,
    pub sessions: SessionManager,
    pub credentials: CredentialStore,
    pub profiles: ProfileStore,
    /// Name of the session cookie.
    pub session_cookie: String,
    /// Send cookies with the `Secure` attribute.
    pub secure_cookies: bool,
    /// Largest accepted request body, in bytes.
    pub max_upload_size: usize,
}

impl AppState {
    /// Build the state from configuration.
    pub fn new(db: Database, config: &Config) -> crate::Result<Self> {
        let templates = TemplateEngine::with_views(config.templates.path.as_deref().map(Path::new))?;
        let storage = FileStorage::new(config.files.storage_path.as_str())?;
        let ttl = chrono::Duration::days(config.session.ttl_days);
        let pool = db.pool().clone();

        tracing::info!(
            storage = %config.files.storage_path,
            views = templates.template_names().len(),
            "Application state initialized"
        );

        Ok(Self {
            key: derive_key(&config.session.secret),
            templates: Arc::new(templates),
            storage: Arc::new(storage),
            sessions: SessionManager::with_ttl(pool.clone(), ttl),
            credentials: CredentialStore::new(pool.clone()),
            profiles: ProfileStore::new(pool),
            session_cookie: config.session.cookie_name.clone(),
            secure_cookies: config.session.secure,
            max_upload_size: (config.files.max_upload_size_mb as usize).saturating_mul(1024 * 1024),
            db,
        })
    }

    /// Cookie carrying a fresh session token.
    pub fn session_cookie(&self, token: &str) -> Cookie<'static> {
        Cookie::build((self.session_cookie.clone(), token.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookies)
            .max_age(time::Duration::seconds(self.sessions.ttl().num_seconds()))
            .build()
    }

    /// Removal cookie for the session.
    pub fn expired_session_cookie(&self) -> Cookie<'static> {
        Cookie::build((self.session_cookie.clone(), ""))
            .path("/")
            .build()
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

/// Derive the 64-byte cookie key from the configured secret.
pub fn derive_key(secret: &str) -> Key {
    Key::from(Sha512::digest(secret.as_bytes()).as_slice())
}

/// Set a flash and redirect (303).
pub(crate) fn redirect_with(jar: SignedCookieJar, flash: Flash, to: &str) -> Response {
    (set_flash(jar, flash), Redirect::to(to)).into_response()
}

/// Owner-only guard for `/caredata/users/:id/...` mutations and file reads.
pub(crate) fn require_owner(user: &SessionUser, profile_id: i64) -> Result<(), WebError> {
    if user.owns(profile_id) {
        Ok(())
    } else {
        tracing::warn!(
            user_id = user.id,
            profile_id,
            "Rejected access to another user's profile"
        );
        Err(WebError::forbidden("You can only manage your own profile"))
    }
}

/// Path to a user's profile page.
pub(crate) fn profile_path(user_id: i64) -> String {
    format!("/caredata/users/{user_id}")
}
