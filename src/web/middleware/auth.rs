//! Session resolution and the authorization gate.
//!
//! [`resolve_session`] runs once per request: it reads the signed session
//! cookie, resolves it through the [`SessionManager`](crate::auth::SessionManager)
//! and stores the [`SessionUser`] in the request extensions. Handlers then pick
//! it up with [`AuthUser`] (gate) or [`OptionalAuthUser`].

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, Key, SignedCookieJar};
use serde::Serialize;

use crate::auth::token_prefix;
use crate::db::{Role, UserRepository};
use crate::web::flash::{set_flash, Flash};
use crate::web::handlers::AppState;

/// Flash shown when the gate turns a request away.
pub const LOGIN_REQUIRED_MESSAGE: &str = "You must be signed in first!";

/// The authenticated user attached to a request.
#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub is_doctor: bool,
    /// Session token; never rendered.
    #[serde(skip)]
    pub token: String,
}

impl SessionUser {
    /// Whether this user owns the profile with the given id.
    pub fn owns(&self, user_id: i64) -> bool {
        self.id == user_id
    }
}

/// Middleware resolving the session cookie into a [`SessionUser`].
///
/// A cookie pointing at an unknown or expired session is cleared.
pub async fn resolve_session(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = jar
        .get(&state.session_cookie)
        .map(|c| c.value().to_string())
    else {
        return next.run(request).await;
    };

    match lookup(&state, &token).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Ok(None) => {
            let response = next.run(request).await;
            // A login on this request already replaced the cookie.
            if sets_cookie(&response, &state.session_cookie) {
                return response;
            }
            tracing::debug!(token = %token_prefix(&token), "Clearing stale session cookie");
            let jar = jar.remove(Cookie::build((state.session_cookie.clone(), "")).path("/"));
            (jar, response).into_response()
        }
        Err(e) => {
            // Treat the request as anonymous; the cookie is kept.
            tracing::warn!(error = %e, "Session lookup failed");
            next.run(request).await
        }
    }
}

/// Whether the response sets a cookie called `name`.
fn sets_cookie(response: &Response, name: &str) -> bool {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split_once('='))
        .any(|(cookie_name, _)| cookie_name.trim() == name)
}

async fn lookup(state: &AppState, token: &str) -> crate::Result<Option<SessionUser>> {
    let Some(session) = state.sessions.resolve(token).await? else {
        return Ok(None);
    };

    let user = UserRepository::new(state.db.pool())
        .get_by_id(session.user_id)
        .await?;

    Ok(user.map(|user| SessionUser {
        id: user.id,
        is_doctor: user.is_doctor(),
        username: user.username,
        full_name: user.full_name,
        role: user.role,
        token: session.token,
    }))
}

/// Extractor for authenticated users.
///
/// Anonymous requests are redirected to `/login` with an error flash and the
/// handler never runs.
#[derive(Debug, Clone)]
pub struct AuthUser(pub SessionUser);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<SessionUser>() {
            return Ok(AuthUser(user.clone()));
        }

        tracing::debug!(path = %parts.uri.path(), "Anonymous request to gated route");
        let jar = SignedCookieJar::from_headers(&parts.headers, Key::from_ref(state));
        let jar = set_flash(jar, Flash::error(LOGIN_REQUIRED_MESSAGE));
        Err((jar, Redirect::to("/login")).into_response())
    }
}

/// Optional authentication extractor.
///
/// Like [`AuthUser`] but never rejects.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<SessionUser>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuthUser(parts.extensions.get::<SessionUser>().cloned()))
    }
}
