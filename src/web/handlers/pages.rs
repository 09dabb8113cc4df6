//! Public pages.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;

use crate::web::dto::DoctorCardView;
use crate::web::error::{WebError, NOT_FOUND_MESSAGE};
use crate::web::handlers::AppState;
use crate::web::middleware::OptionalAuthUser;
use crate::web::page::Page;

/// GET / - Send visitors to the home page.
pub async fn root() -> Redirect {
    Redirect::to("/caredata")
}

/// GET /caredata - Home page.
pub async fn home(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    jar: SignedCookieJar,
) -> Result<Response, WebError> {
    Ok(Page::new("home/index", "Home")
        .render(&state, jar, user.as_ref())?
        .into_response())
}

/// GET /doctorsProfile - Information page for doctors.
pub async fn doctors_info(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    jar: SignedCookieJar,
) -> Result<Response, WebError> {
    Ok(Page::new("doctor/profile", "For doctors")
        .render(&state, jar, user.as_ref())?
        .into_response())
}

/// GET /caredata/doctors - Doctor directory.
pub async fn list_doctors(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    jar: SignedCookieJar,
) -> Result<Response, WebError> {
    let doctors: Vec<DoctorCardView> = state
        .profiles
        .doctors()
        .await?
        .iter()
        .map(DoctorCardView::from)
        .collect();

    tracing::debug!(count = doctors.len(), "Listing doctors");

    Ok(Page::new("doctor/list", "Doctors")
        .with_serialized("doctors", &doctors)?
        .render(&state, jar, user.as_ref())?
        .into_response())
}

/// GET /health - Liveness probe.
pub async fn health() -> &'static str {
    "OK"
}

/// Fallback for unmatched routes, any verb.
pub async fn not_found() -> WebError {
    WebError::not_found(NOT_FOUND_MESSAGE)
}
