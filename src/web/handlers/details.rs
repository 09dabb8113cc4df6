//! Doctor details form.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Form,
};
use axum_extra::extract::cookie::SignedCookieJar;
use validator::Validate;

use crate::db::UserRepository;
use crate::profile::DoctorDetailsRepository;
use crate::web::dto::{first_error_message, DoctorDetailsForm, DoctorDetailsView, UserView};
use crate::web::error::WebError;
use crate::web::flash::Flash;
use crate::web::handlers::{profile_path, redirect_with, require_owner, AppState};
use crate::web::middleware::{AuthUser, SessionUser};
use crate::web::page::Page;

/// Flash after details are saved.
pub const DETAILS_SAVED_MESSAGE: &str = "Your details has been added :)";
/// Prefix of the flash when details are rejected.
pub const DETAILS_REJECTED_MESSAGE: &str = "Can't add the details :(";

fn require_doctor(user: &SessionUser, profile_id: i64) -> Result<(), WebError> {
    require_owner(user, profile_id)?;
    if !user.is_doctor {
        return Err(WebError::forbidden("Only doctors can add professional details"));
    }
    Ok(())
}

/// GET /caredata/users/:id/adddetails - Details form, prefilled when present.
pub async fn add_details_form(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    jar: SignedCookieJar,
) -> Result<Response, WebError> {
    require_doctor(&user, id)?;

    let profile_user = UserRepository::new(state.db.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| WebError::not_found("User not found"))?;
    let details = DoctorDetailsRepository::new(state.db.pool())
        .get_by_user(id)
        .await?;

    Ok(Page::new("doctor/add_details", "Doctor details")
        .with_serialized("profile_user", &UserView::from(&profile_user))?
        .with_serialized("details", &details.as_ref().map(DoctorDetailsView::from))?
        .render(&state, jar, Some(&user))?
        .into_response())
}

/// POST /caredata/users/:id/adddetails - Create or replace doctor details.
pub async fn add_details(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    jar: SignedCookieJar,
    Form(form): Form<DoctorDetailsForm>,
) -> Result<Response, WebError> {
    require_doctor(&user, id)?;
    let form_path = format!("{}/adddetails", profile_path(id));

    if let Err(errors) = form.validate() {
        let message = format!("{DETAILS_REJECTED_MESSAGE} {}", first_error_message(&errors));
        return Ok(redirect_with(jar, Flash::error(message), &form_path));
    }

    let details = form.into_details();
    if let Err(e) = details.validate() {
        let message = format!("{DETAILS_REJECTED_MESSAGE} {e}");
        return Ok(redirect_with(jar, Flash::error(message), &form_path));
    }

    let saved = DoctorDetailsRepository::new(state.db.pool())
        .upsert(id, &details)
        .await?;

    tracing::info!(
        user_id = id,
        details_id = saved.id,
        specialization = %saved.specialization,
        "Doctor details saved"
    );

    Ok(redirect_with(
        jar,
        Flash::success(DETAILS_SAVED_MESSAGE),
        &profile_path(id),
    ))
}
