//! Profile pages: view, edit and profile image.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Form,
};
use axum_extra::extract::cookie::SignedCookieJar;
use validator::Validate;

use crate::db::{UserRepository, UserUpdate};
use crate::file::sanitize_filename;
use crate::web::dto::{
    first_error_message, DoctorDetailsView, MethodOverride, UpdateProfileForm, UserView,
};
use crate::web::error::{WebError, NOT_FOUND_MESSAGE};
use crate::web::flash::Flash;
use crate::web::handlers::auth::multipart_error;
use crate::web::handlers::{profile_path, redirect_with, require_owner, AppState};
use crate::web::middleware::AuthUser;
use crate::web::page::Page;

/// GET /caredata/users/:id - Profile page.
pub async fn show_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    jar: SignedCookieJar,
) -> Result<Response, WebError> {
    let profile = state
        .profiles
        .profile(id)
        .await?
        .ok_or_else(|| WebError::not_found("User not found"))?;

    let is_owner = user.owns(id);
    let details = profile.doctor_details.as_ref().map(DoctorDetailsView::from);

    Ok(Page::new("user/profile", profile.user.full_name.clone())
        .with_serialized("profile_user", &UserView::from(&profile.user))?
        .with_serialized("details", &details)?
        .with("file_count", profile.files.len() as i64)
        .with("is_owner", is_owner)
        .render(&state, jar, Some(&user))?
        .into_response())
}

/// GET /caredata/users/:id/edit - Edit form.
pub async fn edit_form(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    jar: SignedCookieJar,
) -> Result<Response, WebError> {
    require_owner(&user, id)?;

    let profile_user = UserRepository::new(state.db.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| WebError::not_found("User not found"))?;

    Ok(Page::new("user/edit", "Edit profile")
        .with_serialized("profile_user", &UserView::from(&profile_user))?
        .render(&state, jar, Some(&user))?
        .into_response())
}

/// PUT /caredata/users/:id and PUT /caredata/users/:id/edit - Save the edit form.
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    jar: SignedCookieJar,
    Form(form): Form<UpdateProfileForm>,
) -> Result<Response, WebError> {
    require_owner(&user, id)?;

    let edit_path = format!("{}/edit", profile_path(id));
    if let Err(errors) = form.validate() {
        return Ok(redirect_with(
            jar,
            Flash::error(first_error_message(&errors)),
            &edit_path,
        ));
    }

    let repo = UserRepository::new(state.db.pool());
    let email = form.email.trim();
    if repo.email_exists(email, Some(id)).await? {
        return Ok(redirect_with(
            jar,
            Flash::error("a user with this email already exists"),
            &edit_path,
        ));
    }

    let update = UserUpdate::new()
        .full_name(form.full_name.trim())
        .email(email);
    repo.update(id, &update)
        .await?
        .ok_or_else(|| WebError::not_found("User not found"))?;

    tracing::info!(user_id = id, "Profile updated");
    Ok(redirect_with(
        jar,
        Flash::success("Your profile has been updated"),
        &profile_path(id),
    ))
}

/// POST /caredata/users/:id?_method=PUT - HTML-form spelling of the update.
pub async fn update_profile_override(
    state: State<AppState>,
    user: AuthUser,
    Query(method): Query<MethodOverride>,
    path: Path<i64>,
    jar: SignedCookieJar,
    form: Form<UpdateProfileForm>,
) -> Result<Response, WebError> {
    if !method.is_put() {
        return Err(WebError::not_found(NOT_FOUND_MESSAGE));
    }
    update_profile(state, user, path, jar, form).await
}

/// POST /caredata/users/:id/image - Replace the profile image.
pub async fn update_image(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    jar: SignedCookieJar,
    mut multipart: Multipart,
) -> Result<Response, WebError> {
    require_owner(&user, id)?;
    let edit_path = format!("{}/edit", profile_path(id));

    let mut image = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("image") {
            continue;
        }
        let filename = field.file_name().map(sanitize_filename);
        let data = field.bytes().await.map_err(multipart_error)?;
        image = filename.filter(|_| !data.is_empty()).map(|f| (f, data));
    }

    let Some((filename, data)) = image else {
        return Ok(redirect_with(jar, Flash::error("Choose an image to upload"), &edit_path));
    };
    if mime_guess::from_path(&filename).first_or_octet_stream().type_() != mime_guess::mime::IMAGE
    {
        return Ok(redirect_with(
            jar,
            Flash::error("Profile image must be an image file"),
            &edit_path,
        ));
    }

    let stored_name = state.storage.save(&data, &filename)?;
    let previous = match UserRepository::new(state.db.pool())
        .set_image(id, &filename, &stored_name)
        .await
    {
        Ok(previous) => previous,
        Err(e) => {
            if let Err(err) = state.storage.delete(&stored_name) {
                tracing::warn!(error = %err, "Failed to remove orphaned profile image");
            }
            return Err(e.into());
        }
    };

    if let Some(previous) = previous {
        if let Err(e) = state.storage.delete(&previous) {
            tracing::warn!(error = %e, stored_name = %previous, "Failed to delete old profile image");
        }
    }

    tracing::info!(user_id = id, size = data.len(), "Profile image replaced");
    Ok(redirect_with(
        jar,
        Flash::success("Your profile image has been updated"),
        &profile_path(id),
    ))
}

/// GET /caredata/users/:id/image - Profile image.
pub async fn profile_image(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, WebError> {
    let user = UserRepository::new(state.db.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| WebError::not_found("User not found"))?;

    let (Some(filename), Some(stored_name)) = (user.image_filename, user.image_stored_name) else {
        return Err(WebError::not_found("No profile image"));
    };

    let content = state.storage.load(&stored_name)?;
    let content_type = mime_guess::from_path(&filename)
        .first_or_octet_stream()
        .to_string();

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "private, max-age=3600".to_string()),
        ],
        content,
    )
        .into_response())
}
