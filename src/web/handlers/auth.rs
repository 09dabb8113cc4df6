//! Registration, login and logout.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Form,
};
use axum_extra::extract::cookie::SignedCookieJar;
use validator::Validate;

use crate::auth::validation::ValidationError;
use crate::auth::{CredentialError, RegistrationRequest};
use crate::db::Role;
use crate::file::sanitize_filename;
use crate::web::dto::{first_error_message, LoginForm};
use crate::web::error::{WebError, TOO_LARGE_MESSAGE};
use crate::web::flash::Flash;
use crate::web::handlers::{profile_path, redirect_with, AppState};
use crate::web::middleware::{OptionalAuthUser, SessionUser};
use crate::web::page::Page;

/// Flash after a successful registration.
pub const REGISTERED_MESSAGE: &str = "Welcome to CareData";
/// Flash after a successful login.
pub const LOGGED_IN_MESSAGE: &str = "Welcome Back to CareData :)";
/// Flash after logout.
pub const LOGGED_OUT_MESSAGE: &str = "You're Logged Out Now!";

/// Map a multipart read failure to a web error.
pub(crate) fn multipart_error(e: MultipartError) -> WebError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        WebError::payload_too_large(TOO_LARGE_MESSAGE)
    } else {
        tracing::debug!(error = %e, "Failed to read multipart field");
        WebError::bad_request("Invalid form data")
    }
}

/// Fields of the registration form.
#[derive(Debug, Default)]
struct RegisterFields {
    username: String,
    email: String,
    full_name: String,
    password: String,
    role: String,
    image: Option<(String, Vec<u8>)>,
}

async fn read_register_fields(mut multipart: Multipart) -> Result<RegisterFields, WebError> {
    let mut fields = RegisterFields::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let filename = field.file_name().map(sanitize_filename);
                let data = field.bytes().await.map_err(multipart_error)?;
                if let Some(filename) = filename.filter(|_| !data.is_empty()) {
                    fields.image = Some((filename, data.to_vec()));
                }
            }
            "username" => fields.username = field.text().await.map_err(multipart_error)?,
            "email" => fields.email = field.text().await.map_err(multipart_error)?,
            "full_name" => fields.full_name = field.text().await.map_err(multipart_error)?,
            "password" => fields.password = field.text().await.map_err(multipart_error)?,
            "role" => fields.role = field.text().await.map_err(multipart_error)?,
            _ => {}
        }
    }

    Ok(fields)
}

fn parse_role(value: &str) -> Result<Role, ValidationError> {
    if value.trim().is_empty() {
        return Ok(Role::default());
    }
    value.parse().map_err(|_| ValidationError::InvalidRole)
}

/// GET /register - Registration form.
pub async fn register_form(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    jar: SignedCookieJar,
) -> Result<Response, WebError> {
    Ok(Page::new("auth/register", "Register")
        .render(&state, jar, user.as_ref())?
        .into_response())
}

/// POST /register - Create an account and log it in.
///
/// Accepts `multipart/form-data` with an optional `image` file.
pub async fn register(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    multipart: Multipart,
) -> Result<Response, WebError> {
    let fields = read_register_fields(multipart).await?;

    let role = match parse_role(&fields.role) {
        Ok(role) => role,
        Err(e) => return Ok(redirect_with(jar, Flash::error(e.to_string()), "/register")),
    };

    let mut request =
        RegistrationRequest::new(fields.username, fields.email, fields.password, fields.full_name)
            .with_role(role);

    let mut stored_image = None;
    if let Some((filename, data)) = fields.image {
        let mime = mime_guess::from_path(&filename).first_or_octet_stream();
        if mime.type_() != mime_guess::mime::IMAGE {
            return Ok(redirect_with(
                jar,
                Flash::error("Profile image must be an image file"),
                "/register",
            ));
        }
        let stored_name = state.storage.save(&data, &filename)?;
        request = request.with_image(filename, stored_name.clone());
        stored_image = Some(stored_name);
    }

    let user = match state.credentials.register(request).await {
        Ok(user) => user,
        Err(e) => {
            if let Some(stored_name) = stored_image {
                if let Err(err) = state.storage.delete(&stored_name) {
                    tracing::warn!(error = %err, "Failed to remove orphaned profile image");
                }
            }
            return match e {
                CredentialError::Validation(_) | CredentialError::DuplicateIdentity(_) => {
                    tracing::debug!(reason = %e, "Registration rejected");
                    Ok(redirect_with(jar, Flash::error(e.to_string()), "/register"))
                }
                other => Err(credential_failure(other)),
            };
        }
    };

    let session = state.sessions.login(&user).await?;
    let jar = jar.add(state.session_cookie(&session.token));

    Ok(redirect_with(
        jar,
        Flash::success(REGISTERED_MESSAGE),
        &profile_path(user.id),
    ))
}

/// GET /login - Login form.
pub async fn login_form(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    jar: SignedCookieJar,
) -> Result<Response, WebError> {
    Ok(Page::new("auth/login", "Log in")
        .render(&state, jar, user.as_ref())?
        .into_response())
}

/// POST /login - Check credentials and start a session.
pub async fn login(
    State(state): State<AppState>,
    OptionalAuthUser(current): OptionalAuthUser,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    if let Err(errors) = form.validate() {
        return Ok(redirect_with(
            jar,
            Flash::error(first_error_message(&errors)),
            "/login",
        ));
    }

    let user = match state
        .credentials
        .authenticate(&form.username, &form.password)
        .await
    {
        Ok(user) => user,
        Err(CredentialError::InvalidCredentials) => {
            return Ok(redirect_with(
                jar,
                Flash::error("Invalid username or password"),
                "/login",
            ));
        }
        Err(e) => return Err(credential_failure(e)),
    };

    // A new login replaces whatever session the browser had.
    if let Some(SessionUser { token, .. }) = current {
        state.sessions.logout(&token).await?;
    }

    let session = state.sessions.login(&user).await?;
    let jar = jar.add(state.session_cookie(&session.token));

    Ok(redirect_with(jar, Flash::success(LOGGED_IN_MESSAGE), "/caredata"))
}

/// POST /logout - End the current session.
pub async fn logout(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    jar: SignedCookieJar,
) -> Result<Response, WebError> {
    if let Some(user) = user {
        state.sessions.logout(&user.token).await?;
    }

    let jar = jar.remove(state.expired_session_cookie());
    Ok(redirect_with(jar, Flash::success(LOGGED_OUT_MESSAGE), "/caredata"))
}

fn credential_failure(e: CredentialError) -> WebError {
    tracing::error!(error = %e, "Credential store failure");
    WebError::internal(crate::web::error::INTERNAL_ERROR_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("doctor").unwrap(), Role::Doctor);
        assert_eq!(parse_role(" Patient ").unwrap(), Role::Patient);
        assert_eq!(parse_role("").unwrap(), Role::Patient);
        assert!(matches!(parse_role("nurse"), Err(ValidationError::InvalidRole)));
    }
}
