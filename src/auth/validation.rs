//! Input validation for CareData registration and profile forms.
//!
//! This module provides validation functions for usernames, passwords,
//! full names, email addresses and doctor details.

use thiserror::Error;

/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 4;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 32;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum full name length.
pub const MAX_FULL_NAME_LENGTH: usize = 64;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length of a single-line doctor detail (hospital, location, ...).
pub const MAX_DETAIL_LENGTH: usize = 100;

/// Maximum length of the free-text "about" section.
pub const MAX_ABOUT_LENGTH: usize = 2000;

/// Maximum years of experience accepted.
pub const MAX_EXPERIENCE_YEARS: i64 = 80;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Username is too short.
    #[error("username must be at least {MIN_USERNAME_LENGTH} characters")]
    UsernameTooShort,

    /// Username is too long.
    #[error("username must be at most {MAX_USERNAME_LENGTH} characters")]
    UsernameTooLong,

    /// Username contains invalid characters.
    #[error("username can only contain letters, digits, '_', '.' and '-'")]
    UsernameInvalidChars,

    /// Username is reserved.
    #[error("this username is reserved")]
    UsernameReserved,

    /// Password is too short.
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,

    /// Password is too long.
    #[error("password must be at most {MAX_PASSWORD_LENGTH} characters")]
    PasswordTooLong,

    /// Password is the same as username.
    #[error("password cannot be the same as username")]
    PasswordSameAsUsername,

    /// Full name is empty.
    #[error("full name cannot be empty")]
    FullNameEmpty,

    /// Full name is too long.
    #[error("full name must be at most {MAX_FULL_NAME_LENGTH} characters")]
    FullNameTooLong,

    /// Full name contains control characters.
    #[error("full name contains invalid characters")]
    FullNameInvalidChars,

    /// Email is missing.
    #[error("email is required")]
    EmailEmpty,

    /// Email is too long.
    #[error("email must be at most {MAX_EMAIL_LENGTH} characters")]
    EmailTooLong,

    /// Email format is invalid.
    #[error("invalid email format")]
    EmailInvalidFormat,

    /// Role is neither patient nor doctor.
    #[error("role must be 'patient' or 'doctor'")]
    InvalidRole,

    /// A required doctor detail is empty.
    #[error("{0} cannot be empty")]
    DetailEmpty(&'static str),

    /// A doctor detail is too long.
    #[error("{0} is too long")]
    DetailTooLong(&'static str),

    /// Years of experience out of range.
    #[error("experience must be between 0 and {MAX_EXPERIENCE_YEARS} years")]
    ExperienceOutOfRange,
}

/// Reserved usernames that cannot be registered.
const RESERVED_USERNAMES: &[&str] = &[
    "admin",
    "administrator",
    "root",
    "system",
    "support",
    "caredata",
    "doctor",
    "patient",
    "null",
    "undefined",
];

/// Check if a username is reserved.
pub fn is_reserved_username(username: &str) -> bool {
    let lower = username.to_lowercase();
    RESERVED_USERNAMES.iter().any(|&r| r == lower)
}

/// Validate a username.
///
/// Requirements:
/// - Length: 4-32 characters
/// - Characters: ASCII letters, digits, `_`, `.` and `-`
/// - Not a reserved username
///
/// # Examples
///
/// ```
/// use caredata::auth::validation::validate_username;
///
/// assert!(validate_username("john.doe").is_ok());
/// assert!(validate_username("ab").is_err()); // too short
/// assert!(validate_username("admin").is_err()); // reserved
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.len() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooShort);
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(ValidationError::UsernameInvalidChars);
    }

    if is_reserved_username(username) {
        return Err(ValidationError::UsernameReserved);
    }

    Ok(())
}

/// Validate a password chosen at registration.
///
/// Requirements:
/// - Length: 8-128 characters
/// - Must not equal the username (case-insensitive)
pub fn validate_registration_password(
    password: &str,
    username: Option<&str>,
) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooLong);
    }

    if let Some(user) = username {
        if password.eq_ignore_ascii_case(user) {
            return Err(ValidationError::PasswordSameAsUsername);
        }
    }

    Ok(())
}

/// Validate a display name: 1-64 characters, no control characters.
pub fn validate_full_name(full_name: &str) -> Result<(), ValidationError> {
    if full_name.trim().is_empty() {
        return Err(ValidationError::FullNameEmpty);
    }
    if full_name.chars().count() > MAX_FULL_NAME_LENGTH {
        return Err(ValidationError::FullNameTooLong);
    }
    if full_name.chars().any(|c| c.is_control()) {
        return Err(ValidationError::FullNameInvalidChars);
    }
    Ok(())
}

/// Validate an email address.
///
/// Only a basic shape check: one `@`, a non-empty local part and a dotted
/// domain without empty labels or whitespace.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::EmailEmpty);
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }
    if email.chars().any(|c| c.is_whitespace()) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::EmailInvalidFormat);
    };
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(ValidationError::EmailInvalidFormat);
    }
    if domain.split('.').any(|p| p.is_empty()) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    Ok(())
}

/// Validate all registration fields at once.
///
/// Returns the first validation error encountered.
pub fn validate_registration(
    username: &str,
    password: &str,
    full_name: &str,
    email: &str,
) -> Result<(), ValidationError> {
    validate_username(username)?;
    validate_registration_password(password, Some(username))?;
    validate_full_name(full_name)?;
    validate_email(email)?;
    Ok(())
}

/// Validate a required single-line doctor detail.
pub fn validate_detail(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::DetailEmpty(field));
    }
    if value.chars().count() > MAX_DETAIL_LENGTH || value.chars().any(|c| c.is_control()) {
        return Err(ValidationError::DetailTooLong(field));
    }
    Ok(())
}

/// Validate years of experience.
pub fn validate_experience(years: i64) -> Result<(), ValidationError> {
    if !(0..=MAX_EXPERIENCE_YEARS).contains(&years) {
        return Err(ValidationError::ExperienceOutOfRange);
    }
    Ok(())
}

/// Validate the optional "about" text.
pub fn validate_about(about: &str) -> Result<(), ValidationError> {
    if about.chars().count() > MAX_ABOUT_LENGTH {
        return Err(ValidationError::DetailTooLong("about"));
    }
    Ok(())
}
