//! User model for CareData.
//!
//! This module defines the User struct and the Role discriminator.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

/// Kind of account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A patient keeping their own records.
    #[default]
    Patient,
    /// A doctor with a public listing.
    Doctor,
}

impl Role {
    /// Convert role to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
        }
    }

    /// Get display name for the role.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Patient => "Patient",
            Role::Doctor => "Doctor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "patient" => Ok(Role::Patient),
            "doctor" => Ok(Role::Doctor),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// A registered patient or doctor.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Login username (unique, case-insensitive).
    pub username: String,
    /// Email address (unique, case-insensitive).
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Patient or doctor.
    pub role: Role,
    /// Password hash (Argon2).
    pub password: String,
    /// Original filename of the profile image.
    pub image_filename: Option<String>,
    /// Stored name of the profile image inside the file storage.
    pub image_stored_name: Option<String>,
    /// Account creation timestamp.
    pub created_at: String,
}

impl User {
    /// Check if this user is a doctor.
    pub fn is_doctor(&self) -> bool {
        self.role == Role::Doctor
    }

    /// Check if the user has a profile image.
    pub fn has_image(&self) -> bool {
        self.image_stored_name.is_some()
    }
}

impl<'r> FromRow<'r, SqliteRow> for User {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        let role = role
            .parse::<Role>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "role".to_string(),
                source: e.into(),
            })?;

        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            full_name: row.try_get("full_name")?,
            role,
            password: row.try_get("password")?,
            image_filename: row.try_get("image_filename")?,
            image_stored_name: row.try_get("image_stored_name")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Patient or doctor.
    pub role: Role,
    /// Password hash (should be pre-hashed with Argon2).
    pub password: String,
    /// Original filename of the profile image.
    pub image_filename: Option<String>,
    /// Stored name of the profile image.
    pub image_stored_name: Option<String>,
}

impl NewUser {
    /// Create a new patient with the required fields.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        full_name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            full_name: full_name.into(),
            role: Role::Patient,
            password: password.into(),
            image_filename: None,
            image_stored_name: None,
        }
    }

    /// Set the role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Attach a stored profile image.
    pub fn with_image(
        mut self,
        filename: impl Into<String>,
        stored_name: impl Into<String>,
    ) -> Self {
        self.image_filename = Some(filename.into());
        self.image_stored_name = Some(stored_name.into());
        self
    }
}

/// Data for updating an existing user's profile.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// New display name.
    pub full_name: Option<String>,
    /// New email address.
    pub email: Option<String>,
    /// New password hash.
    pub password: Option<String>,
    /// New profile image as `(filename, stored_name)`.
    pub image: Option<(String, String)>,
}

impl UserUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set new display name.
    pub fn full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    /// Set new email.
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set new password hash.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set new profile image.
    pub fn image(mut self, filename: impl Into<String>, stored_name: impl Into<String>) -> Self {
        self.image = Some((filename.into(), stored_name.into()));
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.image.is_none()
    }
}
