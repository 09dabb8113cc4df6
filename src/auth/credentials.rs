//! Credential store for CareData.
//!
//! Registers identities with an Argon2id password hash and checks
//! credentials at login.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};

use crate::auth::password::{hash_password, verify_password, PasswordError};
use crate::auth::validation::{validate_registration, ValidationError};
use crate::db::{NewUser, Role, User, UserRepository};
use crate::CareError;

/// Credential-related errors.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// Input failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Username or email already registered.
    #[error("a user with this {0} already exists")]
    DuplicateIdentity(&'static str),

    /// Unknown user or wrong password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Password hashing failed.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl From<CareError> for CredentialError {
    fn from(e: CareError) -> Self {
        match e {
            CareError::Conflict(_) => CredentialError::DuplicateIdentity("username or email"),
            other => CredentialError::Database(other.to_string()),
        }
    }
}

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Plaintext password; only its hash is persisted.
    pub password: String,
    /// Display name.
    pub full_name: String,
    /// Patient or doctor.
    pub role: Role,
    /// Profile image as `(original filename, stored name)`.
    pub image: Option<(String, String)>,
}

impl RegistrationRequest {
    /// Create a new patient registration request.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            full_name: full_name.into(),
            role: Role::Patient,
            image: None,
        }
    }

    /// Set the role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Attach an already stored profile image.
    pub fn with_image(mut self, filename: impl Into<String>, stored_name: impl Into<String>) -> Self {
        self.image = Some((filename.into(), stored_name.into()));
        self
    }
}

/// Persists identities and verifies credentials.
#[derive(Clone)]
pub struct CredentialStore {
    pool: SqlitePool,
}

impl CredentialStore {
    /// Create a credential store over the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a new user.
    ///
    /// Validates every field, rejects a taken username or email with
    /// `DuplicateIdentity`, then stores the Argon2id hash of the password.
    pub async fn register(&self, request: RegistrationRequest) -> Result<User, CredentialError> {
        let username = request.username.trim().to_string();
        let email = request.email.trim().to_string();
        let full_name = request.full_name.trim().to_string();

        validate_registration(&username, &request.password, &full_name, &email)?;

        let repo = UserRepository::new(&self.pool);
        if repo.username_exists(&username).await? {
            return Err(CredentialError::DuplicateIdentity("username"));
        }
        if repo.email_exists(&email, None).await? {
            return Err(CredentialError::DuplicateIdentity("email"));
        }

        let password = request.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| PasswordError::HashError(e.to_string()))??;

        let mut new_user =
            NewUser::new(&username, &email, &full_name, password_hash).with_role(request.role);
        if let Some((filename, stored_name)) = request.image {
            new_user = new_user.with_image(filename, stored_name);
        }

        // The unique indexes still guard against a concurrent registration.
        let user = repo.create(&new_user).await?;

        info!(
            username = %user.username,
            user_id = user.id,
            role = %user.role,
            "New user registered"
        );

        Ok(user)
    }

    /// Check a username/password pair.
    ///
    /// Unknown users and wrong passwords both yield `InvalidCredentials`.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, CredentialError> {
        let repo = UserRepository::new(&self.pool);
        let Some(user) = repo.get_by_username(username.trim()).await? else {
            debug!(username = %username, "Login attempt for unknown user");
            return Err(CredentialError::InvalidCredentials);
        };

        let password = password.to_string();
        let hash = user.password.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| PasswordError::HashError(e.to_string()))?;

        match verified {
            Ok(()) => Ok(user),
            Err(PasswordError::VerificationFailed) | Err(PasswordError::InvalidHash) => {
                debug!(user_id = user.id, "Login attempt with wrong password");
                Err(CredentialError::InvalidCredentials)
            }
            Err(e) => Err(e.into()),
        }
    }
}
