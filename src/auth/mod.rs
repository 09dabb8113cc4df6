//! Authentication module for CareData.
//!
//! This module provides password hashing, the credential store, server-side
//! session management and input validation.

mod credentials;
mod password;
mod session;
pub mod validation;

pub use credentials::{CredentialError, CredentialStore, RegistrationRequest};
pub use password::{hash_password, validate_password_length, verify_password, PasswordError};
pub(crate) use session::token_prefix;
pub use session::{AuthSession, SessionError, SessionManager, DEFAULT_SESSION_TTL_DAYS};
pub use validation::ValidationError;
