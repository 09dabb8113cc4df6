//! CareData - patient and doctor profiles on the web.
//!
//! A server-rendered application where patients and doctors register, log in,
//! keep their profile and medical files, and doctors publish professional
//! details in a public directory.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod profile;
pub mod template;
pub mod web;

pub use auth::{
    hash_password, verify_password, AuthSession, CredentialError, CredentialStore, PasswordError,
    RegistrationRequest, SessionError, SessionManager, ValidationError,
};
pub use config::Config;
pub use db::{Database, NewUser, Role, User, UserRepository, UserUpdate};
pub use error::{CareError, Result};
pub use file::FileStorage;
pub use profile::{Profile, ProfileStore};
pub use web::WebServer;
