//! Middleware for the CareData web layer.

pub mod auth;
pub mod error_page;
pub mod security;

pub use auth::{resolve_session, AuthUser, OptionalAuthUser, SessionUser, LOGIN_REQUIRED_MESSAGE};
pub use error_page::render_error_pages;
pub use security::security_headers;
