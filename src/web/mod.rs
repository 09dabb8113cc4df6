//! Web front end for CareData.
//!
//! Server-rendered pages over axum: a session middleware resolves the signed
//! session cookie, gated handlers take [`middleware::AuthUser`], and errors are
//! rendered as HTML by [`middleware::render_error_pages`].

pub mod dto;
pub mod error;
pub mod flash;
pub mod handlers;
pub mod middleware;
pub mod page;
pub mod router;
pub mod server;

pub use error::{ErrorCode, WebError};
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
