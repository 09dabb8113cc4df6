//! Error handling for the CareData web layer.
//!
//! Handlers return [`WebError`]; its response carries an [`ErrorPage`]
//! extension that the error-page middleware renders into the `error/error`
//! view.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::CareError;

/// Message shown for unmatched routes.
pub const NOT_FOUND_MESSAGE: &str = "Page Not Found!";

/// Message shown for unexpected failures.
pub const INTERNAL_ERROR_MESSAGE: &str = "Something Went Wrong!";

/// Message shown when a request body cannot be read.
pub const BAD_REQUEST_MESSAGE: &str = "The request could not be understood.";

/// Message shown when the body exceeds the upload limit.
pub const TOO_LARGE_MESSAGE: &str = "The upload is larger than allowed.";

/// Web error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Bad request (400).
    BadRequest,
    /// Forbidden (403).
    Forbidden,
    /// Not found (404).
    NotFound,
    /// Upload exceeds the configured limit (413).
    PayloadTooLarge,
    /// Internal server error (500).
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short heading shown above the message.
    pub fn heading(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "Bad Request",
            ErrorCode::Forbidden => "Forbidden",
            ErrorCode::NotFound => "Not Found",
            ErrorCode::PayloadTooLarge => "Too Large",
            ErrorCode::InternalError => "Error",
        }
    }

    /// Classify an error status produced outside a handler, such as an
    /// extractor rejection. Returns `None` for non-error statuses.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        match status {
            StatusCode::FORBIDDEN => Some(ErrorCode::Forbidden),
            StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED => Some(ErrorCode::NotFound),
            StatusCode::PAYLOAD_TOO_LARGE => Some(ErrorCode::PayloadTooLarge),
            s if s.is_client_error() => Some(ErrorCode::BadRequest),
            s if s.is_server_error() => Some(ErrorCode::InternalError),
            _ => None,
        }
    }

    /// Message used when nothing more specific is known.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => BAD_REQUEST_MESSAGE,
            ErrorCode::Forbidden => "You are not allowed to do that.",
            ErrorCode::NotFound => NOT_FOUND_MESSAGE,
            ErrorCode::PayloadTooLarge => TOO_LARGE_MESSAGE,
            ErrorCode::InternalError => INTERNAL_ERROR_MESSAGE,
        }
    }
}

/// Marker placed in response extensions; asks for an HTML error page.
#[derive(Debug, Clone)]
pub struct ErrorPage {
    /// Error classification.
    pub code: ErrorCode,
    /// Message shown to the user.
    pub message: String,
}

/// Web error type.
#[derive(Debug)]
pub struct WebError {
    code: ErrorCode,
    message: String,
}

impl WebError {
    /// Create a new web error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Create a payload too large error.
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PayloadTooLarge, message)
    }

    /// Create an internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// User-facing message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        // Plain-text body until the error-page middleware replaces it.
        let mut response = (status, self.message.clone()).into_response();
        response.extensions_mut().insert(ErrorPage {
            code: self.code,
            message: self.message,
        });
        response
    }
}

impl std::fmt::Display for WebError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for WebError {}

impl From<CareError> for WebError {
    fn from(err: CareError) -> Self {
        match &err {
            CareError::NotFound(what) => WebError::not_found(format!("{what} not found")),
            CareError::Permission(msg) => WebError::forbidden(msg.clone()),
            CareError::Validation(msg) => WebError::bad_request(msg.clone()),
            _ => {
                tracing::error!(error = %err, "Unhandled error");
                WebError::internal(INTERNAL_ERROR_MESSAGE)
            }
        }
    }
}

impl From<crate::template::TemplateError> for WebError {
    fn from(err: crate::template::TemplateError) -> Self {
        CareError::from(err).into()
    }
}
