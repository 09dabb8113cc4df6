//! Renders error responses as HTML pages.
//!
//! Responses carrying an [`ErrorPage`] extension get their body replaced by
//! the `error/error` view. Error statuses without one (router 405s and axum
//! extractor rejections) are classified by status; a 405 is shown as a 404
//! so every verb on an unknown route looks the same.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::web::error::{ErrorCode, ErrorPage};
use crate::web::handlers::AppState;
use crate::web::middleware::SessionUser;
use crate::web::page::Page;

/// Error-page middleware.
pub async fn render_error_pages(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let user = request.extensions().get::<SessionUser>().cloned();
    let response = next.run(request).await;

    let page = match response.extensions().get::<ErrorPage>() {
        Some(page) => page.clone(),
        None => match ErrorCode::from_status(response.status()) {
            Some(code) => {
                if response.status() != StatusCode::METHOD_NOT_ALLOWED {
                    tracing::debug!(status = %response.status(), "Request rejected before the handler");
                }
                ErrorPage {
                    code,
                    message: code.default_message().to_string(),
                }
            }
            None => return response,
        },
    };

    let status = page.code.status_code();
    let html = Page::new("error/error", page.code.heading())
        .with("status", i64::from(status.as_u16()))
        .with("heading", page.code.heading())
        .with("message", page.message.as_str())
        .render_html(&state, user.as_ref(), None);

    match html {
        Ok(html) => {
            let (mut parts, _) = response.into_parts();
            parts.status = status;
            parts.headers.remove(header::CONTENT_LENGTH);
            parts.headers.remove(header::ALLOW);
            parts.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            );
            Response::from_parts(parts, Body::from(html))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to render error page");
            response
        }
    }
}
